//! MCP server lifecycle.
//!
//! 1. **Initialisation**: `initialize` request, then the
//!    `notifications/initialized` notification
//! 2. **Operation**: `tools/list`, `tools/call` and `ping`
//! 3. **Shutdown**: end of input or a termination signal
//!
//! Tool calls are dispatched to a [`ToolRegistry`]; the server itself knows
//! nothing about Figma.
//!
//! # Concurrency
//!
//! At most one tool call is in flight. While it runs the server keeps
//! reading input: `ping` and the other non-tool requests are answered
//! straight away, further `tools/call` requests wait in a queue, and a
//! `notifications/cancelled` naming the running call drops its future
//! (which aborts the HTTP request) without sending a reply.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

use crate::mcp::protocol::{
    parse_message, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, OutgoingMessage, RequestId, MCP_PROTOCOL_VERSION,
    SERVER_NAME,
};
use crate::mcp::registry::{ToolCallParams, ToolRegistry};
use crate::mcp::transport::Transport;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: &'static str,
    /// Server version.
    pub version: &'static str,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters of `notifications/cancelled`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    /// Id of the request to cancel.
    pub request_id: RequestId,
    /// Optional human-readable reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A tool call whose reply is still being produced.
struct ToolCall {
    id: RequestId,
    reply: Pin<Box<dyn Future<Output = OutgoingMessage> + Send>>,
}

/// Requests that arrived while a tool call was running.
#[derive(Default)]
struct Pending {
    active: Option<ToolCall>,
    queued: VecDeque<JsonRpcRequest>,
}

impl Pending {
    /// Drops the running or queued request with the given id.
    fn cancel(&mut self, id: &RequestId) -> bool {
        if self.active.as_ref().is_some_and(|call| &call.id == id) {
            self.active = None;
            return true;
        }
        match self.queued.iter().position(|req| &req.id == id) {
            Some(index) => {
                self.queued.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Resolves with the reply of the active call, or never if there is none.
async fn next_reply(active: &mut Option<ToolCall>) -> OutgoingMessage {
    match active {
        Some(call) => call.reply.as_mut().await,
        None => std::future::pending().await,
    }
}

/// The MCP server.
pub struct McpServer<R, W> {
    state: ServerState,
    transport: Transport<R, W>,
    registry: Arc<ToolRegistry>,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
}

impl McpServer<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Creates a server on stdin/stdout.
    #[must_use]
    pub fn stdio(registry: ToolRegistry) -> Self {
        Self::new(Transport::stdio(), registry)
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a server over the given transport.
    pub fn new(transport: Transport<R, W>, registry: ToolRegistry) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport,
            registry: Arc::new(registry),
            protocol_version: None,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Runs until the input closes or a termination signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs until the input closes, without signal handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve(&mut self) -> io::Result<()> {
        self.serve_until(std::future::pending()).await
    }

    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let shutdown = async move {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                }
            }
        };

        self.serve_until(shutdown).await
    }

    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> io::Result<()> {
        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        };

        self.serve_until(shutdown).await
    }

    /// Main loop: reads input, drives the active tool call and watches for
    /// `shutdown`, whichever is ready first.
    ///
    /// Once the input closes, outstanding calls are finished before
    /// returning. A shutdown drops them.
    async fn serve_until<S>(&mut self, shutdown: S) -> io::Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut pending = Pending::default();
        let mut input_open = true;

        loop {
            if pending.active.is_none() {
                if let Some(req) = pending.queued.pop_front() {
                    self.start_request(req, &mut pending).await?;
                    continue;
                }
                if !input_open {
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }
            }

            tokio::select! {
                () = &mut shutdown => {
                    if let Some(call) = &pending.active {
                        tracing::info!(id = %call.id, "Dropping in-flight tool call");
                    }
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                reply = next_reply(&mut pending.active) => {
                    pending.active = None;
                    self.transport.send(&reply).await?;
                }

                line = self.transport.read_line(), if input_open => {
                    match line? {
                        Some(line) => self.handle_line(line, &mut pending).await?,
                        None => {
                            tracing::debug!("Input closed");
                            input_open = false;
                        }
                    }
                }
            }
        }
    }

    /// Decodes one input line and acts on it.
    async fn handle_line(&mut self, line: Vec<u8>, pending: &mut Pending) -> io::Result<()> {
        let line = match String::from_utf8(line) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding line that is not valid UTF-8");
                return self.transport.send(&JsonRpcError::parse_error().into()).await;
            }
        };

        if line.trim().is_empty() {
            return Ok(());
        }

        match parse_message(&line) {
            Err(error) => self.transport.send(&error.into()).await,
            Ok(IncomingMessage::Notification(notif)) => {
                if notif.method == "notifications/cancelled" {
                    Self::handle_cancelled(&notif, pending);
                } else {
                    self.handle_notification(&notif);
                }
                Ok(())
            }
            Ok(IncomingMessage::Request(req)) => {
                if req.method == "tools/call" && pending.active.is_some() {
                    tracing::debug!(id = %req.id, "Queueing tool call");
                    pending.queued.push_back(req);
                    Ok(())
                } else {
                    self.start_request(req, pending).await
                }
            }
        }
    }

    /// Answers a request, or makes it the active tool call.
    async fn start_request(&mut self, req: JsonRpcRequest, pending: &mut Pending) -> io::Result<()> {
        if req.method == "tools/call" {
            match self.begin_tool_call(&req) {
                Ok(call) => {
                    pending.active = Some(call);
                    Ok(())
                }
                Err(error) => self.transport.send(&error.into()).await,
            }
        } else {
            let reply = OutgoingMessage::from(self.handle_request(&req));
            self.transport.send(&reply).await
        }
    }

    fn handle_cancelled(notif: &JsonRpcNotification, pending: &mut Pending) {
        let params = notif
            .params
            .clone()
            .map(serde_json::from_value::<CancelledParams>);

        match params {
            Some(Ok(params)) => {
                if pending.cancel(&params.request_id) {
                    tracing::info!(
                        id = %params.request_id,
                        reason = params.reason.as_deref().unwrap_or("none"),
                        "Request cancelled"
                    );
                } else {
                    tracing::debug!(id = %params.request_id, "Cancellation for unknown request");
                }
            }
            _ => tracing::debug!(params = ?notif.params, "Ignoring malformed cancellation"),
        }
    }

    /// Handles one decoded message and returns the reply, if any.
    ///
    /// Tool calls run to completion here. Notifications never produce a
    /// reply.
    pub async fn handle_message(&mut self, msg: IncomingMessage) -> Option<OutgoingMessage> {
        match msg {
            IncomingMessage::Request(req) if req.method == "tools/call" => {
                match self.begin_tool_call(&req) {
                    Ok(call) => Some(call.reply.await),
                    Err(error) => Some(error.into()),
                }
            }
            IncomingMessage::Request(req) => Some(self.handle_request(&req).into()),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif);
                None
            }
        }
    }

    fn handle_request(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        tracing::debug!(id = %req.id, method = %req.method, "Request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_tools_list(req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" if self.state == ServerState::Initialising => {
                tracing::info!("Client initialised");
                self.state = ServerState::Running;
            }
            "notifications/cancelled" => {
                tracing::debug!(params = ?notif.params, "No request in flight to cancel");
            }
            other => tracing::debug!(method = other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::invalid_request(
                Some(req.id.clone()),
                "Server already initialised",
            ));
        }

        if req.params.is_none() {
            return Err(JsonRpcError::invalid_params(
                req.id.clone(),
                "Missing initialize params",
            ));
        }
        let params: InitializeParams = req.parse_params("initialize")?;

        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = %params.protocol_version,
                "Initialising session"
            );
        }

        self.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities { tools: ToolCapabilities::default() },
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({ "tools": self.registry.definitions() });
        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Validates a `tools/call` request and returns the call as a future.
    ///
    /// Nothing is sent to the tool until the future is polled.
    fn begin_tool_call(&self, req: &JsonRpcRequest) -> Result<ToolCall, JsonRpcError> {
        tracing::debug!(id = %req.id, method = %req.method, "Request");
        self.require_running(&req.id)?;

        if req.params.is_none() {
            return Err(JsonRpcError::invalid_params(
                req.id.clone(),
                "Missing tool call params",
            ));
        }
        let params: ToolCallParams = req.parse_params("tool call")?;

        let registry = Arc::clone(&self.registry);
        let id = req.id.clone();
        let reply_id = id.clone();
        let reply = async move {
            let result = registry.dispatch(&params.name, params.arguments).await;

            match serde_json::to_value(&result) {
                Ok(value) => OutgoingMessage::from(JsonRpcResponse::success(reply_id, value)),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialise tool call result");
                    OutgoingMessage::from(JsonRpcError::internal_error(
                        reply_id,
                        "Internal error: failed to serialise result",
                    ))
                }
            }
        };

        Ok(ToolCall {
            id,
            reply: Box::pin(reply),
        })
    }

    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                ErrorCode::InvalidRequest,
                "Server not initialised",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer<&'static [u8], Vec<u8>> {
        McpServer::new(Transport::new(&b""[..], Vec::new()), ToolRegistry::new())
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> IncomingMessage {
        IncomingMessage::Request(JsonRpcRequest {
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        })
    }

    fn initialized() -> IncomingMessage {
        IncomingMessage::Notification(JsonRpcNotification {
            method: "notifications/initialized".to_string(),
            params: None,
        })
    }

    fn init_params() -> Option<Value> {
        Some(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "1.0.0"}
        }))
    }

    #[test]
    fn server_initial_state() {
        assert_eq!(server().state(), ServerState::AwaitingInit);
    }

    #[tokio::test]
    async fn lifecycle_transitions() {
        let mut server = server();

        let reply = server.handle_message(request(1, "initialize", init_params())).await;
        assert!(matches!(reply, Some(OutgoingMessage::Response(_))));
        assert_eq!(server.state(), ServerState::Initialising);
        assert_eq!(server.protocol_version(), Some(MCP_PROTOCOL_VERSION));

        assert!(server.handle_message(initialized()).await.is_none());
        assert_eq!(server.state(), ServerState::Running);
    }

    #[tokio::test]
    async fn tools_list_requires_initialisation() {
        let mut server = server();
        let reply = server.handle_message(request(1, "tools/list", None)).await;

        let Some(OutgoingMessage::Error(err)) = reply else {
            panic!("Expected error reply");
        };
        assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
    }

    #[tokio::test]
    async fn double_initialize_rejected() {
        let mut server = server();
        server.handle_message(request(1, "initialize", init_params())).await;
        let reply = server.handle_message(request(2, "initialize", init_params())).await;
        assert!(matches!(reply, Some(OutgoingMessage::Error(_))));
    }

    #[tokio::test]
    async fn initialize_without_params_rejected() {
        let mut server = server();
        let reply = server.handle_message(request(1, "initialize", None)).await;

        let Some(OutgoingMessage::Error(err)) = reply else {
            panic!("Expected error reply");
        };
        assert_eq!(err.error.code, ErrorCode::InvalidParams.code());
        assert_eq!(server.state(), ServerState::AwaitingInit);
    }

    #[tokio::test]
    async fn unknown_method() {
        let mut server = server();
        let reply = server.handle_message(request(5, "resources/list", None)).await;

        let Some(OutgoingMessage::Error(err)) = reply else {
            panic!("Expected error reply");
        };
        assert_eq!(err.error.code, ErrorCode::MethodNotFound.code());
        assert_eq!(err.id, Some(RequestId::Number(5)));
    }

    #[tokio::test]
    async fn ping_works_before_initialisation() {
        let mut server = server();
        let reply = server.handle_message(request(1, "ping", None)).await;
        assert!(matches!(reply, Some(OutgoingMessage::Response(_))));
    }

    #[tokio::test]
    async fn serve_stops_at_end_of_input() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            "garbage\n"
        );
        let mut server = McpServer::new(
            Transport::new(input.as_bytes(), Vec::new()),
            ToolRegistry::new(),
        );

        server.serve().await.unwrap();
        assert_eq!(server.state(), ServerState::ShuttingDown);
    }

    #[tokio::test]
    async fn serve_survives_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe garbage\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
        let mut server = McpServer::new(Transport::new(input, Vec::new()), ToolRegistry::new());

        assert!(server.serve().await.is_ok());
        assert_eq!(server.state(), ServerState::ShuttingDown);
    }

    #[test]
    fn cancel_prefers_active_then_queued() {
        let mut pending = Pending {
            active: Some(ToolCall {
                id: RequestId::Number(1),
                reply: Box::pin(std::future::pending()),
            }),
            queued: VecDeque::from([JsonRpcRequest {
                id: RequestId::Number(2),
                method: "tools/call".to_string(),
                params: None,
            }]),
        };

        assert!(!pending.cancel(&RequestId::Number(9)));
        assert!(pending.cancel(&RequestId::Number(2)));
        assert!(pending.queued.is_empty());
        assert!(pending.active.is_some());
        assert!(pending.cancel(&RequestId::Number(1)));
        assert!(pending.active.is_none());
    }
}
