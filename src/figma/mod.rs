//! Figma REST API access.
//!
//! - [`client`] — authenticated HTTP adapter and the [`FigmaApi`] seam
//! - [`model`] — node tree and request/result types
//! - [`normalize`] — `top`/`left` derivation from bounding boxes
//! - [`error`] — failure taxonomy

pub mod client;
pub mod error;
pub mod model;
pub mod normalize;

pub use client::{AuthMode, FigmaApi, FigmaClient};
pub use error::{FigmaError, FigmaResult};
pub use model::{BoundingBox, FetchRequest, FetchResult, Node};
pub use normalize::{normalize, normalize_result};
