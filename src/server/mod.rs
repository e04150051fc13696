//! Public HTTP Surface
//!
//! - `GET /images/{file}?width=&height=&dpi=`: the artifact, as PNG.
//! - `GET /stats`: cache counters and the membership view, as JSON.
//! - `GET /`: a static welcome page.

pub mod handlers;
pub mod lifecycle;

pub use handlers::router;
pub use lifecycle::prepare_shutdown;

pub const ENDPOINT_IMAGE: &str = "/images/:file";
pub const ENDPOINT_STATS: &str = "/stats";
pub const ENDPOINT_ROOT: &str = "/";

/// All artifacts are encoded by the loader as PNG.
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

#[cfg(test)]
mod tests;
