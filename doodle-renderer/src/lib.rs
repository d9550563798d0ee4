//! # Doodle Renderer
//!
//! Raster side of drawing capture, built on tiny-skia.
//!
//! ```text
//! pointer events ──► StrokeSurface ──► is_blank() gate
//!                         │
//!                         └──► flatten() ──► opaque PNG ──► data URI
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blank;
pub mod error;
pub mod export;
pub mod surface;

pub use error::{RenderError, RenderResult};
pub use export::{flatten, FlattenedImage, PNG_DATA_URI_PREFIX};
pub use surface::{StrokeSurface, SurfaceConfig};
