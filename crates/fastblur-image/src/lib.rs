#![deny(missing_docs)]
//! Image container types for the fastblur crates.

/// image representation for the blur pipeline.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
