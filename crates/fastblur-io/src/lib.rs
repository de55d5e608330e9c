#![deny(missing_docs)]
//! PPM (raw P6) image reading and writing for the fastblur crates.

/// Error types for the io module.
pub mod error;

/// Read and write raw (P6) PPM files.
pub mod ppm;

pub use crate::error::IoError;
pub use crate::ppm::{read_image_ppm, write_image_ppm};
