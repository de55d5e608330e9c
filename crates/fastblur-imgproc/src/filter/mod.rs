//! Filter operations
//!
//! This module provides filter operations for image processing.

/// Box blur via a summed-area table
mod box_blur;
pub use box_blur::*;
