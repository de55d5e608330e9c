//! Box blur for raster images via a summed-area table.
//!
//! Umbrella crate re-exporting the fastblur workspace members.

#[doc(inline)]
pub use fastblur_image as image;

#[doc(inline)]
pub use fastblur_imgproc as imgproc;

#[doc(inline)]
pub use fastblur_io as io;
