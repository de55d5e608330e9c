use fastblur_image::ImageError;

/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file cannot be read or written.
    #[error("Failed to read or write the file")]
    Io(#[from] std::io::Error),

    /// Error when the file does not start with the raw PPM magic number.
    #[error("Invalid magic number, expected P6 got {0}")]
    InvalidMagic(String),

    /// Error when the PPM header cannot be parsed.
    #[error("Invalid PPM header: {0}")]
    InvalidHeader(String),

    /// Error when the maximum color value is not 255.
    #[error("Unsupported maximum color value ({0}), only 255 is supported")]
    UnsupportedMaxVal(u32),

    /// Error when the pixel body is shorter than the header promises.
    #[error("Unexpected end of file, expected {expected} pixel bytes got {got}")]
    UnexpectedEof {
        /// Number of pixel bytes promised by the header.
        expected: usize,
        /// Number of pixel bytes present in the file.
        got: usize,
    },

    /// Error when the decoded data cannot be turned into an image.
    #[error(transparent)]
    Image(#[from] ImageError),
}
