use std::fs;
use std::path::Path;

use fastblur_image::{Image, ImageSize};

use crate::error::IoError;

/// Advance past whitespace and `#` comments, returning the next header token.
fn next_token<'a>(bytes: &'a [u8], pos: &mut usize) -> Result<&'a [u8], IoError> {
    loop {
        while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos < bytes.len() && bytes[*pos] == b'#' {
            while *pos < bytes.len() && bytes[*pos] != b'\n' {
                *pos += 1;
            }
            continue;
        }
        break;
    }

    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }

    if start == *pos {
        return Err(IoError::InvalidHeader("truncated header".to_string()));
    }

    Ok(&bytes[start..*pos])
}

fn parse_number(token: &[u8]) -> Result<usize, IoError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| {
            IoError::InvalidHeader(format!(
                "expected a number, got {:?}",
                String::from_utf8_lossy(token)
            ))
        })
}

/// Read a raw (P6) PPM image from the given file path.
///
/// Only 8-bit images (maximum color value 255) are supported.
///
/// # Arguments
///
/// * `file_path` - The path to the PPM file.
///
/// # Returns
///
/// The decoded RGB image.
///
/// # Errors
///
/// Fails if the file cannot be opened, the header is not a valid raw PPM
/// header, or the pixel body is shorter than the header promises.
pub fn read_image_ppm(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let bytes = fs::read(file_path)?;
    let mut pos = 0;

    let magic = next_token(&bytes, &mut pos)?;
    if magic != b"P6" {
        return Err(IoError::InvalidMagic(
            String::from_utf8_lossy(magic).into_owned(),
        ));
    }

    let width = parse_number(next_token(&bytes, &mut pos)?)?;
    let height = parse_number(next_token(&bytes, &mut pos)?)?;
    let maxval = parse_number(next_token(&bytes, &mut pos)?)?;
    if maxval != 255 {
        return Err(IoError::UnsupportedMaxVal(maxval as u32));
    }

    // exactly one whitespace byte separates the header from the pixel body
    if pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let size = ImageSize { width, height };
    let expected = size.checked_len(3).map_err(IoError::Image)?;
    let body = &bytes[pos..];
    if body.len() < expected {
        return Err(IoError::UnexpectedEof {
            expected,
            got: body.len(),
        });
    }

    Ok(Image::new(size, body[..expected].to_vec())?)
}

/// Write an RGB image to the given file path as a raw (P6) PPM.
///
/// The header and pixel body are assembled in memory and written in a single
/// call, so nothing is written if an earlier step fails.
///
/// # Arguments
///
/// * `image` - The image to encode.
/// * `file_path` - The path to write the PPM file to.
///
/// # Errors
///
/// Fails with [`IoError::Io`] if the file cannot be written.
pub fn write_image_ppm(image: &Image<u8, 3>, file_path: impl AsRef<Path>) -> Result<(), IoError> {
    let header = format!("P6\n{} {}\n255\n", image.width(), image.height());

    let mut bytes = Vec::with_capacity(header.len() + image.as_slice().len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(image.as_slice());

    fs::write(file_path, bytes)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastblur_image::{Image, ImageSize};

    #[test]
    fn ppm_round_trip() -> Result<(), IoError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let data: Vec<u8> = (0..size.width * size.height * 3).map(|x| x as u8).collect();
        let image = Image::new(size, data)?;

        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("image.ppm");

        write_image_ppm(&image, &file_path)?;
        let image_back = read_image_ppm(&file_path)?;

        assert_eq!(image_back.size(), size);
        assert_eq!(image_back.as_slice(), image.as_slice());

        Ok(())
    }

    #[test]
    fn ppm_header_with_comment() -> Result<(), IoError> {
        let mut bytes = b"P6\n# created by a test\n2 1\n255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("comment.ppm");
        std::fs::write(&file_path, bytes)?;

        let image = read_image_ppm(&file_path)?;
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.as_slice(), &[1, 2, 3, 4, 5, 6]);

        Ok(())
    }

    #[test]
    fn ppm_invalid_magic() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray.pgm");
        std::fs::write(&file_path, b"P5\n1 1\n255\n\0")?;

        let res = read_image_ppm(&file_path);
        assert!(matches!(res, Err(IoError::InvalidMagic(_))));

        Ok(())
    }

    #[test]
    fn ppm_unsupported_maxval() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("deep.ppm");
        std::fs::write(&file_path, b"P6\n1 1\n65535\n\0\0\0\0\0\0")?;

        let res = read_image_ppm(&file_path);
        assert!(matches!(res, Err(IoError::UnsupportedMaxVal(65535))));

        Ok(())
    }

    #[test]
    fn ppm_truncated_body() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("short.ppm");
        std::fs::write(&file_path, b"P6\n2 2\n255\n\0\0\0")?;

        let res = read_image_ppm(&file_path);
        assert!(matches!(
            res,
            Err(IoError::UnexpectedEof {
                expected: 12,
                got: 3
            })
        ));

        Ok(())
    }

    #[test]
    fn ppm_missing_file() {
        let res = read_image_ppm("/definitely/not/a/file.ppm");
        assert!(matches!(res, Err(IoError::Io(_))));
    }
}
