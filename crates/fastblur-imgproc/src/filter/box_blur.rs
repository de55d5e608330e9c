use fastblur_image::{Image, ImageError};
use rayon::prelude::*;

use crate::integral::IntegralImage;
use crate::parallel::ExecutionStrategy;

/// Compute one output row from the completed summed-area table.
///
/// Every pixel is the truncated mean of the square window of `radius` around
/// it, clamped to the image bounds: the window corners are clamped first and
/// the divisor is the clamped pixel count, so edge pixels average only the
/// pixels that exist instead of phantom out-of-bounds ones.
#[inline]
fn blur_row<const C: usize>(
    integral: &IntegralImage<C>,
    radius: usize,
    row: usize,
    dst_row: &mut [u8],
) {
    let width = integral.size().width;
    let height = integral.size().height;

    let y_min = row.saturating_sub(radius);
    let y_max = row.saturating_add(radius).min(height - 1);

    for (col, pixel) in dst_row.chunks_exact_mut(C).enumerate() {
        let x_min = col.saturating_sub(radius);
        let x_max = col.saturating_add(radius).min(width - 1);

        let count = ((x_max - x_min + 1) * (y_max - y_min + 1)) as u64;

        for (ch, val) in pixel.iter_mut().enumerate() {
            let sum = integral.rect_sum(ch, x_min, y_min, x_max, y_max);
            // integer division truncates toward zero, matching the reference
            // float-to-u8 cast of the average
            *val = (sum / count) as u8;
        }
    }
}

/// Blur an image with a uniform square box kernel using a summed-area table,
/// with execution strategy control.
///
/// The run is a one-shot batch transform in three stages: build the
/// summed-area table (two ordered passes), then compute every output pixel
/// independently from the completed table. Each stage joins fully before the
/// next starts; the table is dropped when this function returns.
///
/// The per-pixel cost is O(1) regardless of the radius. The blurred value is
/// the arithmetic mean of the clamped window, truncated toward zero.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `radius` - Half-width of the square averaging window, in pixels.
/// * `strategy` - The execution strategy for all three stages.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn box_blur_integral_with_strategy<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    radius: usize,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.cols() == 0 || src.rows() == 0 {
        return Ok(());
    }

    let integral = IntegralImage::from_image(src, strategy)?;

    let row_stride = src.cols() * C;
    let chunk_size = strategy.effective_chunk_size();

    match strategy {
        ExecutionStrategy::Serial => {
            dst.as_slice_mut()
                .chunks_exact_mut(row_stride)
                .enumerate()
                .for_each(|(row, dst_row)| blur_row(&integral, radius, row, dst_row));
        }
        ExecutionStrategy::Parallel { .. } => {
            dst.as_slice_mut()
                .par_chunks_exact_mut(row_stride)
                .with_min_len(chunk_size)
                .enumerate()
                .for_each(|(row, dst_row)| blur_row(&integral, radius, row, dst_row));
        }
    }

    Ok(())
}

/// Blur an image with a uniform square box kernel using a summed-area table.
///
/// Uses the default parallel strategy. For explicit control, use
/// [`box_blur_integral_with_strategy`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `radius` - Half-width of the square averaging window, in pixels.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Examples
///
/// ```
/// use fastblur_image::{Image, ImageSize};
/// use fastblur_imgproc::filter::box_blur_integral;
///
/// let image = Image::<u8, 3>::from_size_val(
///     ImageSize { width: 4, height: 4 },
///     128,
/// ).unwrap();
///
/// let mut blurred = Image::<u8, 3>::from_size_val(image.size(), 0).unwrap();
/// box_blur_integral(&image, &mut blurred, 1).unwrap();
///
/// assert_eq!(blurred.as_slice(), image.as_slice());
/// ```
pub fn box_blur_integral<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    radius: usize,
) -> Result<(), ImageError> {
    box_blur_integral_with_strategy(src, dst, radius, ExecutionStrategy::default())
}
