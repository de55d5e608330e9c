use fastblur_image::{Image, ImageError, ImageSize};
use num_traits::AsPrimitive;
use rayon::prelude::*;

use crate::parallel::{ExecutionStrategy, SyncSlicePtr};

/// A summed-area table (2D prefix sum) over an image, one plane per channel.
///
/// Each cell of a plane holds the sum of all input pixel values of that
/// channel in the rectangle from (0, 0) to the cell, both inclusive:
///
/// `S[r][c] = S[r-1][c] + S[r][c-1] - S[r-1][c-1] + pixel[r][c]`
///
/// Sums are accumulated in `u64`, which cannot overflow for 8-bit input below
/// 2^56 pixels. Once built, the sum of any axis-aligned rectangle is an O(1)
/// inclusion-exclusion query via [`IntegralImage::rect_sum`].
pub struct IntegralImage<const C: usize> {
    size: ImageSize,
    planes: [Vec<u64>; C],
}

/// Running left-to-right sum of one channel of one image row.
#[inline]
fn scan_row<T: AsPrimitive<u64>>(
    src_data: &[T],
    width: usize,
    channels: usize,
    ch: usize,
    row: usize,
    sums_row: &mut [u64],
) {
    let row_offset = row * width * channels;
    let mut acc = 0u64;
    for (col, sum) in sums_row.iter_mut().enumerate() {
        acc += src_data[row_offset + col * channels + ch].as_();
        *sum = acc;
    }
}

impl<const C: usize> IntegralImage<C> {
    /// Build the summed-area table for an image.
    ///
    /// The table is built in two ordered passes: first each row is summed
    /// left to right (rows are mutually independent), then each column is
    /// summed top to bottom (columns are mutually independent). The column
    /// pass must observe every completed row, so each parallel pass joins
    /// fully before the next one starts.
    ///
    /// # Arguments
    ///
    /// * `src` - The source image with shape (H, W, C).
    /// * `strategy` - The execution strategy for both passes.
    ///
    /// # Errors
    ///
    /// Fails if a per-channel plane would overflow the address space.
    pub fn from_image<T>(
        src: &Image<T, C>,
        strategy: ExecutionStrategy,
    ) -> Result<Self, ImageError>
    where
        T: AsPrimitive<u64> + Send + Sync,
    {
        let size = src.size();
        let plane_len = size.checked_len(1)?;
        let mut planes: [Vec<u64>; C] = std::array::from_fn(|_| vec![0u64; plane_len]);

        let width = size.width;
        let height = size.height;
        if width == 0 || height == 0 {
            return Ok(Self { size, planes });
        }

        let src_data = src.as_slice();
        let chunk_size = strategy.effective_chunk_size();

        // Row pass: running sums of all pixels left of each pixel, seeded
        // from column 0. The image is read here so no extra initialization
        // traversal of the planes is needed.
        for (ch, plane) in planes.iter_mut().enumerate() {
            match strategy {
                ExecutionStrategy::Serial => {
                    for (row, sums_row) in plane.chunks_exact_mut(width).enumerate() {
                        scan_row(src_data, width, C, ch, row, sums_row);
                    }
                }
                ExecutionStrategy::Parallel { .. } => {
                    plane
                        .par_chunks_exact_mut(width)
                        .with_min_len(chunk_size)
                        .enumerate()
                        .for_each(|(row, sums_row)| {
                            scan_row(src_data, width, C, ch, row, sums_row);
                        });
                }
            }
        }

        // The parallel iterator above returns only once every row is written,
        // which is the barrier the column pass depends on.

        // Column pass: add the cell above, turning row sums into sums of the
        // full rectangle from the origin. Each worker owns a disjoint set of
        // columns, but the cells of a column are strided in row-major memory,
        // so workers write through a shared raw view.
        for plane in planes.iter_mut() {
            match strategy {
                ExecutionStrategy::Serial => {
                    for row in 1..height {
                        for col in 0..width {
                            let above = plane[(row - 1) * width + col];
                            plane[row * width + col] += above;
                        }
                    }
                }
                ExecutionStrategy::Parallel { .. } => {
                    let cells = SyncSlicePtr::new(plane.as_mut_slice());
                    (0..width)
                        .into_par_iter()
                        .with_min_len(chunk_size)
                        .for_each(|col| {
                            for row in 1..height {
                                // SAFETY: this worker is the only one touching
                                // the cells of `col`, and the row pass has
                                // fully completed.
                                unsafe {
                                    let above = cells.get((row - 1) * width + col);
                                    let cur = cells.get(row * width + col);
                                    cells.set(row * width + col, cur + above);
                                }
                            }
                        });
                }
            }
        }

        Ok(Self { size, planes })
    }

    /// Get the size of the underlying image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the accumulator plane of a channel.
    pub fn plane(&self, channel: usize) -> &[u64] {
        &self.planes[channel]
    }

    /// Sum of one channel over the rectangle `[x_min, x_max] × [y_min, y_max]`,
    /// all bounds inclusive, via the inclusion-exclusion `D - B - C + A` query.
    ///
    /// PRECONDITION: `channel < C`, `x_min <= x_max < width` and
    /// `y_min <= y_max < height`.
    #[inline]
    pub fn rect_sum(
        &self,
        channel: usize,
        x_min: usize,
        y_min: usize,
        x_max: usize,
        y_max: usize,
    ) -> u64 {
        debug_assert!(channel < C);
        debug_assert!(x_min <= x_max && x_max < self.size.width);
        debug_assert!(y_min <= y_max && y_max < self.size.height);

        let width = self.size.width;
        let plane = &self.planes[channel];

        let d = plane[y_max * width + x_max];
        let b = if y_min > 0 {
            plane[(y_min - 1) * width + x_max]
        } else {
            0
        };
        let c = if x_min > 0 {
            plane[y_max * width + x_min - 1]
        } else {
            0
        };
        let a = if y_min > 0 && x_min > 0 {
            plane[(y_min - 1) * width + x_min - 1]
        } else {
            0
        };

        // a is added before subtracting so the intermediate never underflows
        (d + a) - (b + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastblur_image::ImageSize;

    /// Deterministic synthetic pixel pattern.
    fn test_image<const C: usize>(size: ImageSize) -> Result<Image<u8, C>, ImageError> {
        let data = (0..size.width * size.height * C)
            .map(|i| ((i * 31 + 7) % 256) as u8)
            .collect();
        Image::new(size, data)
    }

    fn brute_force_sum<const C: usize>(
        src: &Image<u8, C>,
        ch: usize,
        x_max: usize,
        y_max: usize,
    ) -> u64 {
        let mut sum = 0u64;
        for y in 0..=y_max {
            for x in 0..=x_max {
                sum += src.get_pixel(x, y, ch).unwrap() as u64;
            }
        }
        sum
    }

    #[test]
    fn integral_matches_brute_force() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 7,
            height: 5,
        };
        let src = test_image::<3>(size)?;
        let integral = IntegralImage::from_image(&src, ExecutionStrategy::Serial)?;

        for ch in 0..3 {
            let plane = integral.plane(ch);
            for y in 0..size.height {
                for x in 0..size.width {
                    assert_eq!(
                        plane[y * size.width + x],
                        brute_force_sum(&src, ch, x, y),
                        "cell ({y}, {x}) channel {ch}"
                    );
                }
            }
        }

        Ok(())
    }

    #[test]
    fn integral_serial_parallel_agree() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 33,
            height: 17,
        };
        let src = test_image::<3>(size)?;

        let serial = IntegralImage::from_image(&src, ExecutionStrategy::Serial)?;
        let parallel = IntegralImage::from_image(&src, ExecutionStrategy::default())?;
        // chunk size 1 forces the most worker hand-offs
        let chunked = IntegralImage::from_image(
            &src,
            ExecutionStrategy::Parallel { chunk_size: 1 },
        )?;

        for ch in 0..3 {
            assert_eq!(serial.plane(ch), parallel.plane(ch));
            assert_eq!(serial.plane(ch), chunked.plane(ch));
        }

        Ok(())
    }

    #[test]
    fn integral_rect_sum_inclusion_exclusion() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 6,
            height: 6,
        };
        let src = test_image::<1>(size)?;
        let integral = IntegralImage::from_image(&src, ExecutionStrategy::Serial)?;

        for y_min in 0..size.height {
            for y_max in y_min..size.height {
                for x_min in 0..size.width {
                    for x_max in x_min..size.width {
                        let mut expected = 0u64;
                        for y in y_min..=y_max {
                            for x in x_min..=x_max {
                                expected += src.get_pixel(x, y, 0)? as u64;
                            }
                        }
                        assert_eq!(
                            integral.rect_sum(0, x_min, y_min, x_max, y_max),
                            expected
                        );
                    }
                }
            }
        }

        Ok(())
    }

    #[test]
    fn integral_single_row_and_column() -> Result<(), ImageError> {
        let row = Image::<u8, 1>::new(
            ImageSize {
                width: 4,
                height: 1,
            },
            vec![1, 2, 3, 4],
        )?;
        let integral = IntegralImage::from_image(&row, ExecutionStrategy::default())?;
        assert_eq!(integral.plane(0), &[1, 3, 6, 10]);

        let col = Image::<u8, 1>::new(
            ImageSize {
                width: 1,
                height: 4,
            },
            vec![1, 2, 3, 4],
        )?;
        let integral = IntegralImage::from_image(&col, ExecutionStrategy::default())?;
        assert_eq!(integral.plane(0), &[1, 3, 6, 10]);

        Ok(())
    }

    #[test]
    fn integral_full_white_no_overflow() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 64,
            height: 64,
        };
        let src = Image::<u8, 1>::from_size_val(size, 255)?;
        let integral = IntegralImage::from_image(&src, ExecutionStrategy::default())?;

        let total = integral.rect_sum(0, 0, 0, size.width - 1, size.height - 1);
        assert_eq!(total, 255 * 64 * 64);

        Ok(())
    }
}
