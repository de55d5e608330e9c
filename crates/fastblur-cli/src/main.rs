use argh::FromArgs;
use std::path::PathBuf;
use std::time::Instant;

use fastblur::image::Image;
use fastblur::imgproc::filter::box_blur_integral_with_strategy;
use fastblur::imgproc::parallel::{ExecutionStrategy, DEFAULT_CHUNK_SIZE};
use fastblur::io::{read_image_ppm, write_image_ppm};

#[derive(FromArgs)]
/// Box blur a raw PPM image using a summed-area table
struct Args {
    /// blur radius in pixels, must be non-negative
    #[argh(positional)]
    radius: i64,

    /// path to the input image (raw PPM, P6)
    #[argh(positional)]
    input: PathBuf,

    /// path to write the blurred image (raw PPM, P6)
    #[argh(positional)]
    output: PathBuf,

    /// rows/columns per worker dispatch (default 4)
    #[argh(option, default = "DEFAULT_CHUNK_SIZE")]
    chunk_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    if args.radius < 0 {
        return Err(format!("radius must be non-negative, got {}", args.radius).into());
    }
    let radius = args.radius as usize;

    let strategy = ExecutionStrategy::parallel_with_chunk_size(args.chunk_size)?;

    let image = read_image_ppm(&args.input)?;
    log::info!(
        "blurring {} ({}) with radius {radius}",
        args.input.display(),
        image.size()
    );

    let mut blurred = Image::from_size_val(image.size(), 0u8)?;

    let start = Instant::now();
    box_blur_integral_with_strategy(&image, &mut blurred, radius, strategy)?;
    log::info!("blurred in {:?}", start.elapsed());

    write_image_ppm(&blurred, &args.output)?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}
