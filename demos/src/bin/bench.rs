//! U-Net Forward Benchmark
//!
//! Times repeated forward passes of a network on a zero input.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin bench -- --down 32,64,128 --up 64,32 --padding --image-size 256
//! ```

use std::time::Instant;

use anyhow::{ensure, Result};
use burn::prelude::*;
use clap::Parser;
use unet_demos::{demo_device, DemoBackend, ModelArgs, BACKEND_NAME};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    model: ModelArgs,

    /// Spatial size of the square input
    #[arg(long, default_value = "256")]
    image_size: usize,

    /// Batch size
    #[arg(short, long, default_value = "1")]
    batch_size: usize,

    /// Number of timed forward passes
    #[arg(short = 'n', long, default_value = "20")]
    iterations: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.iterations > 0, "At least one iteration is required");

    let device = demo_device();
    println!("Using backend: {BACKEND_NAME}");

    let unet = args.model.to_config()?.init::<DemoBackend>(&device)?;
    println!("Parameters: {}", unet.n_params());
    ensure!(
        args.image_size >= unet.min_input_size(),
        "--image-size must be at least {} for this network",
        unet.min_input_size()
    );

    let shape = [
        args.batch_size,
        unet.in_features(),
        args.image_size,
        args.image_size,
    ];

    let start = Instant::now();
    let mut result = Vec::with_capacity(args.iterations);
    let mut output_shape = None;
    for _ in 0..args.iterations {
        let start_ = Instant::now();
        let x = Tensor::<DemoBackend, 4>::zeros(shape, &device);
        let y = unet.forward(x)?;
        // Force the backend to finish the pass before stopping the clock
        let dims = y.dims();
        let _ = y.into_data();
        output_shape = Some(dims);
        result.push(start_.elapsed());
    }
    let total = start.elapsed();

    println!("Input shape: {shape:?}, output shape: {output_shape:?}");
    println!(
        "Total time: {:?}, Speed: {:.2} it/s",
        total,
        args.iterations as f32 / total.as_secs_f32()
    );
    println!("{result:?}");

    Ok(())
}
