//! U-Net Summary
//!
//! Builds a network and prints its module tree, stage widths and parameter
//! count.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin summary -- --down 16,32,64 --up 32,16 --setup thin
//!
//! # Write the resolved configuration for later use with --config
//! cargo run --bin summary -- --down 8,16 --up 8 --save unet.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::config::Config;
use clap::Parser;
use unet_burn::UnetConfig;
use unet_demos::{demo_device, DemoBackend, ModelArgs, BACKEND_NAME};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    model: ModelArgs,

    /// Write the resolved configuration as JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Skip printing the module tree
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config: UnetConfig = args.model.to_config()?;
    config.validate()?;

    if let Some(path) = &args.save {
        config
            .save(path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        println!("Configuration written to: {}", path.display());
    }

    let device = demo_device();
    println!("Using backend: {BACKEND_NAME}");

    let unet = config.init::<DemoBackend>(&device)?;

    if !args.quiet {
        println!("{unet}");
    }
    println!("Input channels: {}", unet.in_features());
    println!("Encoder widths: {:?}", unet.down());
    println!("Decoder widths: {:?}", unet.up());
    println!("Output channels: {}", unet.out_channels());
    println!("Checkpointed: {}", config.setup.checkpointed);
    println!("Parameters: {}", unet.n_params());

    Ok(())
}
