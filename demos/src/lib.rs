//! U-Net Demos
//!
//! ## Available Demos
//!
//! - `summary`: Build a network and print its module tree, stage widths and
//!   parameter count
//! - `bench`: Time forward passes of a network on a zero input
//!
//! ## Usage
//!
//! ```bash
//! # Summarise the thin preset
//! cargo run --bin summary -- --down 16,32,64 --up 32,16 --setup thin
//!
//! # Benchmark a padded fat network on 256x256 inputs
//! cargo run --release --bin bench -- --down 32,64,128 --up 64,32 --padding --image-size 256
//! ```

pub mod config;

pub use config::{ModelArgs, SetupPreset};

use burn::prelude::*;
use cfg_if::cfg_if;

// One backend per build, picked by feature flag
cfg_if! {
    if #[cfg(feature = "cuda")] {
        /// Backend every demo network runs on.
        pub type DemoBackend = burn::backend::cuda::Cuda;
        pub const BACKEND_NAME: &str = "CUDA";
    } else if #[cfg(feature = "wgpu")] {
        /// Backend every demo network runs on.
        pub type DemoBackend = burn::backend::wgpu::Wgpu;
        pub const BACKEND_NAME: &str = "WGPU";
    } else {
        /// Backend every demo network runs on.
        pub type DemoBackend = burn::backend::NdArray;
        pub const BACKEND_NAME: &str = "NdArray (CPU)";
    }
}

/// Default device of [`DemoBackend`].
pub fn demo_device() -> Device<DemoBackend> {
    Default::default()
}
