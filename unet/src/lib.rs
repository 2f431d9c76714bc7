//! # U-Net on Burn
//!
//! Assembles U-shaped encoder/decoder networks from interchangeable building
//! blocks. The encoder path reduces spatial resolution stage by stage, the
//! decoder path restores it, and every decoder stage merges the output of its
//! mirrored encoder stage through a skip connection.
//!
//! ```rust,no_run
//! use burn::{backend::NdArray, prelude::*};
//! use unet_burn::{BlockSetup, UnetConfig};
//!
//! type B = NdArray;
//!
//! let device = Default::default();
//! let unet = UnetConfig::new(vec![16, 32, 64], vec![32, 16])
//!     .with_in_features(3)
//!     .with_size(3)
//!     .with_setup(BlockSetup::thin().with_padding(true))
//!     .init::<B>(&device)
//!     .unwrap();
//!
//! let x = Tensor::<B, 4>::zeros([1, 3, 64, 64], &device);
//! let y = unet.forward(x).unwrap();
//! assert_eq!(y.dims()[1], 16);
//! ```

mod config;
mod error;
mod models;


pub use config::*;
pub use error::{UnetError, UnetResult};
pub use models::{
    checkpoint::{execution_path, recompute, Checkpointed, ExecutionPath},
    modules::{
        DownStage, DownStageConfig, ThinUnetDownBlock, ThinUnetDownBlockConfig, ThinUnetUpBlock,
        ThinUnetUpBlockConfig, UnetDownBlock, UnetDownBlockConfig, UnetUpBlock,
        UnetUpBlockConfig, UpStage, UpStageConfig,
    },
    path::{
        check_input_channels, check_input_extent, decode, encode, skip_connections, unet_forward,
        DownBlock, UpBlock,
    },
    unet::{Unet, UnetConfig, UnetRecord},
};
