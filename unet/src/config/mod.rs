//! Configuration module for U-Net assembly.
//!
//! It is organized into two submodules:
//! - `setup`: the block factory configuration (`BlockSetup`) and its presets
//! - `enums`: the operator choices a `BlockSetup` selects between

pub mod enums;
pub mod setup;

pub use enums::{BlockKind, Downsample, DropoutPolicy, Gate, Norm, Upsample};
pub use setup::BlockSetup;
