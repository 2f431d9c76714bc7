//! Enumeration types for block factory configuration.
//!
//! Each enum names the interchangeable implementations of one operator slot
//! inside the down and up blocks.

use burn::prelude::*;

/// Activation applied after each convolution.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Parametric ReLU with one learnable slope per channel.
    PRelu,
    /// Plain ReLU.
    Relu,
}

/// Normalisation applied in front of each convolution.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Norm {
    /// Instance normalisation without affine parameters.
    Instance,
    /// Group normalisation with the given number of groups.
    Group(usize),
    /// Batch normalisation.
    Batch,
    /// No normalisation.
    None,
}

/// Operator that doubles spatial resolution at the start of an up block.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Upsample {
    /// Nearest-neighbour 2x.
    Nearest,
    /// Bilinear 2x.
    Bilinear,
}

/// Operator that halves spatial resolution at the start of a down block.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Downsample {
    /// 2x2 mean.
    Average,
    /// 2x2 max.
    Max,
}

/// Selects the down/up block implementation.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Two full k x k convolutions per block.
    Fat,
    /// One depthwise k x k convolution followed by a pointwise projection.
    Thin,
}

/// Dropout applied at the end of every block.
#[derive(Config, Debug, PartialEq)]
pub enum DropoutPolicy {
    /// Dropout is disabled.
    None,
    /// Dropout with the given drop probability.
    Rate(f64),
}
