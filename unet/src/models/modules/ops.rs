//! # Operator Selection
//!
//! Turns the operator choices of a [`BlockSetup`] into concrete Burn modules.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, GroupNorm, GroupNormConfig,
        InstanceNorm, InstanceNormConfig, PRelu, PReluConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
};
use burn_extra_ops::{NoOp, TrivialDownsample, TrivialUpsample};

use crate::config::{BlockSetup, Downsample, DropoutPolicy, Gate, Norm, Upsample};

/// An enum to wrap the selectable activation layers.
#[derive(Module, Debug)]
pub enum GateLayer<B: Backend> {
    PRelu(PRelu<B>),
    Relu(Relu),
}

impl<B: Backend> GateLayer<B> {
    pub fn new(gate: &Gate, channels: usize, device: &Device<B>) -> Self {
        match gate {
            Gate::PRelu => Self::PRelu(
                PReluConfig::new()
                    .with_num_parameters(channels)
                    .init(device),
            ),
            Gate::Relu => Self::Relu(Relu::new()),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::PRelu(prelu) => prelu.forward(x),
            Self::Relu(relu) => relu.forward(x),
        }
    }
}

/// An enum to wrap the selectable normalization layers.
#[derive(Module, Debug)]
pub enum NormLayer<B: Backend> {
    Instance(InstanceNorm<B>),
    Group(GroupNorm<B>),
    Batch(BatchNorm<B, 2>),
    None(NoOp),
}

impl<B: Backend> NormLayer<B> {
    pub fn new(norm: &Norm, channels: usize, device: &Device<B>) -> Self {
        match norm {
            // Matches the non-affine default of instance normalisation elsewhere.
            Norm::Instance => Self::Instance(
                InstanceNormConfig::new(channels)
                    .with_affine(false)
                    .init(device),
            ),
            Norm::Group(groups) => Self::Group(GroupNormConfig::new(*groups, channels).init(device)),
            Norm::Batch => Self::Batch(BatchNormConfig::new(channels).init(device)),
            Norm::None => Self::none(),
        }
    }

    /// Normalization slot of an entry stage, which has no preceding stage to normalise.
    pub const fn none() -> Self {
        Self::None(NoOp::new())
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Instance(norm) => norm.forward(x),
            Self::Group(norm) => norm.forward(x),
            Self::Batch(norm) => norm.forward(x),
            Self::None(noop) => noop.forward(x),
        }
    }
}

pub const fn downsample(downsample: &Downsample) -> TrivialDownsample {
    match downsample {
        Downsample::Average => TrivialDownsample::average(),
        Downsample::Max => TrivialDownsample::max(),
    }
}

pub const fn upsample(upsample: &Upsample) -> TrivialUpsample {
    match upsample {
        Upsample::Nearest => TrivialUpsample::nearest(),
        Upsample::Bilinear => TrivialUpsample::bilinear(),
    }
}

pub fn dropout(policy: &DropoutPolicy) -> Option<Dropout> {
    match policy {
        DropoutPolicy::None => None,
        DropoutPolicy::Rate(prob) => Some(DropoutConfig::new(*prob).init()),
    }
}

pub fn apply_dropout<B: Backend>(dropout: &Option<Dropout>, x: Tensor<B, 4>) -> Tensor<B, 4> {
    match dropout {
        Some(dropout) => dropout.forward(x),
        None => x,
    }
}

/// A `size x size` convolution honouring the padding and bias policies of `setup`.
pub fn conv<B: Backend>(
    setup: &BlockSetup,
    channels: [usize; 2],
    size: usize,
    groups: usize,
    device: &Device<B>,
) -> Conv2d<B> {
    let pad = setup.conv_padding(size);
    let padding = if pad == 0 {
        PaddingConfig2d::Valid
    } else {
        PaddingConfig2d::Explicit(pad, pad)
    };

    Conv2dConfig::new(channels, [size, size])
        .with_stride([1, 1])
        .with_padding(padding)
        .with_groups(groups)
        .with_bias(setup.bias)
        .init(device)
}

/// A bias-aware 1x1 projection.
pub fn pointwise<B: Backend>(
    setup: &BlockSetup,
    channels: [usize; 2],
    device: &Device<B>,
) -> Conv2d<B> {
    Conv2dConfig::new(channels, [1, 1])
        .with_padding(PaddingConfig2d::Valid)
        .with_bias(setup.bias)
        .init(device)
}
