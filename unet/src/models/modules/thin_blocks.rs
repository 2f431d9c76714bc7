//! # Thin Blocks
//!
//! Encoder and decoder stages built from one depthwise-separable convolution
//! each: a depthwise `size x size` convolution followed by a 1x1 projection.
//! They accept the same configuration as the fat blocks at a fraction of the
//! parameter count.

use burn::{
    nn::{conv::Conv2d, Dropout},
    prelude::*,
};
use burn_extra_ops::{TrivialDownsample, TrivialUpsample};

use super::{
    fat_blocks::merge,
    ops::{self, GateLayer, NormLayer},
};
use crate::config::BlockSetup;

/// Configuration for the `ThinUnetDownBlock` module.
#[derive(Config, Debug)]
pub struct ThinUnetDownBlockConfig {
    /// Number of input channels.
    in_channels: usize,
    /// Number of output channels.
    out_channels: usize,
    /// Depthwise kernel size.
    #[config(default = "5")]
    size: usize,
    /// Operator choices.
    #[config(default = "BlockSetup::thin()")]
    setup: BlockSetup,
    /// Skip downsampling and input normalisation.
    #[config(default = "false")]
    is_first: bool,
}

impl ThinUnetDownBlockConfig {
    /// Initializes a new `ThinUnetDownBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ThinUnetDownBlock<B> {
        let setup = &self.setup;
        let (downsample, norm_in) = if self.is_first {
            (None, NormLayer::none())
        } else {
            (
                Some(ops::downsample(&setup.downsample)),
                NormLayer::new(&setup.norm, self.in_channels, device),
            )
        };

        ThinUnetDownBlock {
            downsample,
            norm_in,
            depthwise: ops::conv(
                setup,
                [self.in_channels, self.in_channels],
                self.size,
                self.in_channels,
                device,
            ),
            pointwise: ops::pointwise(setup, [self.in_channels, self.out_channels], device),
            gate: GateLayer::new(&setup.gate, self.out_channels, device),
            dropout: ops::dropout(&setup.dropout),
            out_channels: self.out_channels,
        }
    }
}

/// A thin encoder stage.
#[derive(Module, Debug)]
pub struct ThinUnetDownBlock<B: Backend> {
    downsample: Option<TrivialDownsample>,
    norm_in: NormLayer<B>,
    depthwise: Conv2d<B>,
    pointwise: Conv2d<B>,
    gate: GateLayer<B>,
    dropout: Option<Dropout>,
    out_channels: usize,
}

impl<B: Backend> ThinUnetDownBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match &self.downsample {
            Some(downsample) => downsample.forward(x),
            None => x,
        };
        let x = self.norm_in.forward(x);
        let x = self.depthwise.forward(x);
        let x = self.pointwise.forward(x);
        let x = self.gate.forward(x);

        ops::apply_dropout(&self.dropout, x)
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }
}

/// Configuration for the `ThinUnetUpBlock` module.
#[derive(Config, Debug)]
pub struct ThinUnetUpBlockConfig {
    /// Channels of the activation arriving from the deeper stage.
    bottom_channels: usize,
    /// Channels of the skip connection from the mirrored encoder stage.
    horizontal_channels: usize,
    /// Number of output channels.
    out_channels: usize,
    /// Depthwise kernel size.
    #[config(default = "5")]
    size: usize,
    /// Operator choices.
    #[config(default = "BlockSetup::thin()")]
    setup: BlockSetup,
}

impl ThinUnetUpBlockConfig {
    /// Initializes a new `ThinUnetUpBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ThinUnetUpBlock<B> {
        let setup = &self.setup;
        let cat_channels = self.bottom_channels + self.horizontal_channels;

        ThinUnetUpBlock {
            upsample: ops::upsample(&setup.upsample),
            norm_in: NormLayer::new(&setup.norm, cat_channels, device),
            depthwise: ops::conv(
                setup,
                [cat_channels, cat_channels],
                self.size,
                cat_channels,
                device,
            ),
            pointwise: ops::pointwise(setup, [cat_channels, self.out_channels], device),
            gate: GateLayer::new(&setup.gate, self.out_channels, device),
            dropout: ops::dropout(&setup.dropout),
            out_channels: self.out_channels,
        }
    }
}

/// A thin decoder stage.
#[derive(Module, Debug)]
pub struct ThinUnetUpBlock<B: Backend> {
    upsample: TrivialUpsample,
    norm_in: NormLayer<B>,
    depthwise: Conv2d<B>,
    pointwise: Conv2d<B>,
    gate: GateLayer<B>,
    dropout: Option<Dropout>,
    out_channels: usize,
}

impl<B: Backend> ThinUnetUpBlock<B> {
    pub fn forward(&self, bot: Tensor<B, 4>, hor: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = merge(&self.upsample, bot, hor);
        let x = self.norm_in.forward(x);
        let x = self.depthwise.forward(x);
        let x = self.pointwise.forward(x);
        let x = self.gate.forward(x);

        ops::apply_dropout(&self.dropout, x)
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }
}
