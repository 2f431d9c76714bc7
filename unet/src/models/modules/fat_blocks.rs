//! # Fat Blocks
//!
//! Encoder and decoder stages built from two full `size x size` convolutions
//! each.

use burn::{
    nn::{conv::Conv2d, Dropout},
    prelude::*,
};
use burn_extra_ops::{cut_to_match, TrivialDownsample, TrivialUpsample};

use super::ops::{self, GateLayer, NormLayer};
use crate::config::BlockSetup;

/// Configuration for the `UnetDownBlock` module.
#[derive(Config, Debug)]
pub struct UnetDownBlockConfig {
    /// Number of input channels.
    in_channels: usize,
    /// Number of output channels.
    out_channels: usize,
    /// Convolution kernel size.
    #[config(default = "5")]
    size: usize,
    /// Operator choices.
    #[config(default = "BlockSetup::fat()")]
    setup: BlockSetup,
    /// The entry stage works at input resolution and on the raw input, so it
    /// neither downsamples nor normalises its input.
    #[config(default = "false")]
    is_first: bool,
}

impl UnetDownBlockConfig {
    /// Initializes a new `UnetDownBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> UnetDownBlock<B> {
        let setup = &self.setup;
        let (downsample, norm_in) = if self.is_first {
            (None, NormLayer::none())
        } else {
            (
                Some(ops::downsample(&setup.downsample)),
                NormLayer::new(&setup.norm, self.in_channels, device),
            )
        };

        UnetDownBlock {
            downsample,
            norm_in,
            conv1: ops::conv(
                setup,
                [self.in_channels, self.out_channels],
                self.size,
                1,
                device,
            ),
            gate1: GateLayer::new(&setup.gate, self.out_channels, device),
            norm_mid: NormLayer::new(&setup.norm, self.out_channels, device),
            conv2: ops::conv(
                setup,
                [self.out_channels, self.out_channels],
                self.size,
                1,
                device,
            ),
            gate2: GateLayer::new(&setup.gate, self.out_channels, device),
            dropout: ops::dropout(&setup.dropout),
            out_channels: self.out_channels,
        }
    }
}

/// A fat encoder stage.
#[derive(Module, Debug)]
pub struct UnetDownBlock<B: Backend> {
    downsample: Option<TrivialDownsample>,
    norm_in: NormLayer<B>,
    conv1: Conv2d<B>,
    gate1: GateLayer<B>,
    norm_mid: NormLayer<B>,
    conv2: Conv2d<B>,
    gate2: GateLayer<B>,
    dropout: Option<Dropout>,
    out_channels: usize,
}

impl<B: Backend> UnetDownBlock<B> {
    /// # Shapes
    /// - input: `[batch, in_channels, height, width]`
    /// - output: `[batch, out_channels, height', width']`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match &self.downsample {
            Some(downsample) => downsample.forward(x),
            None => x,
        };
        let x = self.norm_in.forward(x);
        let x = self.conv1.forward(x);
        let x = self.gate1.forward(x);
        let x = self.norm_mid.forward(x);
        let x = self.conv2.forward(x);
        let x = self.gate2.forward(x);

        ops::apply_dropout(&self.dropout, x)
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }
}

/// Configuration for the `UnetUpBlock` module.
#[derive(Config, Debug)]
pub struct UnetUpBlockConfig {
    /// Channels of the activation arriving from the deeper stage.
    bottom_channels: usize,
    /// Channels of the skip connection from the mirrored encoder stage.
    horizontal_channels: usize,
    /// Number of output channels.
    out_channels: usize,
    /// Convolution kernel size.
    #[config(default = "5")]
    size: usize,
    /// Operator choices.
    #[config(default = "BlockSetup::fat()")]
    setup: BlockSetup,
}

impl UnetUpBlockConfig {
    /// Initializes a new `UnetUpBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> UnetUpBlock<B> {
        let setup = &self.setup;
        let cat_channels = self.bottom_channels + self.horizontal_channels;

        UnetUpBlock {
            upsample: ops::upsample(&setup.upsample),
            norm_in: NormLayer::new(&setup.norm, cat_channels, device),
            conv1: ops::conv(setup, [cat_channels, cat_channels], self.size, 1, device),
            gate1: GateLayer::new(&setup.gate, cat_channels, device),
            norm_mid: NormLayer::new(&setup.norm, cat_channels, device),
            conv2: ops::conv(
                setup,
                [cat_channels, self.out_channels],
                self.size,
                1,
                device,
            ),
            gate2: GateLayer::new(&setup.gate, self.out_channels, device),
            dropout: ops::dropout(&setup.dropout),
            out_channels: self.out_channels,
        }
    }
}

/// A fat decoder stage.
#[derive(Module, Debug)]
pub struct UnetUpBlock<B: Backend> {
    upsample: TrivialUpsample,
    norm_in: NormLayer<B>,
    conv1: Conv2d<B>,
    gate1: GateLayer<B>,
    norm_mid: NormLayer<B>,
    conv2: Conv2d<B>,
    gate2: GateLayer<B>,
    dropout: Option<Dropout>,
    out_channels: usize,
}

impl<B: Backend> UnetUpBlock<B> {
    /// # Shapes
    /// - bot: `[batch, bottom_channels, height, width]`
    /// - hor: `[batch, horizontal_channels, >= 2 * height, >= 2 * width]`
    /// - output: `[batch, out_channels, height', width']`
    pub fn forward(&self, bot: Tensor<B, 4>, hor: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = merge(&self.upsample, bot, hor);
        let x = self.norm_in.forward(x);
        let x = self.conv1.forward(x);
        let x = self.gate1.forward(x);
        let x = self.norm_mid.forward(x);
        let x = self.conv2.forward(x);
        let x = self.gate2.forward(x);

        ops::apply_dropout(&self.dropout, x)
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }
}

/// Upsamples `bot`, crops both activations to their common spatial size and
/// concatenates them along the channel dimension, `bot` first.
pub(super) fn merge<B: Backend>(
    upsample: &TrivialUpsample,
    bot: Tensor<B, 4>,
    hor: Tensor<B, 4>,
) -> Tensor<B, 4> {
    let bot = upsample.forward(bot);
    let bot = cut_to_match(&hor, bot, 2);
    let hor = cut_to_match(&bot, hor, 2);

    Tensor::cat(vec![bot, hor], 1)
}
