//! # Encoder and Decoder Stages
//!
//! A stage is one block of the encoder or decoder path. The block
//! implementation is selected by the `down_block` / `up_block` choice of the
//! [`BlockSetup`], so fat and thin networks share one assembly.

use burn::prelude::*;

use super::{
    ThinUnetDownBlock, ThinUnetDownBlockConfig, ThinUnetUpBlock, ThinUnetUpBlockConfig,
    UnetDownBlock, UnetDownBlockConfig, UnetUpBlock, UnetUpBlockConfig,
};
use crate::{
    config::{BlockKind, BlockSetup},
    models::path::{DownBlock, UpBlock},
};

/// An enum to wrap the encoder block implementations.
#[derive(Module, Debug)]
pub enum DownStage<B: Backend> {
    Fat(UnetDownBlock<B>),
    Thin(ThinUnetDownBlock<B>),
}

/// Construction arguments of one encoder stage.
#[derive(Config, Debug)]
pub struct DownStageConfig {
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    /// Convolution kernel size.
    pub size: usize,
    /// Stage name, `down_{i}`.
    pub name: String,
    /// Operator choices.
    pub setup: BlockSetup,
    /// Marks the first encoder stage.
    #[config(default = "false")]
    pub is_first: bool,
}

impl DownStageConfig {
    /// Initializes the encoder block selected by `setup.down_block`.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> DownStage<B> {
        log::debug!(
            "{}: {:?} down block, {} -> {} channels{}",
            self.name,
            self.setup.down_block,
            self.in_channels,
            self.out_channels,
            if self.is_first { " (entry)" } else { "" }
        );

        match self.setup.down_block {
            BlockKind::Fat => DownStage::Fat(
                UnetDownBlockConfig::new(self.in_channels, self.out_channels)
                    .with_size(self.size)
                    .with_setup(self.setup.clone())
                    .with_is_first(self.is_first)
                    .init(device),
            ),
            BlockKind::Thin => DownStage::Thin(
                ThinUnetDownBlockConfig::new(self.in_channels, self.out_channels)
                    .with_size(self.size)
                    .with_setup(self.setup.clone())
                    .with_is_first(self.is_first)
                    .init(device),
            ),
        }
    }
}

impl<B: Backend> DownBlock<B> for DownStage<B> {
    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Fat(block) => block.forward(x),
            Self::Thin(block) => block.forward(x),
        }
    }

    fn out_channels(&self) -> usize {
        match self {
            Self::Fat(block) => block.out_channels(),
            Self::Thin(block) => block.out_channels(),
        }
    }
}

/// An enum to wrap the decoder block implementations.
#[derive(Module, Debug)]
pub enum UpStage<B: Backend> {
    Fat(UnetUpBlock<B>),
    Thin(ThinUnetUpBlock<B>),
}

/// Construction arguments of one decoder stage.
#[derive(Config, Debug)]
pub struct UpStageConfig {
    /// Channels arriving from the deeper stage.
    pub bottom_channels: usize,
    /// Channels of the skip connection.
    pub horizontal_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    /// Convolution kernel size.
    pub size: usize,
    /// Stage name, `up_{i}`.
    pub name: String,
    /// Operator choices.
    pub setup: BlockSetup,
}

impl UpStageConfig {
    /// Initializes the decoder block selected by `setup.up_block`.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> UpStage<B> {
        log::debug!(
            "{}: {:?} up block, {} + {} -> {} channels",
            self.name,
            self.setup.up_block,
            self.bottom_channels,
            self.horizontal_channels,
            self.out_channels
        );

        match self.setup.up_block {
            BlockKind::Fat => UpStage::Fat(
                UnetUpBlockConfig::new(
                    self.bottom_channels,
                    self.horizontal_channels,
                    self.out_channels,
                )
                .with_size(self.size)
                .with_setup(self.setup.clone())
                .init(device),
            ),
            BlockKind::Thin => UpStage::Thin(
                ThinUnetUpBlockConfig::new(
                    self.bottom_channels,
                    self.horizontal_channels,
                    self.out_channels,
                )
                .with_size(self.size)
                .with_setup(self.setup.clone())
                .init(device),
            ),
        }
    }
}

impl<B: Backend> UpBlock<B> for UpStage<B> {
    fn forward(&self, bot: Tensor<B, 4>, hor: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Fat(block) => block.forward(bot, hor),
            Self::Thin(block) => block.forward(bot, hor),
        }
    }

    fn out_channels(&self) -> usize {
        match self {
            Self::Fat(block) => block.out_channels(),
            Self::Thin(block) => block.out_channels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn setup_selects_block_kind() {
        let device = Default::default();

        let fat = DownStageConfig::new(1, 4, 3, "down_0".to_string(), BlockSetup::fat())
            .with_is_first(true)
            .init::<TestBackend>(&device);
        assert!(matches!(fat, DownStage::Fat(_)));

        let thin = DownStageConfig::new(1, 4, 3, "down_0".to_string(), BlockSetup::thin())
            .with_is_first(true)
            .init::<TestBackend>(&device);
        assert!(matches!(thin, DownStage::Thin(_)));

        let up = UpStageConfig::new(8, 4, 4, 3, "up_0".to_string(), BlockSetup::thin())
            .init::<TestBackend>(&device);
        assert!(matches!(up, UpStage::Thin(_)));
        assert_eq!(UpBlock::out_channels(&up), 4);
    }

    #[test]
    fn mixed_setup_builds_each_side_independently() {
        let device = Default::default();
        let setup = BlockSetup::fat().with_up_block(BlockKind::Thin);

        let down = DownStageConfig::new(4, 8, 3, "down_1".to_string(), setup.clone())
            .init::<TestBackend>(&device);
        let up = UpStageConfig::new(8, 4, 4, 3, "up_0".to_string(), setup)
            .init::<TestBackend>(&device);

        assert!(matches!(down, DownStage::Fat(_)));
        assert!(matches!(up, UpStage::Thin(_)));
    }
}
