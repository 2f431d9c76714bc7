//! Block factory configuration.
//!
//! A `BlockSetup` bundles every operator choice a down or up block is built
//! from. The two presets, [`BlockSetup::fat`] and [`BlockSetup::thin`], share
//! all operator choices and differ only in the block implementation.

use burn::prelude::*;

use super::enums::*;
use crate::error::{UnetError, UnetResult};

/// Operator choices shared by every block of a network.
#[derive(Config, Debug, PartialEq)]
pub struct BlockSetup {
    /// Activation after each convolution.
    #[config(default = "Gate::PRelu")]
    pub gate: Gate,
    /// Normalisation before each convolution.
    #[config(default = "Norm::Instance")]
    pub norm: Norm,
    /// Resolution-doubling operator of the up blocks.
    #[config(default = "Upsample::Nearest")]
    pub upsample: Upsample,
    /// Resolution-halving operator of the down blocks.
    #[config(default = "Downsample::Average")]
    pub downsample: Downsample,
    /// Implementation of the encoder stages.
    #[config(default = "BlockKind::Fat")]
    pub down_block: BlockKind,
    /// Implementation of the decoder stages.
    #[config(default = "BlockKind::Fat")]
    pub up_block: BlockKind,
    /// Dropout at the end of every block.
    #[config(default = "DropoutPolicy::None")]
    pub dropout: DropoutPolicy,
    /// Pad convolutions so they preserve spatial size. Unpadded convolutions
    /// shrink every activation by `size - 1` per convolution.
    #[config(default = "false")]
    pub padding: bool,
    /// Add a bias term to every convolution.
    #[config(default = "true")]
    pub bias: bool,
    /// Wrap every block so its forward pass is recomputed during the backward pass.
    #[config(default = "false")]
    pub checkpointed: bool,
}

impl BlockSetup {
    /// Two full convolutions per block.
    pub fn fat() -> Self {
        Self::new()
    }

    /// Depthwise-separable convolutions per block.
    pub fn thin() -> Self {
        Self::new()
            .with_down_block(BlockKind::Thin)
            .with_up_block(BlockKind::Thin)
    }

    /// Convolution padding for a `size x size` kernel.
    pub(crate) const fn conv_padding(&self, size: usize) -> usize {
        if self.padding {
            size / 2
        } else {
            0
        }
    }

    /// Validate the operator choices against a kernel size and every channel
    /// width a normalisation layer will be applied to.
    ///
    /// # Errors
    ///
    /// Returns `Err(UnetError::InvalidConfiguration)` if a choice cannot be
    /// applied.
    pub fn validate(&self, size: usize, normed_channels: &[usize]) -> UnetResult<()> {
        if self.padding && size % 2 == 0 {
            return Err(UnetError::InvalidConfiguration {
                reason: format!("Padded convolutions need an odd kernel size, got {size}"),
            });
        }

        if let DropoutPolicy::Rate(prob) = self.dropout {
            if !(0.0..1.0).contains(&prob) {
                return Err(UnetError::InvalidConfiguration {
                    reason: format!("Dropout probability must be in [0, 1), got {prob}"),
                });
            }
        }

        if let Norm::Group(groups) = self.norm {
            if groups == 0 {
                return Err(UnetError::InvalidConfiguration {
                    reason: "Group normalisation needs at least one group".to_string(),
                });
            }
            if let Some(channels) = normed_channels.iter().find(|&&c| c % groups != 0) {
                return Err(UnetError::InvalidConfiguration {
                    reason: format!(
                        "Group normalisation with {groups} groups cannot normalise {channels} channels"
                    ),
                });
            }
        }

        Ok(())
    }
}
