//! # U-Net Assembly
//!
//! `UnetConfig` validates a pair of channel schedules against each other and
//! against the operator choices, then builds the encoder and decoder paths.
//! `Unet::forward` threads activations down the encoder and back up the
//! decoder, replaying encoder outputs as skip connections.
//!
//! With `down = [d_0, ..., d_{D-1}]` and `up = [u_0, ..., u_{D-2}]`:
//!
//! - encoder stage `i` maps `[in_features, d_0, ...][i]` to `d_i` channels;
//! - decoder stage `i` takes `[d_{D-1}, u_0, ...][i]` channels from below and
//!   `d_{D-2-i}` channels from the skip connection, and produces `u_i`.

use burn::prelude::*;

use super::{
    checkpoint::Checkpointed,
    modules::{DownStage, DownStageConfig, UpStage, UpStageConfig},
    path::{unet_forward, DownBlock, UpBlock},
};
use crate::{
    config::{BlockKind, BlockSetup},
    error::{UnetError, UnetResult},
};

/// Configuration for the `Unet` model.
#[derive(Config, Debug)]
pub struct UnetConfig {
    /// Output channels of each encoder stage, shallow to deep.
    pub down: Vec<usize>,
    /// Output channels of each decoder stage, deep to shallow. One entry
    /// shorter than `down`.
    pub up: Vec<usize>,
    /// Channels of the network input.
    #[config(default = "1")]
    pub in_features: usize,
    /// Convolution kernel size of every block.
    #[config(default = "5")]
    pub size: usize,
    /// Operator choices shared by every block.
    #[config(default = "BlockSetup::fat()")]
    pub setup: BlockSetup,
}

impl UnetConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err(UnetError::InvalidConfiguration)` if the schedules are
    /// inconsistent, contain a zero width, or cannot be combined with the
    /// operator choices of `setup`.
    pub fn validate(&self) -> UnetResult<()> {
        // 1. The deepest encoder output seeds the decoder instead of being a skip
        if self.down.len() != self.up.len() + 1 {
            return Err(UnetError::InvalidConfiguration {
                reason: format!(
                    "`down` must be 1 item longer than `up`, got {} and {}",
                    self.down.len(),
                    self.up.len()
                ),
            });
        }

        // 2. Widths and kernel size
        if self.in_features == 0 {
            return Err(UnetError::InvalidConfiguration {
                reason: "`in_features` must be positive".to_string(),
            });
        }
        if self.down.iter().chain(&self.up).any(|&width| width == 0) {
            return Err(UnetError::InvalidConfiguration {
                reason: format!(
                    "Channel schedules must be positive, got down={:?} up={:?}",
                    self.down, self.up
                ),
            });
        }
        if self.size == 0 {
            return Err(UnetError::InvalidConfiguration {
                reason: "Kernel size must be positive".to_string(),
            });
        }

        // 3. Operator choices against every normalised width
        let normed_channels: Vec<usize> = self
            .down
            .iter()
            .copied()
            .chain(
                self.bottom_dims()
                    .into_iter()
                    .zip(self.horizontal_dims())
                    .map(|(bot, hor)| bot + hor),
            )
            .collect();

        self.setup.validate(self.size, &normed_channels)?;

        // 4. Some input must survive every convolution and halving
        self.min_input_extent().map(|_| ())
    }

    /// Height or width after running the network on an input of `extent`
    /// rows or columns, or `None` if some convolution or downsampling would
    /// receive an empty or too small map. Both spatial dimensions follow the
    /// same rule independently.
    fn output_extent(&self, extent: usize) -> Option<usize> {
        let pad = self.setup.conv_padding(self.size);
        let conv = |extent: usize, count: usize| {
            (0..count).try_fold(extent, |e: usize, _| {
                e.saturating_add(2 * pad)
                    .checked_sub(self.size - 1)
                    .filter(|&e| e > 0)
            })
        };
        let down_convs = kernel_convs(&self.setup.down_block);
        let up_convs = kernel_convs(&self.setup.up_block);

        let mut outputs = Vec::with_capacity(self.down.len());
        let mut e = extent;
        for i in 0..self.down.len() {
            if i > 0 {
                e = Some(e / 2).filter(|&e| e > 0)?;
            }
            e = conv(e, down_convs)?;
            outputs.push(e);
        }

        let bottom = outputs.pop()?;
        outputs
            .into_iter()
            .rev()
            .try_fold(bottom, |bot, hor| conv(bot.saturating_mul(2).min(hor), up_convs))
    }

    /// Smallest height and width the network accepts.
    ///
    /// Every stage maps larger inputs to larger (or equal) outputs, so the
    /// accepted extents form an upward-closed range and a bisection finds
    /// its lower end.
    fn min_input_extent(&self) -> UnetResult<usize> {
        let mut fits = 1_usize;
        while self.output_extent(fits).is_none() {
            fits = fits
                .checked_mul(2)
                .ok_or_else(|| UnetError::InvalidConfiguration {
                    reason: format!(
                        "No input size survives {} encoder stages with kernel size {}",
                        self.down.len(),
                        self.size
                    ),
                })?;
        }

        let mut fails = fits / 2;
        while fits - fails > 1 {
            let mid = fails + (fits - fails) / 2;
            if self.output_extent(mid).is_some() {
                fits = mid;
            } else {
                fails = mid;
            }
        }
        Ok(fits)
    }

    /// Input channels of each encoder stage: `[in_features] + down[..D-1]`.
    fn down_in_dims(&self) -> Vec<usize> {
        core::iter::once(self.in_features)
            .chain(self.down.iter().copied())
            .take(self.down.len())
            .collect()
    }

    /// Channels arriving from below at each decoder stage: `[down[D-1]] + up[..D-2]`.
    fn bottom_dims(&self) -> Vec<usize> {
        self.down
            .last()
            .into_iter()
            .chain(&self.up)
            .copied()
            .take(self.up.len())
            .collect()
    }

    /// Skip-connection channels of each decoder stage: `reverse(down[..D-1])`.
    fn horizontal_dims(&self) -> Vec<usize> {
        let shallow = self.down.len().saturating_sub(1);
        self.down[..shallow].iter().rev().copied().collect()
    }

    /// Initializes a `Unet` model with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. Nothing is built in
    /// that case.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> UnetResult<Unet<B>> {
        self.validate()?;

        let min_input_size = self.min_input_extent()?;
        let checkpointed = self.setup.checkpointed;

        let path_down: Vec<_> = self
            .down_in_dims()
            .into_iter()
            .zip(&self.down)
            .enumerate()
            .map(|(i, (d_in, &d_out))| {
                let stage = DownStageConfig::new(
                    d_in,
                    d_out,
                    self.size,
                    format!("down_{i}"),
                    self.setup.clone(),
                )
                .with_is_first(i == 0)
                .init(device);
                Checkpointed::new(stage, checkpointed)
            })
            .collect();

        let path_up: Vec<_> = self
            .bottom_dims()
            .into_iter()
            .zip(self.horizontal_dims())
            .zip(&self.up)
            .enumerate()
            .map(|(i, ((d_bot, d_hor), &d_out))| {
                let stage = UpStageConfig::new(
                    d_bot,
                    d_hor,
                    d_out,
                    self.size,
                    format!("up_{i}"),
                    self.setup.clone(),
                )
                .init(device);
                Checkpointed::new(stage, checkpointed)
            })
            .collect();

        let mut unet = Unet {
            path_down,
            path_up,
            in_features: self.in_features,
            min_input_size,
            n_params: 0,
        };
        unet.n_params = unet.num_params();

        log::info!(
            "U-Net with {} encoder and {} decoder stages, {} parameters, inputs from {}x{}{}",
            unet.path_down.len(),
            unet.path_up.len(),
            unet.n_params,
            min_input_size,
            min_input_size,
            if checkpointed { ", checkpointed" } else { "" }
        );

        Ok(unet)
    }
}

/// Convolutions with a `size x size` kernel in one block.
const fn kernel_convs(kind: &BlockKind) -> usize {
    match kind {
        BlockKind::Fat => 2,
        BlockKind::Thin => 1,
    }
}

/// A U-shaped encoder/decoder network.
#[derive(Module, Debug)]
pub struct Unet<B: Backend> {
    path_down: Vec<Checkpointed<B, DownStage<B>>>,
    path_up: Vec<Checkpointed<B, UpStage<B>>>,
    in_features: usize,
    min_input_size: usize,
    n_params: usize,
}

impl<B: Backend> Unet<B> {
    /// Runs the network.
    ///
    /// # Shapes
    /// - input: `[batch, in_features, height, width]`
    /// - output: `[batch, out_channels, height', width']`
    ///
    /// # Errors
    ///
    /// Returns `Err(UnetError::InvalidTensorShape)` if the input does not have
    /// `in_features` channels or its height or width is below
    /// [`min_input_size`](Self::min_input_size).
    pub fn forward(&self, x: Tensor<B, 4>) -> UnetResult<Tensor<B, 4>> {
        unet_forward(
            self.in_features,
            self.min_input_size,
            &self.path_down,
            &self.path_up,
            x,
        )
    }

    /// Channels of the network input.
    pub const fn in_features(&self) -> usize {
        self.in_features
    }

    /// The encoder channel schedule, read back from the built stages.
    pub fn down(&self) -> Vec<usize> {
        self.path_down.iter().map(DownBlock::out_channels).collect()
    }

    /// The decoder channel schedule, read back from the built stages.
    pub fn up(&self) -> Vec<usize> {
        self.path_up.iter().map(UpBlock::out_channels).collect()
    }

    /// Channels of the network output: the last decoder width, or the
    /// deepest encoder width for a single-stage network.
    pub fn out_channels(&self) -> usize {
        match self.path_up.last() {
            Some(block) => UpBlock::out_channels(block),
            None => self
                .path_down
                .last()
                .map_or(self.in_features, DownBlock::out_channels),
        }
    }

    /// Smallest height and width `forward` accepts.
    pub const fn min_input_size(&self) -> usize {
        self.min_input_size
    }

    /// Number of encoder stages.
    pub fn depth(&self) -> usize {
        self.path_down.len()
    }

    /// Trainable parameter count, taken when the network was built.
    pub const fn n_params(&self) -> usize {
        self.n_params
    }

    /// The encoder stages, shallow to deep.
    pub fn path_down(&self) -> &[Checkpointed<B, DownStage<B>>] {
        &self.path_down
    }

    /// The decoder stages, deep to shallow.
    pub fn path_up(&self) -> &[Checkpointed<B, UpStage<B>>] {
        &self.path_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DropoutPolicy, Norm};
    use burn::{
        backend::{ndarray::NdArray, Autodiff},
        tensor::{Distribution, ElementConversion},
    };

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    fn config(down: &[usize], up: &[usize]) -> UnetConfig {
        UnetConfig::new(down.to_vec(), up.to_vec()).with_size(3)
    }

    #[test]
    fn stage_counts_follow_schedules() {
        let device = Default::default();
        for (down, up) in [
            (vec![8], vec![]),
            (vec![4, 8], vec![4]),
            (vec![16, 32, 64], vec![32, 16]),
            (vec![4, 4, 8, 8], vec![8, 4, 2]),
        ] {
            let unet = UnetConfig::new(down.clone(), up.clone())
                .with_in_features(3)
                .with_size(3)
                .init::<TestBackend>(&device)
                .unwrap();

            assert_eq!(unet.depth(), down.len());
            assert_eq!(unet.path_down().len(), down.len());
            assert_eq!(unet.path_up().len(), up.len());
            assert_eq!(unet.down(), down);
            assert_eq!(unet.up(), up);
            assert_eq!(unet.in_features(), 3);
        }
    }

    #[test]
    fn inconsistent_schedules_are_rejected() {
        let device = Default::default();
        for (down, up) in [
            (vec![], vec![]),
            (vec![8, 16], vec![]),
            (vec![8], vec![8]),
            (vec![8, 16, 32], vec![16, 8, 4]),
        ] {
            let result = UnetConfig::new(down, up).init::<TestBackend>(&device);
            match result {
                Err(UnetError::InvalidConfiguration { reason }) => {
                    assert!(reason.contains("must be 1 item longer"));
                }
                _ => panic!("Expected InvalidConfiguration error"),
            }
        }
    }

    #[test]
    fn stage_widths_chain() {
        let cfg = config(&[16, 32, 64], &[32, 16]).with_in_features(3);

        assert_eq!(cfg.down_in_dims(), vec![3, 16, 32]);
        assert_eq!(cfg.bottom_dims(), vec![64, 32]);
        assert_eq!(cfg.horizontal_dims(), vec![32, 16]);
    }

    #[test]
    fn fat_forward_produces_last_up_width() {
        let device = Default::default();
        let unet = config(&[4, 8], &[4]).init::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 4>::zeros([2, 1, 32, 32], &device);
        let y = unet.forward(x).unwrap();

        // 32 -> 28 | 14 -> 10 | 20 -> 16
        assert_eq!(y.dims(), [2, 4, 16, 16]);
        assert_eq!(unet.out_channels(), 4);
    }

    #[test]
    fn thin_padded_forward_keeps_resolution() {
        let device = Default::default();
        let unet = UnetConfig::new(vec![16, 32, 64], vec![32, 16])
            .with_in_features(3)
            .with_size(3)
            .with_setup(BlockSetup::thin().with_padding(true))
            .init::<TestBackend>(&device)
            .unwrap();

        let x = Tensor::<TestBackend, 4>::random(
            [1, 3, 32, 32],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let y = unet.forward(x).unwrap();

        assert_eq!(y.dims(), [1, 16, 32, 32]);
    }

    #[test]
    fn single_stage_network_outputs_encoder_width() {
        let device = Default::default();
        let unet = config(&[6], &[]).init::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 4>::zeros([1, 1, 9, 9], &device);
        let y = unet.forward(x).unwrap();

        assert_eq!(y.dims(), [1, 6, 5, 5]);
        assert_eq!(unet.out_channels(), 6);
    }

    #[test]
    fn wrong_input_channels_are_rejected() {
        let device = Default::default();
        let unet = config(&[4, 8], &[4])
            .with_in_features(3)
            .init::<TestBackend>(&device)
            .unwrap();

        let x = Tensor::<TestBackend, 4>::zeros([1, 1, 32, 32], &device);
        match unet.forward(x) {
            Err(UnetError::InvalidTensorShape { expected, actual }) => {
                assert_eq!(expected, "3 feature channels in input");
                assert!(actual.starts_with("1 feature channels"));
            }
            _ => panic!("Expected InvalidTensorShape error"),
        }
    }

    #[test]
    fn inputs_below_minimum_size_are_rejected() {
        let device = Default::default();
        let unet = UnetConfig::new(vec![16, 32, 64], vec![32, 16])
            .init::<TestBackend>(&device)
            .unwrap();
        // 84 -> 76 | 38 -> 30 | 15 -> 7 | 14 -> 6 | 12 -> 4
        assert_eq!(unet.min_input_size(), 84);

        for shape in [[1, 1, 16, 16], [1, 1, 83, 83], [1, 1, 84, 40]] {
            match unet.forward(Tensor::<TestBackend, 4>::zeros(shape, &device)) {
                Err(UnetError::InvalidTensorShape { expected, actual }) => {
                    assert_eq!(expected, "height and width of at least 84");
                    assert!(actual.starts_with(&format!("{}x{}", shape[2], shape[3])));
                }
                _ => panic!("Expected InvalidTensorShape error"),
            }
        }

        let x = Tensor::<TestBackend, 4>::zeros([1, 1, 84, 84], &device);
        assert_eq!(unet.forward(x).unwrap().dims(), [1, 16, 4, 4]);
    }

    #[test]
    fn minimum_input_size_follows_blocks_and_padding() {
        let device = Default::default();

        // Valid 3x3 convolutions: 18 -> 14 | 7 -> 3 | 6 -> 2
        let fat = config(&[4, 8], &[4]).init::<TestBackend>(&device).unwrap();
        assert_eq!(fat.min_input_size(), 18);

        let single = config(&[6], &[]).init::<TestBackend>(&device).unwrap();
        assert_eq!(single.min_input_size(), 5);

        // Padding keeps every extent, only the halvings need room
        let padded = config(&[4, 8, 8], &[8, 4])
            .with_setup(BlockSetup::thin().with_padding(true))
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(padded.min_input_size(), 4);
    }

    #[test]
    fn networks_too_deep_for_any_input_are_rejected() {
        match config(&[1; 70], &[1; 69]).validate() {
            Err(UnetError::InvalidConfiguration { reason }) => {
                assert!(reason.contains("No input size survives 70 encoder stages"));
            }
            _ => panic!("Expected InvalidConfiguration error"),
        }
    }

    #[test]
    fn forward_is_deterministic() {
        let device = Default::default();
        let unet = config(&[4, 8, 8], &[8, 4])
            .with_setup(BlockSetup::fat().with_padding(true))
            .init::<TestBackend>(&device)
            .unwrap();

        let x = Tensor::<TestBackend, 4>::random(
            [2, 1, 16, 16],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let first = unet.forward(x.clone()).unwrap();
        let second = unet.forward(x).unwrap();

        first.into_data().assert_eq(&second.into_data(), true);
    }

    #[test]
    fn parameter_snapshot_counts_every_parameter() {
        let device = Default::default();

        let fat = config(&[4, 8], &[4]).init::<TestBackend>(&device).unwrap();
        // down_0 196, down_1 896, up_0 1760
        assert_eq!(fat.n_params(), 2852);
        assert_eq!(fat.n_params(), fat.num_params());

        let thin = config(&[4, 8], &[4])
            .with_setup(BlockSetup::thin())
            .init::<TestBackend>(&device)
            .unwrap();
        // down_0 22, down_1 88, up_0 176
        assert_eq!(thin.n_params(), 286);
    }

    #[test]
    fn parameter_snapshot_ignores_later_changes() {
        let device = Default::default();
        let unet = config(&[4, 8], &[4]).init::<TestBackend>(&device).unwrap();
        let snapshot = unet.n_params();

        let unet = unet.no_grad();

        assert_eq!(unet.n_params(), snapshot);
    }

    #[test]
    fn group_norm_needs_divisible_widths() {
        let device = Default::default();
        let setup = BlockSetup::fat().with_norm(Norm::Group(4));

        assert!(config(&[8, 16], &[8])
            .with_setup(setup.clone())
            .init::<TestBackend>(&device)
            .is_ok());

        // The entry stage produces 6 channels
        match config(&[6, 16], &[8]).with_setup(setup).validate() {
            Err(UnetError::InvalidConfiguration { reason }) => {
                assert!(reason.contains("4 groups"));
            }
            _ => panic!("Expected InvalidConfiguration error"),
        }
    }

    #[test]
    fn checkpointed_network_matches_direct_path_and_backpropagates() {
        let device = Default::default();
        let unet = config(&[4, 8], &[4])
            .with_setup(
                BlockSetup::fat()
                    .with_padding(true)
                    .with_dropout(DropoutPolicy::None)
                    .with_checkpointed(true),
            )
            .init::<TestAutodiffBackend>(&device)
            .unwrap();
        assert!(unet.path_down().iter().all(Checkpointed::is_enabled));
        assert!(unet.path_up().iter().all(Checkpointed::is_enabled));

        let x = Tensor::<TestAutodiffBackend, 4>::random(
            [1, 1, 16, 16],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let direct = unet.forward(x.clone()).unwrap();
        let tracked = x.require_grad();
        let recomputed = unet.forward(tracked.clone()).unwrap();

        let max_err: f32 = (recomputed.clone() - direct)
            .abs()
            .max()
            .into_scalar()
            .elem();
        assert!(max_err < 1e-5);

        let grads = recomputed.sum().backward();
        assert!(tracked.grad(&grads).is_some());
    }
}
