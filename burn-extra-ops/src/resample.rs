//! # Trivial Resampling
//!
//! Parameter-free 2x resampling operators used between U-Net stages:
//!
//! - `TrivialDownsample` halves the spatial resolution by reducing every
//!   non-overlapping 2x2 window (mean or max). Odd trailing rows/columns are
//!   dropped, matching floor-mode pooling.
//! - `TrivialUpsample` doubles the spatial resolution by interpolation
//!   (nearest or bilinear).

use burn::{
    prelude::*,
    tensor::{
        module::{avg_pool2d, interpolate, max_pool2d},
        ops::{InterpolateMode, InterpolateOptions},
    },
};

/// 2x2 window reduction with stride 2.
#[derive(Module, Clone, Debug, Default)]
pub struct TrivialDownsample {
    max: bool,
}

impl TrivialDownsample {
    /// Averages each 2x2 window.
    pub const fn average() -> Self {
        Self { max: false }
    }

    /// Takes the maximum of each 2x2 window.
    pub const fn max() -> Self {
        Self { max: true }
    }

    /// # Shapes
    /// - input: `[batch, channels, height, width]`
    /// - output: `[batch, channels, height / 2, width / 2]`
    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        if self.max {
            max_pool2d(x, [2, 2], [2, 2], [0, 0], [1, 1])
        } else {
            avg_pool2d(x, [2, 2], [2, 2], [0, 0], true)
        }
    }
}

/// 2x interpolation upsampling.
#[derive(Module, Clone, Debug, Default)]
pub struct TrivialUpsample {
    bilinear: bool,
}

impl TrivialUpsample {
    /// Repeats every pixel into a 2x2 block.
    pub const fn nearest() -> Self {
        Self { bilinear: false }
    }

    /// Bilinear interpolation to twice the resolution.
    pub const fn bilinear() -> Self {
        Self { bilinear: true }
    }

    /// # Shapes
    /// - input: `[batch, channels, height, width]`
    /// - output: `[batch, channels, height * 2, width * 2]`
    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, h, w] = x.dims();
        let mode = if self.bilinear {
            InterpolateMode::Bilinear
        } else {
            InterpolateMode::Nearest
        };

        interpolate(x, [h * 2, w * 2], InterpolateOptions::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ramp(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 4> {
        Tensor::<TestBackend, 1, Int>::arange(0..16, device)
            .float()
            .reshape([1, 1, 4, 4])
    }

    #[test]
    fn average_downsample_means_each_window() {
        let device = Default::default();
        let output = TrivialDownsample::average().forward(ramp(&device));

        assert_eq!(output.dims(), [1, 1, 2, 2]);
        let values = output.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![2.5, 4.5, 10.5, 12.5]);
    }

    #[test]
    fn max_downsample_takes_window_maximum() {
        let device = Default::default();
        let output = TrivialDownsample::max().forward(ramp(&device));

        let values = output.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![5.0, 7.0, 13.0, 15.0]);
    }

    #[test]
    fn downsample_floors_odd_sizes() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([2, 3, 7, 5], &device);
        let output = TrivialDownsample::average().forward(x);

        assert_eq!(output.dims(), [2, 3, 3, 2]);

        // The trailing row and column of a 3x3 map are dropped
        let x = Tensor::<TestBackend, 1, Int>::arange(0..9, &device)
            .float()
            .reshape([1, 1, 3, 3]);
        let average = TrivialDownsample::average().forward(x.clone());
        let max = TrivialDownsample::max().forward(x);

        assert_eq!(average.into_data().to_vec::<f32>().unwrap(), vec![2.0]);
        assert_eq!(max.into_data().to_vec::<f32>().unwrap(), vec![4.0]);
    }

    #[test]
    fn nearest_upsample_doubles_resolution() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([2, 3, 5, 4], &device);
        let output = TrivialUpsample::nearest().forward(x);

        assert_eq!(output.dims(), [2, 3, 10, 8]);
        assert_eq!(output.sum().into_scalar(), 2.0 * 3.0 * 10.0 * 8.0);
    }

    #[test]
    fn bilinear_upsample_preserves_constants() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::full([1, 2, 3, 3], 0.5, &device);
        let output = TrivialUpsample::bilinear().forward(x);

        assert_eq!(output.dims(), [1, 2, 6, 6]);
        let max_err = (output - 0.5).abs().max().into_scalar();
        assert!(max_err < 1e-6);
    }
}
