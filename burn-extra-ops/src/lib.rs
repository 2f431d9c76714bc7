//! Additional operations for the Burn deep learning framework
//!
//! This crate provides the small, parameter-free operations that U-Net style
//! encoder/decoder blocks are assembled from and that the core Burn framework
//! does not provide directly.

use burn::prelude::*;

mod crop;
mod noop;
mod resample;

// Convenient re-exports
pub use crop::{crop_window, cut_to_match};
pub use noop::NoOp;
pub use resample::{TrivialDownsample, TrivialUpsample};

/// Additional operations for Burn tensors
pub trait TensorExtraOps<B: Backend, const D: usize> {
    /// Centre-crop the trailing dimensions of the tensor to the shape of `reference`.
    ///
    /// The first `n_pref` dimensions are left untouched.
    fn cut_to_match(self, reference: &Tensor<B, D>, n_pref: usize) -> Self;
}

impl<B: Backend, const D: usize> TensorExtraOps<B, D> for Tensor<B, D> {
    fn cut_to_match(self, reference: &Tensor<B, D>, n_pref: usize) -> Self {
        cut_to_match(reference, self, n_pref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{ndarray::NdArray, Autodiff},
        tensor::Tensor,
    };

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_tensor_extra_ops() {
        let device = Default::default();
        let reference = Tensor::<TestBackend, 4>::zeros([2, 8, 6, 6], &device);
        let tensor = Tensor::<TestBackend, 4>::random(
            [2, 3, 10, 9],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        // Batch and channel dimensions survive, spatial ones follow the reference
        let cropped = tensor.cut_to_match(&reference, 2);
        assert_eq!(cropped.dims(), [2, 3, 6, 6]);
    }
}
