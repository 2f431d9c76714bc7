//! # Centre Cropping
//!
//! Skip connections in an unpadded U-Net carry activations that are spatially
//! larger than the upsampled activations arriving from the deeper stage. This
//! module trims the larger tensor symmetrically so both can be concatenated.

use core::ops::Range;

use burn::prelude::*;

/// Computes the centred window of length `target` inside a dimension of length `len`.
///
/// When the difference is odd the extra element is dropped from the end, so the
/// window starts at `(len - target) / 2`. A `target` larger than `len` yields the
/// whole dimension.
pub fn crop_window(len: usize, target: usize) -> Range<usize> {
    if target >= len {
        return 0..len;
    }
    let start = (len - target) / 2;
    start..start + target
}

/// Centre-crops `tensor` so that every dimension after the first `n_pref` has the
/// same size as in `reference`.
///
/// Dimensions in which `tensor` is already no larger than `reference` are kept
/// as they are.
///
/// # Shapes
/// - reference: `[d_0, ..., d_{n_pref-1}, r_{n_pref}, ..., r_{D-1}]`
/// - tensor: `[t_0, ..., t_{n_pref-1}, t_{n_pref}, ..., t_{D-1}]`
/// - output: `[t_0, ..., t_{n_pref-1}, min(t, r)_{n_pref}, ..., min(t, r)_{D-1}]`
pub fn cut_to_match<B: Backend, const D: usize>(
    reference: &Tensor<B, D>,
    tensor: Tensor<B, D>,
    n_pref: usize,
) -> Tensor<B, D> {
    let target = reference.dims();
    let dims = tensor.dims();

    if dims[n_pref..]
        .iter()
        .zip(&target[n_pref..])
        .all(|(len, want)| len <= want)
    {
        return tensor;
    }

    let ranges: [Range<usize>; D] = core::array::from_fn(|i| {
        if i < n_pref {
            0..dims[i]
        } else {
            crop_window(dims[i], target[i])
        }
    });

    tensor.slice(ranges)
}
