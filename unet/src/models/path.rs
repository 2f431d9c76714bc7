//! # Encoder and Decoder Paths
//!
//! The block capabilities the network is assembled from and the logic that
//! threads activations down the encoder and back up the decoder.
//!
//! The encoder pass produces the deepest activation `e_{D-1}`, which seeds the
//! decoder, and the input of every stage, `[input, e_0, ..., e_{D-2}]`. The
//! stage outputs among those are replayed deep-to-shallow as skip
//! connections, `[e_{D-2}, ..., e_0]`, so decoder stage `i` receives
//! `e_{D-2-i}`. The raw input is never a skip.

use burn::prelude::*;

use crate::error::{UnetError, UnetResult};

/// An encoder stage.
pub trait DownBlock<B: Backend> {
    /// # Shapes
    /// - input: `[batch, in_channels, height, width]`
    /// - output: `[batch, out_channels, height', width']`
    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4>;

    /// Channel count of every activation this block produces.
    fn out_channels(&self) -> usize;
}

/// A decoder stage merging the activation from below with a skip connection.
pub trait UpBlock<B: Backend> {
    /// # Shapes
    /// - bot: `[batch, bottom_channels, height, width]`
    /// - hor: `[batch, horizontal_channels, height_skip, width_skip]`
    /// - output: `[batch, out_channels, height', width']`
    fn forward(&self, bot: Tensor<B, 4>, hor: Tensor<B, 4>) -> Tensor<B, 4>;

    /// Channel count of every activation this block produces.
    fn out_channels(&self) -> usize;
}

/// Runs the encoder path.
///
/// Returns the deepest activation together with the input of every stage,
/// shallow to deep: `[input, e_0, ..., e_{D-2}]`.
pub fn encode<B: Backend, D: DownBlock<B>>(
    path: &[D],
    input: Tensor<B, 4>,
) -> (Tensor<B, 4>, Vec<Tensor<B, 4>>) {
    let mut stage_inputs = Vec::with_capacity(path.len());
    let mut x = input;
    for block in path {
        stage_inputs.push(x.clone());
        x = block.forward(x);
    }
    (x, stage_inputs)
}

/// Turns the stage inputs of the encoder into the skip connections, ordered
/// deep-to-shallow. The raw input is dropped.
pub fn skip_connections<T>(stage_inputs: Vec<T>) -> Vec<T> {
    stage_inputs.into_iter().skip(1).rev().collect()
}

/// Runs the decoder path. Stage `i` consumes the running activation and
/// `skips[i]`.
pub fn decode<B: Backend, U: UpBlock<B>>(
    path: &[U],
    bottom: Tensor<B, 4>,
    skips: Vec<Tensor<B, 4>>,
) -> Tensor<B, 4> {
    path.iter()
        .zip(skips)
        .fold(bottom, |bot, (block, hor)| block.forward(bot, hor))
}

/// Checks the channel dimension of a network input.
///
/// # Errors
///
/// Returns `Err(UnetError::InvalidTensorShape)` on a mismatch.
pub fn check_input_channels<B: Backend>(expected: usize, x: &Tensor<B, 4>) -> UnetResult<()> {
    let dims = x.dims();
    if dims[1] != expected {
        return Err(UnetError::InvalidTensorShape {
            expected: format!("{expected} feature channels in input"),
            actual: format!("{} feature channels (shape {dims:?})", dims[1]),
        });
    }
    Ok(())
}

/// Checks that both spatial dimensions of a network input reach `min_extent`.
///
/// # Errors
///
/// Returns `Err(UnetError::InvalidTensorShape)` if the height or the width is
/// smaller.
pub fn check_input_extent<B: Backend>(min_extent: usize, x: &Tensor<B, 4>) -> UnetResult<()> {
    let dims = x.dims();
    let [_, _, height, width] = dims;
    if height < min_extent || width < min_extent {
        return Err(UnetError::InvalidTensorShape {
            expected: format!("height and width of at least {min_extent}"),
            actual: format!("{height}x{width} (shape {dims:?})"),
        });
    }
    Ok(())
}

/// The full U-shaped pass: input checks, encoder, skip replay, decoder.
///
/// # Errors
///
/// Returns `Err(UnetError::InvalidTensorShape)` if the input does not have
/// `in_features` channels or is smaller than `min_extent` in height or width.
/// No stage runs in that case.
pub fn unet_forward<B: Backend, D: DownBlock<B>, U: UpBlock<B>>(
    in_features: usize,
    min_extent: usize,
    path_down: &[D],
    path_up: &[U],
    x: Tensor<B, 4>,
) -> UnetResult<Tensor<B, 4>> {
    check_input_channels(in_features, &x)?;
    check_input_extent(min_extent, &x)?;

    let (bottom, stage_inputs) = encode(path_down, x);
    let skips = skip_connections(stage_inputs);

    Ok(decode(path_up, bottom, skips))
}
