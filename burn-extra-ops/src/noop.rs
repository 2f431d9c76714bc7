//! No-op module implementation

use burn::prelude::*;

/// Operator that returns its input unchanged.
///
/// Used wherever a block slot is configured away: the disabled dropout policy,
/// the missing normalisation of an entry stage, or an absent normalisation
/// choice.
#[derive(Module, Clone, Debug, Default)]
pub struct NoOp {}

impl NoOp {
    /// Create new NoOp module
    pub const fn new() -> Self {
        Self {}
    }

    /// Forward pass (identity function)
    pub const fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        input
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
    fn noop_forward_input_unchanged() {
        let device = Default::default();
        let noop = NoOp::new();
        let input = Tensor::<TestBackend, 4>::random(
            [2, 3, 4, 4],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let output = noop.forward(input.clone());

        output.into_data().assert_eq(&input.into_data(), true);
    }

    #[test]
    fn noop_has_no_parameters() {
        assert_eq!(Module::<TestBackend>::num_params(&NoOp::new()), 0);
    }
}
