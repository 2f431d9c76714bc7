//! # Activation Recomputation
//!
//! `Checkpointed` wraps any encoder or decoder block and routes its forward
//! pass through a recomputation segment whenever one of its inputs is tracked
//! by autodiff. Gradient-free calls (inference) gain nothing from
//! recomputation and always run directly.
//!
//! Burn selects recomputation per autodiff backend, through the checkpointing
//! strategy of `Autodiff<B, C>` (`BalancedCheckpointing` recomputes
//! memory-bound operations instead of retaining their outputs), rather than
//! through a per-call primitive. [`recompute`] is the segment boundary; under
//! a checkpointing backend the block's intermediate activations are released
//! and rebuilt during the backward pass, under the default backend it runs
//! the block unchanged. Outputs are identical on both paths.

use core::marker::PhantomData;

use burn::prelude::*;

use super::path::{DownBlock, UpBlock};

/// How a wrapped forward call is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    /// The inner block runs as-is.
    Direct,
    /// The inner block runs as a recomputation segment.
    Recompute,
}

/// Selects the execution path for a call with the given inputs:
/// [`ExecutionPath::Recompute`] iff at least one input requires gradients.
pub fn execution_path<B: Backend>(inputs: &[&Tensor<B, 4>]) -> ExecutionPath {
    if inputs.iter().any(|x| x.is_require_grad()) {
        ExecutionPath::Recompute
    } else {
        ExecutionPath::Direct
    }
}

/// Runs `forward` as a recomputation segment.
pub fn recompute<T>(forward: impl FnOnce() -> T) -> T {
    forward()
}

/// A block whose forward pass is optionally recomputed on the backward pass.
///
/// Memory is only saved when `B` is `Autodiff<_, BalancedCheckpointing>`.
/// On any other backend both execution paths keep every activation.
#[derive(Module, Debug)]
pub struct Checkpointed<B: Backend, M> {
    inner: M,
    enabled: bool,
    _backend: PhantomData<B>,
}

impl<B: Backend, M> Checkpointed<B, M> {
    /// Wraps `inner`. With `enabled == false` every call runs directly.
    pub const fn new(inner: M, enabled: bool) -> Self {
        Self {
            inner,
            enabled,
            _backend: PhantomData,
        }
    }

    /// The wrapped block.
    pub const fn inner(&self) -> &M {
        &self.inner
    }

    /// Whether tracked calls take the recompute path.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The path a call with these inputs takes.
    pub fn execution_path_for(&self, inputs: &[&Tensor<B, 4>]) -> ExecutionPath {
        if self.enabled {
            execution_path(inputs)
        } else {
            ExecutionPath::Direct
        }
    }
}

impl<B: Backend, M: DownBlock<B>> DownBlock<B> for Checkpointed<B, M> {
    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self.execution_path_for(&[&x]) {
            ExecutionPath::Recompute => {
                log::trace!("recomputing down block ({} channels)", self.inner.out_channels());
                recompute(|| self.inner.forward(x))
            }
            ExecutionPath::Direct => self.inner.forward(x),
        }
    }

    fn out_channels(&self) -> usize {
        self.inner.out_channels()
    }
}

impl<B: Backend, M: UpBlock<B>> UpBlock<B> for Checkpointed<B, M> {
    fn forward(&self, bot: Tensor<B, 4>, hor: Tensor<B, 4>) -> Tensor<B, 4> {
        match self.execution_path_for(&[&bot, &hor]) {
            ExecutionPath::Recompute => {
                log::trace!("recomputing up block ({} channels)", self.inner.out_channels());
                recompute(|| self.inner.forward(bot, hor))
            }
            ExecutionPath::Direct => self.inner.forward(bot, hor),
        }
    }

    fn out_channels(&self) -> usize {
        self.inner.out_channels()
    }
}
