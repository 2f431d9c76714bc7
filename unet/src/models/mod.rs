//! # Model Architectures
//!
//! - `unet`: the top-level network assembly and its configuration.
//! - `path`: the block traits and the encoder/decoder threading logic.
//! - `checkpoint`: the recomputation wrapper.
//! - `modules`: fat and thin block implementations and operator selection.

pub mod checkpoint;
pub mod modules;
pub mod path;
pub mod unet;
