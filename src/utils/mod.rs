//! Shared helpers

pub mod common;
pub mod id_gen;

pub use common::*;
pub use id_gen::*;
