//! Memory access for condition evaluation
//!
//! This module provides the reader abstraction supplied by the host emulator,
//! the read sizes understood by the condition language, and the context that
//! carries both into every evaluation.

mod context;
mod size;
mod traits;

pub use context::EvaluationContext;
pub use size::MemSize;
pub use traits::{MemoryReader, MockMemoryReader};
