//! Condition language
//!
//! Parsing, serialization and per-frame evaluation of condition strings such as
//! `0xH0001=18_P:0xH0002=52.1.S0xL0004=6`:
//!
//! - [`Operand`]: memory reference or constant
//! - [`Condition`]: comparison with a type prefix and a hit target
//! - [`ConditionGroup`]: `_`-joined conditions, evaluated as an AND
//! - [`ConditionSet`]: a core group plus `S`-separated alternates

mod condition;
mod group;
mod operand;
mod parser;
mod set;
mod types;

pub use condition::Condition;
pub use group::{ConditionGroup, MeasuredProgress};
pub use operand::{MemoryAccess, MemoryHistory, MemoryOperand, Operand, OperandValue};
pub use parser::Cursor;
pub use set::{ConditionSet, TestOutcome};
pub use types::{
    CombinerKind, ComparisonKind, ComparisonOp, ConditionType, FlagKind, HitAccumulatorKind,
    ModifierKind,
};
