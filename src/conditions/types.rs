//! Condition type and comparison definitions

use super::parser::Cursor;
use super::OperandValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators for conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Compare two values using this operator
    pub fn compare<T: PartialOrd>(&self, a: &T, b: &T) -> bool {
        match self {
            ComparisonOp::Equal => a == b,
            ComparisonOp::NotEqual => a != b,
            ComparisonOp::LessThan => a < b,
            ComparisonOp::LessThanOrEqual => a <= b,
            ComparisonOp::GreaterThan => a > b,
            ComparisonOp::GreaterThanOrEqual => a >= b,
        }
    }

    /// Compare operand values. Two integers compare unsigned, anything
    /// involving a float compares as f64.
    pub fn compare_values(&self, a: OperandValue, b: OperandValue) -> bool {
        match (a, b) {
            (OperandValue::Integer(x), OperandValue::Integer(y)) => self.compare(&x, &y),
            _ => self.compare(&a.as_f64(), &b.as_f64()),
        }
    }

    /// Consume an operator if one is next
    pub(crate) fn parse(cursor: &mut Cursor<'_>) -> Option<Self> {
        let op = match (cursor.peek()?, cursor.peek_at(1)) {
            ('=', Some('=')) => (ComparisonOp::Equal, 2),
            ('=', _) => (ComparisonOp::Equal, 1),
            ('!', Some('=')) => (ComparisonOp::NotEqual, 2),
            ('<', Some('=')) => (ComparisonOp::LessThanOrEqual, 2),
            ('<', _) => (ComparisonOp::LessThan, 1),
            ('>', Some('=')) => (ComparisonOp::GreaterThanOrEqual, 2),
            ('>', _) => (ComparisonOp::GreaterThan, 1),
            _ => return None,
        };
        cursor.skip(op.1);
        Some(op.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions that produce a truth value the group ANDs together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKind {
    Standard,
    /// Excluded from the primed check
    Trigger,
    Measured,
    MeasuredPercent,
    /// Zeroes measured progress while false
    MeasuredIf,
}

/// Conditions that alter the next condition's operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKind {
    AddSource,
    SubSource,
    AddAddress,
}

/// Conditions whose hit counts add to the next condition's hit count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAccumulatorKind {
    AddHits,
    SubHits,
}

/// Conditions whose truth feeds into the next condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinerKind {
    AndNext,
    OrNext,
    ResetNextIf,
}

/// Conditions that control the group instead of contributing to its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    PauseIf,
    ResetIf,
}

/// Role of a condition within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    Comparison(ComparisonKind),
    Modifier(ModifierKind),
    HitAccumulator(HitAccumulatorKind),
    Combiner(CombinerKind),
    Flag(FlagKind),
}

impl Default for ConditionType {
    fn default() -> Self {
        ConditionType::STANDARD
    }
}

impl ConditionType {
    pub const STANDARD: ConditionType = ConditionType::Comparison(ComparisonKind::Standard);
    pub const PAUSE_IF: ConditionType = ConditionType::Flag(FlagKind::PauseIf);
    pub const RESET_IF: ConditionType = ConditionType::Flag(FlagKind::ResetIf);
    pub const ADD_SOURCE: ConditionType = ConditionType::Modifier(ModifierKind::AddSource);
    pub const SUB_SOURCE: ConditionType = ConditionType::Modifier(ModifierKind::SubSource);
    pub const ADD_ADDRESS: ConditionType = ConditionType::Modifier(ModifierKind::AddAddress);
    pub const ADD_HITS: ConditionType = ConditionType::HitAccumulator(HitAccumulatorKind::AddHits);

    /// Type named by the letter before `:`
    pub fn from_prefix(c: char) -> Option<Self> {
        let condition_type = match c.to_ascii_uppercase() {
            'P' => ConditionType::Flag(FlagKind::PauseIf),
            'R' => ConditionType::Flag(FlagKind::ResetIf),
            'A' => ConditionType::Modifier(ModifierKind::AddSource),
            'B' => ConditionType::Modifier(ModifierKind::SubSource),
            'I' => ConditionType::Modifier(ModifierKind::AddAddress),
            'C' => ConditionType::HitAccumulator(HitAccumulatorKind::AddHits),
            'D' => ConditionType::HitAccumulator(HitAccumulatorKind::SubHits),
            'N' => ConditionType::Combiner(CombinerKind::AndNext),
            'O' => ConditionType::Combiner(CombinerKind::OrNext),
            'Z' => ConditionType::Combiner(CombinerKind::ResetNextIf),
            'T' => ConditionType::Comparison(ComparisonKind::Trigger),
            'M' => ConditionType::Comparison(ComparisonKind::Measured),
            'G' => ConditionType::Comparison(ComparisonKind::MeasuredPercent),
            'Q' => ConditionType::Comparison(ComparisonKind::MeasuredIf),
            _ => return None,
        };
        Some(condition_type)
    }

    /// Serialized prefix, empty for standard conditions
    pub fn prefix(&self) -> &'static str {
        match self {
            ConditionType::Comparison(ComparisonKind::Standard) => "",
            ConditionType::Comparison(ComparisonKind::Trigger) => "T:",
            ConditionType::Comparison(ComparisonKind::Measured) => "M:",
            ConditionType::Comparison(ComparisonKind::MeasuredPercent) => "G:",
            ConditionType::Comparison(ComparisonKind::MeasuredIf) => "Q:",
            ConditionType::Modifier(ModifierKind::AddSource) => "A:",
            ConditionType::Modifier(ModifierKind::SubSource) => "B:",
            ConditionType::Modifier(ModifierKind::AddAddress) => "I:",
            ConditionType::HitAccumulator(HitAccumulatorKind::AddHits) => "C:",
            ConditionType::HitAccumulator(HitAccumulatorKind::SubHits) => "D:",
            ConditionType::Combiner(CombinerKind::AndNext) => "N:",
            ConditionType::Combiner(CombinerKind::OrNext) => "O:",
            ConditionType::Combiner(CombinerKind::ResetNextIf) => "Z:",
            ConditionType::Flag(FlagKind::PauseIf) => "P:",
            ConditionType::Flag(FlagKind::ResetIf) => "R:",
        }
    }

    /// Modifiers may omit the comparison
    pub fn is_modifier(&self) -> bool {
        matches!(self, ConditionType::Modifier(_))
    }

    /// Conditions that end a chain
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConditionType::Comparison(_) | ConditionType::Flag(_))
    }

    pub fn is_measured(&self) -> bool {
        matches!(
            self,
            ConditionType::Comparison(ComparisonKind::Measured)
                | ConditionType::Comparison(ComparisonKind::MeasuredPercent)
        )
    }
}
