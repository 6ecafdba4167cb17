//! A single condition: a comparison of two operands with a hit counter

use super::operand::{Operand, OperandValue};
use super::parser::Cursor;
use super::types::{ComparisonOp, ConditionType};
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::memory::EvaluationContext;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub condition_type: ConditionType,
    pub source: Operand,
    /// `None` only for modifiers written without a comparison
    pub operator: Option<ComparisonOp>,
    pub target: Operand,
    /// Zero means "every frame the comparison holds"
    pub required_hits: u32,
    current_hits: u32,
}

impl Condition {
    pub fn new(
        condition_type: ConditionType,
        source: Operand,
        operator: ComparisonOp,
        target: Operand,
    ) -> Self {
        Self {
            condition_type,
            source,
            operator: Some(operator),
            target,
            required_hits: 0,
            current_hits: 0,
        }
    }

    pub fn with_required_hits(mut self, required_hits: u32) -> Self {
        self.required_hits = required_hits;
        self
    }

    /// Parse one condition at the cursor
    pub fn parse(cursor: &mut Cursor<'_>) -> ParseResult<Self> {
        let start = cursor.position();
        let condition_type = match (cursor.peek(), cursor.peek_at(1)) {
            (Some(c), Some(':')) => {
                let condition_type = ConditionType::from_prefix(c).ok_or_else(|| {
                    ParseError::at(
                        ParseErrorKind::InvalidConditionType,
                        format!("unknown condition type '{}'", c),
                        start,
                    )
                })?;
                cursor.skip(2);
                condition_type
            }
            _ => ConditionType::STANDARD,
        };

        let source = Operand::parse(cursor)?;

        let operator_pos = cursor.position();
        let operator = ComparisonOp::parse(cursor);
        let target = match operator {
            Some(_) => Operand::parse(cursor)?,
            None if condition_type.is_modifier() => Operand::default(),
            None => return Err(ParseError::comparison("expected comparison", operator_pos)),
        };

        let required_hits = Self::parse_hits(cursor)?;

        Ok(Self {
            condition_type,
            source,
            operator,
            target,
            required_hits,
            current_hits: 0,
        })
    }

    /// `(N)` or `.N.`
    fn parse_hits(cursor: &mut Cursor<'_>) -> ParseResult<u32> {
        let start = cursor.position();
        let close = match cursor.peek() {
            Some('(') => ')',
            Some('.') => '.',
            _ => return Ok(0),
        };
        cursor.advance();

        let hits = cursor
            .read_unsigned()
            .ok_or_else(|| ParseError::hit_count("expected hit count", start))?;
        if !cursor.match_char(close) {
            return Err(ParseError::hit_count(
                format!("expected '{}' after hit count", close),
                cursor.position(),
            ));
        }
        Ok(hits)
    }

    pub fn current_hits(&self) -> u32 {
        self.current_hits
    }

    /// Overwrite the hit counter. No cap is applied here.
    pub fn override_current_hits(&mut self, hits: u32) {
        self.current_hits = hits;
    }

    pub fn increment_hits(&mut self) {
        self.current_hits = self.current_hits.saturating_add(1);
    }

    /// Zero the hit counter, reporting whether it changed
    pub fn reset_hits(&mut self) -> bool {
        let changed = self.current_hits != 0;
        self.current_hits = 0;
        changed
    }

    /// Hit target reached
    pub fn is_complete(&self) -> bool {
        self.required_hits > 0 && self.current_hits >= self.required_hits
    }

    /// Read memory for both operands
    pub fn advance(&mut self, ctx: &EvaluationContext, offset: u32) {
        self.source.advance(ctx, offset);
        self.target.advance(ctx, offset);
    }

    /// Source value plus whatever earlier modifiers accumulated
    pub fn source_value(&self, accumulated: OperandValue) -> OperandValue {
        self.source.value() + accumulated
    }

    /// Apply the comparison to current operand values
    pub fn compare(&self, accumulated: OperandValue) -> bool {
        match self.operator {
            Some(op) => op.compare_values(self.source_value(accumulated), self.target.value()),
            None => false,
        }
    }

    /// Advance, compare and count a hit, outside of any group.
    ///
    /// Call once per frame; the delta history moves on every call.
    pub fn test(&mut self, ctx: &EvaluationContext) -> bool {
        self.advance(ctx, 0);
        let held = self.compare(OperandValue::default());
        if held && !self.is_complete() {
            self.increment_hits();
        }
        held
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.condition_type.prefix(), self.source)?;
        if let Some(op) = self.operator {
            write!(f, "{}{}", op, self.target)?;
        }
        if self.required_hits > 0 {
            write!(f, ".{}.", self.required_hits)?;
        }
        Ok(())
    }
}

impl FromStr for Condition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s);
        let condition = Condition::parse(&mut cursor)?;
        match cursor.peek() {
            None => Ok(condition),
            Some(c) => Err(ParseError::unexpected(c, cursor.position())),
        }
    }
}
