//! Value formulas
//!
//! A formula is a list of clauses such as `0xH0001*100_0xH0002*0.5$0xL0003`.
//! `_` adds the next clause to the running total and `$` keeps the larger
//! of the running total and the next clause.

use crate::conditions::{Cursor, MemoryAccess, Operand};
use crate::error::{ParseError, ParseResult};
use crate::memory::{EvaluationContext, MemSize};
use std::fmt;
use std::str::FromStr;

/// How a clause combines with the running total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseOperation {
    /// First clause; seeds the total
    None,
    Addition,
    Maximum,
}

/// One term of a formula
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Memory address, or the constant itself for literals
    pub address: u32,
    pub size: MemSize,
    /// Multiply by a second memory value instead of `modifier`
    pub second: Option<(u32, MemSize)>,
    pub modifier: f64,
    /// Decode the low byte as binary-coded decimal
    pub bcd: bool,
    /// Use the complement of a single-bit second value
    pub invert_bit: bool,
    pub literal: bool,
    pub operation: ClauseOperation,
}

impl Clause {
    /// Parse `[B|V]operand[*[~]second-address|*modifier]`
    pub fn parse(cursor: &mut Cursor<'_>, operation: ClauseOperation) -> ParseResult<Self> {
        let start = cursor.position();
        let mut bcd = false;
        let mut literal = false;
        match cursor.peek() {
            Some('B') | Some('b') => {
                bcd = true;
                cursor.advance();
            }
            Some('V') | Some('v') => {
                literal = true;
                cursor.advance();
            }
            _ => {}
        }

        let (address, size) = match Operand::parse(cursor)? {
            Operand::Memory(memory) if memory.access == MemoryAccess::Address => {
                (memory.address, memory.size)
            }
            Operand::Value(value) => {
                literal = true;
                (value, MemSize::EightBit)
            }
            _ => return Err(ParseError::value("unsupported clause operand", start)),
        };

        let mut clause = Self {
            address,
            size,
            second: None,
            modifier: 1.0,
            bcd,
            invert_bit: false,
            literal,
            operation,
        };

        if cursor.match_char('*') {
            clause.invert_bit = cursor.match_char('~');
            if cursor.has_hex_prefix_at(0) {
                let modifier_pos = cursor.position();
                match Operand::parse(cursor)? {
                    Operand::Memory(memory) if memory.access == MemoryAccess::Address => {
                        clause.second = Some((memory.address, memory.size));
                    }
                    _ => return Err(ParseError::value("expected second address", modifier_pos)),
                }
            } else {
                clause.modifier = cursor
                    .read_float()
                    .ok_or_else(|| ParseError::value("expected multiplier", cursor.position()))?;
            }
        }

        Ok(clause)
    }

    pub fn value(&self, ctx: &EvaluationContext) -> f64 {
        let primary = if self.literal {
            self.address
        } else {
            let raw = ctx.read(self.address, self.size);
            if self.bcd {
                ((raw >> 4) & 0xF) * 10 + (raw & 0xF)
            } else {
                raw
            }
        };

        match self.second {
            Some((address, size)) => {
                let mut second = ctx.read(address, size);
                if self.invert_bit && size.is_bit() {
                    second ^= 1;
                }
                primary as f64 * second as f64
            }
            None => primary as f64 * self.modifier,
        }
    }
}

fn write_address(f: &mut fmt::Formatter<'_>, address: u32, size: MemSize) -> fmt::Result {
    if address >= 0x10000 {
        write!(f, "{}{:06x}", size.prefix(), address)
    } else {
        write!(f, "{}{:04x}", size.prefix(), address)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.literal {
            write!(f, "V{}", self.address as i32)?;
        } else {
            if self.bcd {
                f.write_str("B")?;
            }
            write_address(f, self.address, self.size)?;
        }

        if let Some((address, size)) = self.second {
            f.write_str("*")?;
            if self.invert_bit {
                f.write_str("~")?;
            }
            write_address(f, address, size)?;
        } else if self.modifier != 1.0 {
            write!(f, "*{}", self.modifier)?;
        }
        Ok(())
    }
}

/// An ordered list of clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl Formula {
    /// Parse clauses joined by `_` or `$`
    pub fn parse(cursor: &mut Cursor<'_>) -> ParseResult<Self> {
        while matches!(cursor.peek(), Some(' ') | Some('_') | Some('|') | Some('$')) {
            cursor.advance();
        }

        let mut clauses = Vec::new();
        let mut operation = ClauseOperation::None;
        loop {
            clauses.push(Clause::parse(cursor, operation)?);
            operation = if cursor.match_char('_') {
                ClauseOperation::Addition
            } else if cursor.match_char('$') {
                ClauseOperation::Maximum
            } else {
                break;
            };
        }

        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluate left to right. The total wraps into 32 bits.
    pub fn value(&self, ctx: &EvaluationContext) -> u32 {
        let mut total = 0.0f64;
        for clause in &self.clauses {
            let next = clause.value(ctx);
            total = match clause.operation {
                ClauseOperation::Maximum => total.max(next),
                _ => total + next,
            };
        }
        total as i64 as u32
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            match clause.operation {
                ClauseOperation::None => {}
                ClauseOperation::Addition => f.write_str("_")?,
                ClauseOperation::Maximum => f.write_str("$")?,
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s);
        let formula = Formula::parse(&mut cursor)?;
        match cursor.peek() {
            None => Ok(formula),
            Some(c) => Err(ParseError::unexpected(c, cursor.position())),
        }
    }
}
