//! Condition operands
//!
//! An operand is either a memory reference or a constant. Memory references
//! keep a small history (current, previous and prior values) that is advanced
//! once per frame by [`Operand::advance`]; reading the value afterwards has no
//! side effects.

use super::parser::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::memory::{EvaluationContext, MemSize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A resolved operand value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandValue {
    Integer(u32),
    Float(f64),
}

impl Default for OperandValue {
    fn default() -> Self {
        OperandValue::Integer(0)
    }
}

impl OperandValue {
    pub fn as_f64(self) -> f64 {
        match self {
            OperandValue::Integer(v) => v as f64,
            OperandValue::Float(v) => v,
        }
    }

    /// Truncate to 32 bits. Negative floats wrap.
    pub fn as_u32(self) -> u32 {
        match self {
            OperandValue::Integer(v) => v,
            OperandValue::Float(v) => v as i64 as u32,
        }
    }
}

impl Add for OperandValue {
    type Output = OperandValue;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (OperandValue::Integer(a), OperandValue::Integer(b)) => {
                OperandValue::Integer(a.wrapping_add(b))
            }
            (a, b) => OperandValue::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl Sub for OperandValue {
    type Output = OperandValue;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (OperandValue::Integer(a), OperandValue::Integer(b)) => {
                OperandValue::Integer(a.wrapping_sub(b))
            }
            (a, b) => OperandValue::Float(a.as_f64() - b.as_f64()),
        }
    }
}

/// Which remembered value a memory operand reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAccess {
    /// Value read this frame
    Address,
    /// Value read on the previous frame
    Delta,
    /// Last value that differed from the current one
    Prior,
    /// Current value decoded as binary-coded decimal
    Bcd,
    /// Current value with its bits flipped within the read size
    Inverted,
}

impl MemoryAccess {
    fn prefix(&self) -> &'static str {
        match self {
            MemoryAccess::Address => "",
            MemoryAccess::Delta => "d",
            MemoryAccess::Prior => "p",
            MemoryAccess::Bcd => "b",
            MemoryAccess::Inverted => "~",
        }
    }
}

/// Raw values seen by a memory operand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryHistory {
    pub current: u32,
    pub previous: u32,
    pub prior: u32,
}

impl MemoryHistory {
    /// Record a new raw reading
    pub fn update(&mut self, raw: u32) {
        self.previous = self.current;
        if raw != self.current {
            self.prior = self.current;
        }
        self.current = raw;
    }
}

/// A memory reference with its history
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryOperand {
    pub access: MemoryAccess,
    pub size: MemSize,
    pub address: u32,
    pub history: MemoryHistory,
}

impl MemoryOperand {
    pub fn new(access: MemoryAccess, size: MemSize, address: u32) -> Self {
        Self {
            access,
            size,
            address,
            history: MemoryHistory::default(),
        }
    }

    fn decode(&self, raw: u32) -> OperandValue {
        if self.size.is_float() {
            OperandValue::Float(self.size.decode_float(raw))
        } else {
            OperandValue::Integer(raw)
        }
    }

    pub fn value(&self) -> OperandValue {
        let current = self.history.current;
        match self.access {
            MemoryAccess::Address => self.decode(current),
            MemoryAccess::Delta => self.decode(self.history.previous),
            MemoryAccess::Prior => self.decode(self.history.prior),
            MemoryAccess::Bcd if !self.size.is_float() => {
                OperandValue::Integer(decode_bcd(current, self.size.byte_count() * 2))
            }
            MemoryAccess::Inverted if !self.size.is_float() => {
                let max = self.size.max_value();
                OperandValue::Integer(max - current.min(max))
            }
            _ => self.decode(current),
        }
    }
}

fn decode_bcd(raw: u32, digits: usize) -> u32 {
    let mut result: u32 = 0;
    let mut multiplier: u32 = 1;
    for i in 0..digits {
        let digit = (raw >> (i * 4)) & 0xF;
        result = result.wrapping_add(digit.wrapping_mul(multiplier));
        multiplier = multiplier.wrapping_mul(10);
    }
    result
}

/// A typed value source
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Memory(MemoryOperand),
    Value(u32),
    Float(f64),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Value(0)
    }
}

impl Operand {
    /// Create a plain memory reference
    pub fn address(size: MemSize, address: u32) -> Self {
        Operand::Memory(MemoryOperand::new(MemoryAccess::Address, size, address))
    }

    /// Create a delta memory reference
    pub fn delta(size: MemSize, address: u32) -> Self {
        Operand::Memory(MemoryOperand::new(MemoryAccess::Delta, size, address))
    }

    /// Parse one operand at the cursor
    pub fn parse(cursor: &mut Cursor<'_>) -> ParseResult<Self> {
        let start = cursor.position();
        match cursor.peek() {
            Some('d') | Some('D')
                if cursor.has_hex_prefix_at(1)
                    || matches!(cursor.peek_at(1), Some('f') | Some('F')) =>
            {
                cursor.advance();
                Self::parse_memory(cursor, MemoryAccess::Delta)
            }
            Some('p') | Some('P') => {
                cursor.advance();
                Self::parse_memory(cursor, MemoryAccess::Prior)
            }
            Some('b') | Some('B') => {
                cursor.advance();
                Self::parse_memory(cursor, MemoryAccess::Bcd)
            }
            Some('~') => {
                cursor.advance();
                Self::parse_memory(cursor, MemoryAccess::Inverted)
            }
            Some('0') if cursor.has_hex_prefix_at(0) => {
                Self::parse_memory(cursor, MemoryAccess::Address)
            }
            Some('f') | Some('F') => {
                cursor.advance();
                if cursor.peek().and_then(MemSize::from_float_prefix).is_some() {
                    Self::parse_float_memory(cursor, MemoryAccess::Address, start)
                } else {
                    cursor
                        .read_float()
                        .map(Operand::Float)
                        .ok_or_else(|| ParseError::operand("expected float value", start))
                }
            }
            Some('h') | Some('H') => {
                cursor.advance();
                cursor.match_hex_prefix();
                cursor
                    .read_hex()
                    .map(Operand::Value)
                    .ok_or_else(|| ParseError::operand("expected hex value", start))
            }
            Some('-') | Some('+') => cursor
                .read_signed()
                .map(Operand::Value)
                .ok_or_else(|| ParseError::operand("expected value", start)),
            Some(c) if c.is_ascii_digit() => cursor
                .read_unsigned()
                .map(Operand::Value)
                .ok_or_else(|| ParseError::operand("expected value", start)),
            _ => Err(ParseError::operand("expected operand", start)),
        }
    }

    /// Memory reference after any access prefix: `0x` size hex-address, or a float size
    fn parse_memory(cursor: &mut Cursor<'_>, access: MemoryAccess) -> ParseResult<Self> {
        let start = cursor.position();
        if matches!(cursor.peek(), Some('f') | Some('F')) {
            cursor.advance();
            if cursor.peek().and_then(MemSize::from_float_prefix).is_some() {
                return Self::parse_float_memory(cursor, access, start);
            }
            return Err(ParseError::operand("expected float size", start));
        }

        if !cursor.match_hex_prefix() {
            return Err(ParseError::operand("expected '0x'", start));
        }

        let size = match cursor.peek().and_then(MemSize::from_prefix) {
            Some(size) => {
                cursor.advance();
                size
            }
            None => MemSize::SixteenBit,
        };

        let address = Self::parse_address(cursor, start)?;
        Ok(Operand::Memory(MemoryOperand::new(access, size, address)))
    }

    fn parse_float_memory(
        cursor: &mut Cursor<'_>,
        access: MemoryAccess,
        start: usize,
    ) -> ParseResult<Self> {
        let size = cursor
            .advance()
            .and_then(MemSize::from_float_prefix)
            .ok_or_else(|| ParseError::operand("expected float size", start))?;
        let address = Self::parse_address(cursor, start)?;
        Ok(Operand::Memory(MemoryOperand::new(access, size, address)))
    }

    fn parse_address(cursor: &mut Cursor<'_>, start: usize) -> ParseResult<u32> {
        cursor.match_hex_prefix();
        cursor
            .read_hex()
            .ok_or_else(|| ParseError::operand("expected address", start))
    }

    /// Read memory for this frame. `offset` comes from a preceding AddAddress.
    pub fn advance(&mut self, ctx: &EvaluationContext, offset: u32) {
        if let Operand::Memory(memory) = self {
            let raw = memory.size.read(ctx, memory.address.wrapping_add(offset));
            memory.history.update(raw);
        }
    }

    /// Value as of the last `advance`
    pub fn value(&self) -> OperandValue {
        match self {
            Operand::Memory(memory) => memory.value(),
            Operand::Value(v) => OperandValue::Integer(*v),
            Operand::Float(v) => OperandValue::Float(*v),
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory(_))
    }

    pub fn size(&self) -> Option<MemSize> {
        match self {
            Operand::Memory(memory) => Some(memory.size),
            _ => None,
        }
    }

    /// Raw current and previous values, as stored in progress strings
    pub fn state_values(&self) -> (u32, u32) {
        match self {
            Operand::Memory(memory) => (memory.history.current, memory.history.previous),
            Operand::Value(v) => (*v, *v),
            Operand::Float(v) => {
                let raw = v.to_bits() as u32;
                (raw, raw)
            }
        }
    }

    /// Restore history from a progress string
    pub fn restore_state(&mut self, current: u32, previous: u32) {
        if let Operand::Memory(memory) = self {
            memory.history = MemoryHistory {
                current,
                previous,
                prior: previous,
            };
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Memory(memory) => {
                write!(f, "{}{}", memory.access.prefix(), memory.size.prefix())?;
                if memory.address >= 0x10000 {
                    write!(f, "{:06x}", memory.address)
                } else {
                    write!(f, "{:04x}", memory.address)
                }
            }
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Float(v) => write!(f, "f{}", v),
        }
    }
}

impl FromStr for Operand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s);
        let operand = Operand::parse(&mut cursor)?;
        match cursor.peek() {
            None => Ok(operand),
            Some(c) => Err(ParseError::unexpected(c, cursor.position())),
        }
    }
}
