//! Character cursor shared by the condition, value and leaderboard parsers

/// Cursor over an ASCII definition string
pub struct Cursor<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Unconsumed input
    pub fn rest(&self) -> &'a str {
        self.source.get(self.pos..).unwrap_or("")
    }

    pub fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.bytes.get(self.pos + offset).map(|&b| b as char)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Consume `expected` if it is next
    pub fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `0x` or `0X` if it is next
    pub fn match_hex_prefix(&mut self) -> bool {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    /// Check for `0x`/`0X` at an offset without consuming it
    pub fn has_hex_prefix_at(&self, offset: usize) -> bool {
        self.peek_at(offset) == Some('0') && matches!(self.peek_at(offset + 1), Some('x') | Some('X'))
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    pub fn skip(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.bytes.len());
    }

    /// Read hex digits, clamping at `u32::MAX`. `None` if there are no digits.
    pub fn read_hex(&mut self) -> Option<u32> {
        self.read_digits(16)
    }

    /// Read decimal digits, clamping at `u32::MAX`. `None` if there are no digits.
    pub fn read_unsigned(&mut self) -> Option<u32> {
        self.read_digits(10)
    }

    /// Read an optionally signed decimal. Negative values wrap to their
    /// two's-complement representation.
    pub fn read_signed(&mut self) -> Option<u32> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.pos += 1;
                true
            }
            Some('+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        let Some(magnitude) = self.read_digits(10) else {
            self.pos = start;
            return None;
        };

        if negative {
            let magnitude = (magnitude as i64).min(1 << 31);
            Some((-magnitude) as i32 as u32)
        } else {
            Some(magnitude)
        }
    }

    /// Read a floating point number: `[+-]digits[.digits]`
    pub fn read_float(&mut self) -> Option<f64> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }

        let int_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut has_digits = self.pos > int_start;

        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
            has_digits = true;
        }

        if !has_digits {
            self.pos = start;
            return None;
        }

        match self.source[start..self.pos].parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    fn read_digits(&mut self, radix: u32) -> Option<u32> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(radix)) {
            value = (value * radix as u64 + digit as u64).min(u32::MAX as u64 + 1);
            self.pos += 1;
        }

        if self.pos == start {
            None
        } else {
            Some(value.min(u32::MAX as u64) as u32)
        }
    }
}
