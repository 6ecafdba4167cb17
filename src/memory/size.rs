//! Memory read sizes and their textual prefixes

use super::EvaluationContext;

/// How many bytes an operand reads and how the raw value is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemSize {
    Bit0,
    Bit1,
    Bit2,
    Bit3,
    Bit4,
    Bit5,
    Bit6,
    Bit7,
    LowNibble,
    HighNibble,
    EightBit,
    SixteenBit,
    TwentyFourBit,
    ThirtyTwoBit,
    SixteenBitBigEndian,
    TwentyFourBitBigEndian,
    ThirtyTwoBitBigEndian,
    BitCount,
    Float,
    FloatBigEndian,
    /// Upper 32 bits of a little-endian double
    Double32,
    Double32BigEndian,
    /// Microsoft Binary Format, stored big-endian
    Mbf32,
    Mbf32LittleEndian,
}

impl MemSize {
    /// Size selected by the character after `0x`. A space selects 16-bit.
    pub fn from_prefix(c: char) -> Option<Self> {
        let size = match c.to_ascii_uppercase() {
            'M' => MemSize::Bit0,
            'N' => MemSize::Bit1,
            'O' => MemSize::Bit2,
            'P' => MemSize::Bit3,
            'Q' => MemSize::Bit4,
            'R' => MemSize::Bit5,
            'S' => MemSize::Bit6,
            'T' => MemSize::Bit7,
            'L' => MemSize::LowNibble,
            'U' => MemSize::HighNibble,
            'H' => MemSize::EightBit,
            'W' => MemSize::TwentyFourBit,
            'X' => MemSize::ThirtyTwoBit,
            'I' => MemSize::SixteenBitBigEndian,
            'J' => MemSize::TwentyFourBitBigEndian,
            'G' => MemSize::ThirtyTwoBitBigEndian,
            'K' => MemSize::BitCount,
            ' ' => MemSize::SixteenBit,
            _ => return None,
        };
        Some(size)
    }

    /// Size selected by the character after `f`
    pub fn from_float_prefix(c: char) -> Option<Self> {
        let size = match c.to_ascii_uppercase() {
            'F' => MemSize::Float,
            'B' => MemSize::FloatBigEndian,
            'H' => MemSize::Double32,
            'I' => MemSize::Double32BigEndian,
            'M' => MemSize::Mbf32,
            'L' => MemSize::Mbf32LittleEndian,
            _ => return None,
        };
        Some(size)
    }

    /// Textual prefix, including the leading `0x` or `f`
    pub fn prefix(&self) -> &'static str {
        match self {
            MemSize::Bit0 => "0xM",
            MemSize::Bit1 => "0xN",
            MemSize::Bit2 => "0xO",
            MemSize::Bit3 => "0xP",
            MemSize::Bit4 => "0xQ",
            MemSize::Bit5 => "0xR",
            MemSize::Bit6 => "0xS",
            MemSize::Bit7 => "0xT",
            MemSize::LowNibble => "0xL",
            MemSize::HighNibble => "0xU",
            MemSize::EightBit => "0xH",
            MemSize::SixteenBit => "0x ",
            MemSize::TwentyFourBit => "0xW",
            MemSize::ThirtyTwoBit => "0xX",
            MemSize::SixteenBitBigEndian => "0xI",
            MemSize::TwentyFourBitBigEndian => "0xJ",
            MemSize::ThirtyTwoBitBigEndian => "0xG",
            MemSize::BitCount => "0xK",
            MemSize::Float => "fF",
            MemSize::FloatBigEndian => "fB",
            MemSize::Double32 => "fH",
            MemSize::Double32BigEndian => "fI",
            MemSize::Mbf32 => "fM",
            MemSize::Mbf32LittleEndian => "fL",
        }
    }

    /// Number of bytes touched by a read
    pub fn byte_count(&self) -> usize {
        match self {
            MemSize::SixteenBit | MemSize::SixteenBitBigEndian => 2,
            MemSize::TwentyFourBit | MemSize::TwentyFourBitBigEndian => 3,
            MemSize::ThirtyTwoBit
            | MemSize::ThirtyTwoBitBigEndian
            | MemSize::Float
            | MemSize::FloatBigEndian
            | MemSize::Double32
            | MemSize::Double32BigEndian
            | MemSize::Mbf32
            | MemSize::Mbf32LittleEndian => 4,
            _ => 1,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            MemSize::Float
                | MemSize::FloatBigEndian
                | MemSize::Double32
                | MemSize::Double32BigEndian
                | MemSize::Mbf32
                | MemSize::Mbf32LittleEndian
        )
    }

    /// Single-bit sizes
    pub fn is_bit(&self) -> bool {
        matches!(
            self,
            MemSize::Bit0
                | MemSize::Bit1
                | MemSize::Bit2
                | MemSize::Bit3
                | MemSize::Bit4
                | MemSize::Bit5
                | MemSize::Bit6
                | MemSize::Bit7
        )
    }

    /// Largest raw value this size can produce
    pub fn max_value(&self) -> u32 {
        match self {
            s if s.is_bit() => 1,
            MemSize::LowNibble | MemSize::HighNibble => 0xF,
            MemSize::BitCount => 8,
            MemSize::EightBit => 0xFF,
            MemSize::SixteenBit | MemSize::SixteenBitBigEndian => 0xFFFF,
            MemSize::TwentyFourBit | MemSize::TwentyFourBitBigEndian => 0xFF_FFFF,
            _ => 0xFFFF_FFFF,
        }
    }

    /// Read the raw value at `address`. Float sizes return their bit pattern.
    pub fn read(&self, ctx: &EvaluationContext, address: u32) -> u32 {
        let b = ctx.read_bytes(address, self.byte_count());
        match self {
            MemSize::Bit0 => (b[0] & 1) as u32,
            MemSize::Bit1 => ((b[0] >> 1) & 1) as u32,
            MemSize::Bit2 => ((b[0] >> 2) & 1) as u32,
            MemSize::Bit3 => ((b[0] >> 3) & 1) as u32,
            MemSize::Bit4 => ((b[0] >> 4) & 1) as u32,
            MemSize::Bit5 => ((b[0] >> 5) & 1) as u32,
            MemSize::Bit6 => ((b[0] >> 6) & 1) as u32,
            MemSize::Bit7 => ((b[0] >> 7) & 1) as u32,
            MemSize::LowNibble => (b[0] & 0x0F) as u32,
            MemSize::HighNibble => (b[0] >> 4) as u32,
            MemSize::EightBit => b[0] as u32,
            MemSize::BitCount => b[0].count_ones(),
            MemSize::SixteenBit => u16::from_le_bytes([b[0], b[1]]) as u32,
            MemSize::SixteenBitBigEndian => u16::from_be_bytes([b[0], b[1]]) as u32,
            MemSize::TwentyFourBit => u32::from_le_bytes([b[0], b[1], b[2], 0]),
            MemSize::TwentyFourBitBigEndian => u32::from_be_bytes([0, b[0], b[1], b[2]]),
            MemSize::ThirtyTwoBit | MemSize::Float | MemSize::Double32 | MemSize::Mbf32LittleEndian => {
                u32::from_le_bytes([b[0], b[1], b[2], b[3]])
            }
            MemSize::ThirtyTwoBitBigEndian
            | MemSize::FloatBigEndian
            | MemSize::Double32BigEndian
            | MemSize::Mbf32 => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        }
    }

    /// Decode a raw bit pattern read with a float size
    pub fn decode_float(&self, raw: u32) -> f64 {
        match self {
            MemSize::Float | MemSize::FloatBigEndian => f32::from_bits(raw) as f64,
            MemSize::Double32 | MemSize::Double32BigEndian => f64::from_bits((raw as u64) << 32),
            MemSize::Mbf32 | MemSize::Mbf32LittleEndian => decode_mbf32(raw),
            _ => raw as f64,
        }
    }
}

/// Exponent in the top byte, sign in bit 23, 23-bit mantissa with an implied leading one
fn decode_mbf32(raw: u32) -> f64 {
    let exponent = (raw >> 24) as i32;
    if exponent == 0 {
        return 0.0;
    }

    let mantissa = ((raw & 0x7F_FFFF) | 0x80_0000) as f64;
    let value = mantissa * 2f64.powi(exponent - 152);
    if raw & 0x80_0000 != 0 {
        -value
    } else {
        value
    }
}
