//! Error types for definition parsing and runtime loading

use std::fmt;
use thiserror::Error;

/// Result type for definition parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Error produced while parsing a condition, value or leaderboard definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Byte offset into the parsed text, when known
    pub position: Option<usize>,
}

/// The kind of parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Operand could not be read (bad prefix, missing digits)
    InvalidOperand,
    /// Comparison operator missing or unknown
    InvalidComparison,
    /// Hit target not closed or not numeric
    InvalidHitCount,
    /// Unknown `X:` condition type prefix
    InvalidConditionType,
    /// Value formula clause could not be read
    InvalidValue,
    /// Leaderboard section missing or unknown
    InvalidLeaderboard,
    /// Trailing input after a complete definition
    UnexpectedCharacter,
}

impl ParseError {
    /// Create a new error without position information
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    /// Create a new error at a byte offset
    pub fn at(kind: ParseErrorKind, message: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn operand(message: impl Into<String>, position: usize) -> Self {
        Self::at(ParseErrorKind::InvalidOperand, message, position)
    }

    pub fn comparison(message: impl Into<String>, position: usize) -> Self {
        Self::at(ParseErrorKind::InvalidComparison, message, position)
    }

    pub fn hit_count(message: impl Into<String>, position: usize) -> Self {
        Self::at(ParseErrorKind::InvalidHitCount, message, position)
    }

    pub fn value(message: impl Into<String>, position: usize) -> Self {
        Self::at(ParseErrorKind::InvalidValue, message, position)
    }

    pub fn leaderboard(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidLeaderboard, message)
    }

    pub fn unexpected(found: char, position: usize) -> Self {
        Self::at(
            ParseErrorKind::UnexpectedCharacter,
            format!("unexpected character '{}'", found),
            position,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind_str = match self.kind {
            ParseErrorKind::InvalidOperand => "Invalid operand",
            ParseErrorKind::InvalidComparison => "Invalid comparison",
            ParseErrorKind::InvalidHitCount => "Invalid hit count",
            ParseErrorKind::InvalidConditionType => "Invalid condition type",
            ParseErrorKind::InvalidValue => "Invalid value",
            ParseErrorKind::InvalidLeaderboard => "Invalid leaderboard",
            ParseErrorKind::UnexpectedCharacter => "Unexpected input",
        };

        match self.position {
            Some(pos) => write!(f, "{} at offset {}: {}", kind_str, pos, self.message),
            None => write!(f, "{}: {}", kind_str, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Crate-level error for loading configuration, game data and progress
#[derive(Debug, Error)]
pub enum CheevosError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("game data error: {0}")]
    GameData(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown achievement: {0}")]
    UnknownAchievement(u32),

    #[error("unknown leaderboard: {0}")]
    UnknownLeaderboard(u32),
}

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, CheevosError>;
