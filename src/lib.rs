//! NYA Core Cheevos
//!
//! An interpreter for RetroAchievements-style condition logic. It parses
//! achievement, leaderboard and rich presence definitions and evaluates them
//! frame by frame against emulated memory supplied by the host.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nyacore_cheevos::{GamePatch, MockMemoryReader, Runtime, RuntimeConfig};
//!
//! # fn main() -> nyacore_cheevos::Result<()> {
//! let patch = GamePatch::from_json(r#"{"Achievements":[{"ID":1,"MemAddr":"0xH0000=1"}]}"#)?;
//! let mut runtime = Runtime::new(RuntimeConfig::default());
//! runtime.load_game_data(&patch);
//!
//! let ctx = runtime.context(Arc::new(MockMemoryReader::from_bytes(&[1])));
//! for event in runtime.do_frame(&ctx) {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod achievement;
pub mod conditions;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod formula;
pub mod game_data;
pub mod leaderboard;
pub mod memory;
pub mod rich_presence;
pub mod runtime;

// Re-export commonly used types
pub use achievement::Achievement;
pub use conditions::{Condition, ConditionGroup, ConditionSet, ConditionType, Operand, TestOutcome};
pub use config::{MemoryConfig, MemoryRegion, RuntimeConfig};
pub use error::{CheevosError, ParseError, ParseErrorKind, Result};
pub use events::{EventHandler, RuntimeEvent, TimedEvent};
pub use format::{format_value, ValueFormat};
pub use formula::{Clause, Formula};
pub use game_data::GamePatch;
pub use leaderboard::{Leaderboard, LeaderboardEvent, LeaderboardState};
pub use memory::{EvaluationContext, MemSize, MemoryReader, MockMemoryReader};
pub use rich_presence::RichPresenceInterpreter;
pub use runtime::Runtime;
