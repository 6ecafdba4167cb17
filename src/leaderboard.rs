//! Leaderboards
//!
//! A leaderboard definition is a `::`-separated list of tagged sections:
//! `STA:` start, `CAN:` cancel and `SUB:` submit condition sets, a `VAL:`
//! formula for the submitted score and an optional `PRO:` formula shown while
//! the attempt runs. `FOR:`, `TTL:` and `DES:` carry legacy metadata.

use crate::conditions::{ConditionSet, Cursor};
use crate::error::{ParseError, ParseResult};
use crate::format::ValueFormat;
use crate::formula::Formula;
use crate::memory::EvaluationContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parsed leaderboard definition
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardDefinition {
    pub start: ConditionSet,
    pub cancel: ConditionSet,
    pub submit: ConditionSet,
    pub value: Formula,
    pub progress: Option<Formula>,
    /// Legacy `FOR:` section
    pub format: Option<ValueFormat>,
    /// Legacy `TTL:` section
    pub title: Option<String>,
    /// Legacy `DES:` section
    pub description: Option<String>,
}

impl LeaderboardDefinition {
    fn parse_set(cursor: &mut Cursor<'_>) -> ParseResult<ConditionSet> {
        let set = ConditionSet::parse(cursor)?;
        Self::expect_section_end(cursor)?;
        Ok(set)
    }

    fn parse_formula(cursor: &mut Cursor<'_>) -> ParseResult<Formula> {
        let formula = Formula::parse(cursor)?;
        Self::expect_section_end(cursor)?;
        Ok(formula)
    }

    fn expect_section_end(cursor: &Cursor<'_>) -> ParseResult<()> {
        if cursor.is_at_end() || cursor.starts_with("::") {
            Ok(())
        } else {
            match cursor.peek() {
                Some(c) => Err(ParseError::unexpected(c, cursor.position())),
                None => Ok(()),
            }
        }
    }

    /// Free text up to the next `::`
    fn read_text(cursor: &mut Cursor<'_>) -> String {
        let rest = cursor.rest();
        let len = rest.find("::").unwrap_or(rest.len());
        cursor.skip(len);
        rest[..len].to_string()
    }
}

impl FromStr for LeaderboardDefinition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s.trim_end_matches(|c| c == '\r' || c == '\n'));
        let mut start = None;
        let mut cancel = None;
        let mut submit = None;
        let mut value = None;
        let mut progress = None;
        let mut format = None;
        let mut title = None;
        let mut description = None;

        loop {
            let tag = cursor.rest().get(..4).unwrap_or(cursor.rest()).to_string();
            let tag_pos = cursor.position();
            cursor.skip(4);
            match tag.to_ascii_uppercase().as_str() {
                "STA:" => start = Some(Self::parse_set(&mut cursor)?),
                "CAN:" => cancel = Some(Self::parse_set(&mut cursor)?),
                "SUB:" => submit = Some(Self::parse_set(&mut cursor)?),
                "VAL:" => value = Some(Self::parse_formula(&mut cursor)?),
                "PRO:" => progress = Some(Self::parse_formula(&mut cursor)?),
                "FOR:" => format = Some(ValueFormat::from_name(&Self::read_text(&mut cursor))),
                "TTL:" => title = Some(Self::read_text(&mut cursor)),
                "DES:" => description = Some(Self::read_text(&mut cursor)),
                _ => {
                    return Err(ParseError::leaderboard(format!(
                        "unknown section '{}' at offset {}",
                        tag, tag_pos
                    )))
                }
            }

            cursor.skip(2);
            if cursor.is_at_end() {
                break;
            }
        }

        let missing = |name: &str| ParseError::leaderboard(format!("missing {} section", name));
        Ok(Self {
            start: start.ok_or_else(|| missing("STA"))?,
            cancel: cancel.ok_or_else(|| missing("CAN"))?,
            submit: submit.ok_or_else(|| missing("SUB"))?,
            value: value.ok_or_else(|| missing("VAL"))?,
            progress,
            format,
            title,
            description,
        })
    }
}

impl fmt::Display for LeaderboardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STA:{}::CAN:{}::SUB:{}",
            self.start, self.cancel, self.submit
        )?;
        if let Some(progress) = &self.progress {
            write!(f, "::PRO:{}", progress)?;
        }
        write!(f, "::VAL:{}", self.value)?;
        if let Some(format) = self.format {
            write!(f, "::FOR:{}", format)?;
        }
        if let Some(title) = &self.title {
            write!(f, "::TTL:{}", title)?;
        }
        if let Some(description) = &self.description {
            write!(f, "::DES:{}", description)?;
        }
        Ok(())
    }
}

/// Where a leaderboard is in its attempt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaderboardState {
    /// Armed; waiting for the start conditions
    #[default]
    Waiting,
    /// An attempt is running
    Active,
    /// Finished an attempt; re-arms once the start conditions go false
    Disarmed,
    /// Definition failed to parse; never starts
    Invalid,
}

/// Transition reported by [`Leaderboard::test`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardEvent {
    Started,
    Canceled,
    Submitted(u32),
}

/// One row of a leaderboard's ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    pub rank: u32,
    pub username: String,
    pub score: i32,
    /// Unix timestamp of the entry
    pub achieved: i64,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    id: u32,
    pub title: String,
    pub description: String,
    format: ValueFormat,
    definition: Option<LeaderboardDefinition>,
    state: LeaderboardState,
    rank_info: Vec<RankInfo>,
}

impl Leaderboard {
    /// Create a leaderboard from its definition string.
    ///
    /// A definition that does not parse is logged and leaves the
    /// leaderboard in the `Invalid` state.
    pub fn new(id: u32, definition: &str, format: ValueFormat) -> Self {
        let (definition, state) = match definition.parse::<LeaderboardDefinition>() {
            Ok(parsed) => (Some(parsed), LeaderboardState::Waiting),
            Err(e) => {
                log::warn!("Leaderboard {}: invalid definition: {}", id, e);
                (None, LeaderboardState::Invalid)
            }
        };

        let mut leaderboard = Self {
            id,
            title: String::new(),
            description: String::new(),
            format,
            definition,
            state,
            rank_info: Vec::new(),
        };

        if let Some(def) = &leaderboard.definition {
            if let Some(format) = def.format {
                leaderboard.format = format;
            }
            if let Some(title) = &def.title {
                leaderboard.title = title.clone();
            }
            if let Some(description) = &def.description {
                leaderboard.description = description.clone();
            }
        }

        leaderboard
    }

    pub fn with_title(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.title = title.into();
        self.description = description.into();
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn format(&self) -> ValueFormat {
        self.format
    }

    pub fn state(&self) -> LeaderboardState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LeaderboardState::Active
    }

    pub fn is_valid(&self) -> bool {
        self.definition.is_some()
    }

    pub fn definition(&self) -> Option<&LeaderboardDefinition> {
        self.definition.as_ref()
    }

    /// Evaluate one frame.
    ///
    /// All three condition sets are tested every frame so their delta
    /// history stays current whatever the state.
    pub fn test(&mut self, ctx: &EvaluationContext) -> Option<LeaderboardEvent> {
        let def = self.definition.as_mut()?;
        let start = def.start.test(ctx).result;
        let cancel = def.cancel.test(ctx).result;
        let submit = def.submit.test(ctx).result;

        let event = match self.state {
            LeaderboardState::Waiting if start && !cancel => {
                if submit {
                    self.state = LeaderboardState::Disarmed;
                    Some(LeaderboardEvent::Submitted(def.value.value(ctx)))
                } else {
                    self.state = LeaderboardState::Active;
                    Some(LeaderboardEvent::Started)
                }
            }
            LeaderboardState::Active if cancel => {
                self.state = LeaderboardState::Disarmed;
                Some(LeaderboardEvent::Canceled)
            }
            LeaderboardState::Active if submit => {
                self.state = LeaderboardState::Disarmed;
                Some(LeaderboardEvent::Submitted(def.value.value(ctx)))
            }
            LeaderboardState::Disarmed if !start => {
                self.state = LeaderboardState::Waiting;
                None
            }
            _ => None,
        };

        match event {
            Some(LeaderboardEvent::Started) => log::info!("Leaderboard {} started", self.id),
            Some(LeaderboardEvent::Canceled) => log::info!("Leaderboard {} canceled", self.id),
            Some(LeaderboardEvent::Submitted(value)) => {
                log::info!("Leaderboard {} submitted {}", self.id, value)
            }
            None => {}
        }

        event
    }

    /// Zero every hit count and re-arm
    pub fn reset(&mut self) {
        if let Some(def) = self.definition.as_mut() {
            def.start.reset();
            def.cancel.reset();
            def.submit.reset();
            self.state = LeaderboardState::Waiting;
        }
    }

    /// Value to display during an attempt: the progress formula if there is
    /// one, the score formula otherwise
    pub fn current_value(&self, ctx: &EvaluationContext) -> u32 {
        match &self.definition {
            Some(def) => def.progress.as_ref().unwrap_or(&def.value).value(ctx),
            None => 0,
        }
    }

    /// Value the score formula would submit right now
    pub fn submission_value(&self, ctx: &EvaluationContext) -> u32 {
        self.definition
            .as_ref()
            .map(|def| def.value.value(ctx))
            .unwrap_or(0)
    }

    pub fn format_score(&self, value: u32) -> String {
        self.format.format(value)
    }

    /// Record a ranking row. The first row submitted for a rank is kept.
    pub fn submit_rank_info(&mut self, rank: u32, username: impl Into<String>, score: i32, achieved: i64) {
        if self.rank_info.iter().any(|r| r.rank == rank) {
            return;
        }
        self.rank_info.push(RankInfo {
            rank,
            username: username.into(),
            score,
            achieved,
        });
    }

    pub fn sort_rank_info(&mut self) {
        self.rank_info.sort_by_key(|r| r.rank);
    }

    pub fn rank_info(&self, index: usize) -> Option<&RankInfo> {
        self.rank_info.get(index)
    }

    pub fn rank_info_count(&self) -> usize {
        self.rank_info.len()
    }

    pub fn clear_rank_info(&mut self) {
        self.rank_info.clear();
    }
}
