//! Condition sets: a core group plus alternates

use super::group::{ConditionGroup, MeasuredProgress};
use super::parser::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::memory::EvaluationContext;
use std::fmt;
use std::str::FromStr;

/// Result of testing a set for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestOutcome {
    pub result: bool,
    /// Any hit count changed
    pub dirty: bool,
    /// A ResetIf fired and every hit count was zeroed
    pub was_reset: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    core: ConditionGroup,
    alternates: Vec<ConditionGroup>,
    primed: bool,
    measured: Option<MeasuredProgress>,
}

impl ConditionSet {
    pub fn new(core: ConditionGroup, alternates: Vec<ConditionGroup>) -> Self {
        Self {
            core,
            alternates,
            primed: false,
            measured: None,
        }
    }

    /// Parse a core group followed by `S`-separated alternates
    pub fn parse(cursor: &mut Cursor<'_>) -> ParseResult<Self> {
        let core = ConditionGroup::parse(cursor)?;
        let mut alternates = Vec::new();
        while cursor.match_char('S') {
            alternates.push(ConditionGroup::parse(cursor)?);
        }
        Ok(Self::new(core, alternates))
    }

    pub fn core(&self) -> &ConditionGroup {
        &self.core
    }

    pub fn alternates(&self) -> &[ConditionGroup] {
        &self.alternates
    }

    /// Number of groups, core included
    pub fn group_count(&self) -> usize {
        1 + self.alternates.len()
    }

    /// Core first, then alternates
    pub fn groups(&self) -> impl Iterator<Item = &ConditionGroup> {
        std::iter::once(&self.core).chain(self.alternates.iter())
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = &mut ConditionGroup> {
        std::iter::once(&mut self.core).chain(self.alternates.iter_mut())
    }

    pub fn group_mut(&mut self, index: usize) -> Option<&mut ConditionGroup> {
        if index == 0 {
            Some(&mut self.core)
        } else {
            self.alternates.get_mut(index - 1)
        }
    }

    /// No conditions in any group
    pub fn is_empty(&self) -> bool {
        self.groups().all(|g| g.is_empty())
    }

    /// Every non-Trigger condition holds but the set is not yet true
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Measured progress from the last test, if any group measures
    pub fn measured(&self) -> Option<MeasuredProgress> {
        self.measured
    }

    /// Zero every hit count
    pub fn reset(&mut self) {
        for group in self.groups_mut() {
            group.reset_hits();
        }
        self.primed = false;
    }

    /// Read memory for every operand in every group, once
    pub fn advance(&mut self, ctx: &EvaluationContext) {
        for group in self.groups_mut() {
            group.advance(ctx);
        }
    }

    /// Advance the memory history and evaluate one frame
    pub fn test(&mut self, ctx: &EvaluationContext) -> TestOutcome {
        self.advance(ctx);
        self.evaluate()
    }

    /// Evaluate against the values read by the last `advance`.
    ///
    /// The core and each alternate are evaluated independently. With
    /// alternates present, the set is true when any group that has logic
    /// conditions is true; a group made only of PauseIf/ResetIf conditions
    /// does not count. The core is one of those groups and does not gate
    /// the alternates: `core || any(alt)`, not `core && any(alt)`.
    /// A ResetIf anywhere zeroes every group.
    pub fn evaluate(&mut self) -> TestOutcome {
        let core = self.core.evaluate();
        let alternates: Vec<_> = self.alternates.iter_mut().map(|g| g.evaluate()).collect();

        let mut dirty = core.dirty;
        let mut reset_requested = core.reset_requested;
        let mut measured = core.measured;
        let mut has_trigger = core.has_trigger;
        for alt in &alternates {
            dirty |= alt.dirty;
            reset_requested |= alt.reset_requested;
            has_trigger |= alt.has_trigger;
            if let Some(alt_measured) = alt.measured {
                if measured.map_or(true, |m| alt_measured.value > m.value) {
                    measured = Some(alt_measured);
                }
            }
        }

        let (mut result, mut primed) = if alternates.is_empty() {
            (core.result, core.primed)
        } else {
            let contributes = |has_logic: bool, paused: bool| has_logic && !paused;
            let mut result = contributes(core.has_logic, core.paused) && core.result;
            let mut primed = contributes(core.has_logic, core.paused) && core.primed;
            for alt in &alternates {
                if contributes(alt.has_logic, alt.paused) {
                    result |= alt.result;
                    primed |= alt.primed;
                }
            }
            (result, primed)
        };

        if self.is_empty() {
            result = false;
            primed = false;
        }

        if reset_requested {
            self.reset();
            dirty = true;
            result = false;
            primed = false;
        }

        self.primed = primed && !result && has_trigger;
        self.measured = measured;

        TestOutcome {
            result,
            dirty,
            was_reset: reset_requested,
        }
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.core)?;
        for alt in self.alternates.iter().filter(|g| !g.is_empty()) {
            write!(f, "S{}", alt)?;
        }
        Ok(())
    }
}

impl FromStr for ConditionSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s);
        let set = ConditionSet::parse(&mut cursor)?;
        match cursor.peek() {
            None => Ok(set),
            Some(c) => Err(ParseError::unexpected(c, cursor.position())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryReader;
    use std::sync::Arc;

    fn context(bytes: &[u8]) -> (Arc<MockMemoryReader>, EvaluationContext) {
        let reader = Arc::new(MockMemoryReader::from_bytes(bytes));
        let ctx = EvaluationContext::new(reader.clone());
        (reader, ctx)
    }

    fn outcome(result: bool, dirty: bool, was_reset: bool) -> TestOutcome {
        TestOutcome {
            result,
            dirty,
            was_reset,
        }
    }

    #[test]
    fn test_parse_groups() {
        let set: ConditionSet = "0xH0001=1S0xH0002=2S0xH0003=3_0xH0004=4".parse().unwrap();
        assert_eq!(set.group_count(), 3);
        assert_eq!(set.core().len(), 1);
        assert_eq!(set.alternates()[1].len(), 2);
    }

    #[test]
    fn test_parse_empty_core() {
        let set: ConditionSet = "S0xH0001=1S0xH0002=1".parse().unwrap();
        assert!(set.core().is_empty());
        assert_eq!(set.alternates().len(), 2);
        assert_eq!(set.to_string(), "S0xH0001=1S0xH0002=1");
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert!("0xH0001=1#".parse::<ConditionSet>().is_err());
        assert!("0xH0001=1_".parse::<ConditionSet>().is_err());
    }

    #[test]
    fn test_empty_set_is_false() {
        let (_reader, ctx) = context(&[0]);
        let mut set = ConditionSet::default();
        assert!(set.is_empty());
        assert_eq!(set.test(&ctx), outcome(false, false, false));
    }

    #[test]
    fn test_reset_only_core_is_true() {
        let (_reader, ctx) = context(&[0]);
        let mut set: ConditionSet = "R:0xH0000=1".parse().unwrap();
        assert_eq!(set.test(&ctx), outcome(true, false, false));
    }

    #[test]
    fn test_alt_groups_or() {
        let (reader, ctx) = context(&[0x00, 0x12, 0x34, 0xAB, 0x56]);
        let mut set: ConditionSet = "0xH0001=16S0xH0002=52S0xL0004=6".parse().unwrap();

        // core false, both alternates true
        assert!(set.test(&ctx).result);

        reader.write_u8(2, 0);
        assert!(set.test(&ctx).result);

        reader.write_u8(4, 0);
        assert!(!set.test(&ctx).result);

        reader.write_u8(1, 16);
        assert!(set.test(&ctx).result);

        let hits: Vec<u32> = set.groups().map(|g| g.conditions()[0].current_hits()).collect();
        assert_eq!(hits, vec![1, 1, 2]);
    }

    #[test]
    fn test_pause_only_core_with_alternates() {
        let (reader, ctx) = context(&[0x00, 0x12]);
        let mut set: ConditionSet = "P:0xH0000=1S0xH0001=18".parse().unwrap();
        assert!(set.test(&ctx).result);

        // the core pausing does not stop the alternate
        reader.write_u8(0, 1);
        assert!(set.test(&ctx).result);
    }

    #[test]
    fn test_primed() {
        let (reader, ctx) = context(&[0x01, 0x00]);
        let mut set: ConditionSet = "0xH0000=1_T:0xH0001=1".parse().unwrap();
        set.test(&ctx);
        assert!(set.is_primed());

        reader.write_u8(1, 1);
        assert!(set.test(&ctx).result);
        assert!(!set.is_primed());

        let mut no_trigger: ConditionSet = "0xH0000=1".parse().unwrap();
        no_trigger.test(&ctx);
        assert!(!no_trigger.is_primed());
    }

    #[test]
    fn test_measured_across_alternates() {
        let (_reader, ctx) = context(&[0x03, 0x07]);
        let mut set: ConditionSet = "SM:0xH0000=10SM:0xH0001=10".parse().unwrap();
        set.test(&ctx);
        assert_eq!(set.measured(), Some(MeasuredProgress { value: 7, target: 10 }));
    }
}
