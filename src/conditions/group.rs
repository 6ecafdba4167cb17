//! Condition groups and their per-frame evaluation
//!
//! A group is split into chains: zero or more modifier, accumulator and
//! combiner conditions followed by one terminal condition. The terminal's
//! type decides how the chain participates:
//!
//! - PauseIf chains are evaluated first; the first satisfied one pauses the group
//! - ResetIf chains are evaluated next, unless paused, and request a set-wide reset
//! - every other chain contributes to the group's AND
//!
//! A trailing chain without a terminal is ignored.

use super::condition::Condition;
use super::operand::OperandValue;
use super::parser::Cursor;
use super::types::{
    CombinerKind, ComparisonKind, ConditionType, FlagKind, HitAccumulatorKind, ModifierKind,
};
use crate::error::ParseResult;
use crate::memory::EvaluationContext;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainKind {
    Pause,
    Reset,
    Logic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Chain {
    range: Range<usize>,
    kind: ChainKind,
}

/// Measured progress reported by a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasuredProgress {
    pub value: u32,
    pub target: u32,
}

/// Result of evaluating one group for one frame
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GroupOutcome {
    /// AND of the logic chains; false when paused or resetting
    pub result: bool,
    /// Result ignoring Trigger chains
    pub primed: bool,
    pub has_logic: bool,
    pub has_trigger: bool,
    pub paused: bool,
    pub reset_requested: bool,
    pub dirty: bool,
    pub measured: Option<MeasuredProgress>,
}

/// Result of evaluating one chain
struct ChainOutcome {
    satisfied: bool,
    measured: Option<MeasuredProgress>,
}

/// An ordered AND of conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
    conditions: Vec<Condition>,
    chains: Vec<Chain>,
}

impl ConditionGroup {
    pub fn new(conditions: Vec<Condition>) -> Self {
        let chains = Self::classify(&conditions);
        Self { conditions, chains }
    }

    fn classify(conditions: &[Condition]) -> Vec<Chain> {
        let mut chains = Vec::new();
        let mut start = 0;
        for (i, condition) in conditions.iter().enumerate() {
            let kind = match condition.condition_type {
                ConditionType::Flag(FlagKind::PauseIf) => ChainKind::Pause,
                ConditionType::Flag(FlagKind::ResetIf) => ChainKind::Reset,
                ConditionType::Comparison(_) => ChainKind::Logic,
                _ => continue,
            };
            chains.push(Chain {
                range: start..i + 1,
                kind,
            });
            start = i + 1;
        }
        chains
    }

    /// Parse conditions joined by `_`. Stops before `S`, `:` or end of input.
    pub fn parse(cursor: &mut Cursor<'_>) -> ParseResult<Self> {
        let mut conditions = Vec::new();
        if matches!(cursor.peek(), None | Some('S') | Some(':')) {
            return Ok(Self::default());
        }

        loop {
            conditions.push(Condition::parse(cursor)?);
            if !cursor.match_char('_') {
                break;
            }
        }

        Ok(Self::new(conditions))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub(crate) fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    pub fn condition_mut(&mut self, index: usize) -> Option<&mut Condition> {
        self.conditions.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Overwrite the hit count of one condition
    pub fn set_hits(&mut self, index: usize, hits: u32) {
        if let Some(condition) = self.conditions.get_mut(index) {
            condition.override_current_hits(hits);
        }
    }

    /// Zero all hit counts, reporting whether any changed
    pub fn reset_hits(&mut self) -> bool {
        let mut changed = false;
        for condition in &mut self.conditions {
            changed |= condition.reset_hits();
        }
        changed
    }

    /// Read memory for every operand once. AddAddress offsets the next condition.
    pub fn advance(&mut self, ctx: &EvaluationContext) {
        let mut offset = 0u32;
        for condition in &mut self.conditions {
            condition.advance(ctx, offset);
            offset = match condition.condition_type {
                ConditionType::Modifier(ModifierKind::AddAddress) => {
                    condition.source.value().as_u32()
                }
                _ => 0,
            };
        }
    }

    /// Evaluate against the values read by the last `advance`
    pub(crate) fn evaluate(&mut self) -> GroupOutcome {
        let mut outcome = GroupOutcome::default();

        for chain in self.chains.iter().filter(|c| c.kind == ChainKind::Pause) {
            let chain_outcome = evaluate_chain(&mut self.conditions[chain.range.clone()], &mut outcome.dirty);
            if chain_outcome.satisfied {
                outcome.paused = true;
                break;
            }
        }

        if outcome.paused {
            outcome.has_logic = self.chains.iter().any(|c| c.kind == ChainKind::Logic);
            return outcome;
        }

        for chain in self.chains.iter().filter(|c| c.kind == ChainKind::Reset) {
            let chain_outcome = evaluate_chain(&mut self.conditions[chain.range.clone()], &mut outcome.dirty);
            if chain_outcome.satisfied {
                outcome.reset_requested = true;
            }
        }

        let mut result = true;
        let mut primed = true;
        let mut measured_if_failed = false;
        for chain in self.chains.iter().filter(|c| c.kind == ChainKind::Logic) {
            outcome.has_logic = true;
            let chain_outcome = evaluate_chain(&mut self.conditions[chain.range.clone()], &mut outcome.dirty);
            result &= chain_outcome.satisfied;

            match self.conditions[chain.range.end - 1].condition_type {
                ConditionType::Comparison(ComparisonKind::Trigger) => outcome.has_trigger = true,
                ConditionType::Comparison(ComparisonKind::MeasuredIf) => {
                    primed &= chain_outcome.satisfied;
                    measured_if_failed |= !chain_outcome.satisfied;
                }
                _ => primed &= chain_outcome.satisfied,
            }

            if chain_outcome.measured.is_some() {
                outcome.measured = chain_outcome.measured;
            }
        }

        if measured_if_failed {
            if let Some(measured) = outcome.measured.as_mut() {
                measured.value = 0;
            }
        }

        outcome.result = result && !outcome.reset_requested;
        outcome.primed = primed && !outcome.reset_requested;
        outcome
    }
}

/// Evaluate one chain, updating hit counts. The last condition is the terminal.
fn evaluate_chain(conditions: &mut [Condition], dirty: &mut bool) -> ChainOutcome {
    let mut accumulated = OperandValue::default();
    let mut hit_tally: i64 = 0;
    let mut combined: Option<(CombinerKind, bool)> = None;
    let mut reset_next = false;
    let last = conditions.len().saturating_sub(1);

    for (i, condition) in conditions.iter_mut().enumerate() {
        match condition.condition_type {
            ConditionType::Modifier(ModifierKind::AddSource) => {
                accumulated = condition.source_value(accumulated);
                continue;
            }
            ConditionType::Modifier(ModifierKind::SubSource) => {
                accumulated = accumulated - condition.source.value();
                continue;
            }
            ConditionType::Modifier(ModifierKind::AddAddress) => continue,
            _ => {}
        }

        let measured_value = condition.source_value(accumulated);
        let mut held = condition.compare(accumulated);
        accumulated = OperandValue::default();

        if let Some((kind, previous)) = combined.take() {
            held = match kind {
                CombinerKind::OrNext => previous || held,
                _ => previous && held,
            };
        }

        if reset_next {
            *dirty |= condition.reset_hits();
            reset_next = false;
        }

        if i < last {
            if held && !condition.is_complete() {
                condition.increment_hits();
                *dirty = true;
            }
            let truth = if condition.required_hits > 0 {
                condition.is_complete()
            } else {
                held
            };

            match condition.condition_type {
                ConditionType::HitAccumulator(HitAccumulatorKind::AddHits) => {
                    hit_tally += condition.current_hits() as i64;
                }
                ConditionType::HitAccumulator(HitAccumulatorKind::SubHits) => {
                    hit_tally -= condition.current_hits() as i64;
                }
                ConditionType::Combiner(CombinerKind::ResetNextIf) => reset_next = truth,
                ConditionType::Combiner(kind) => combined = Some((kind, truth)),
                _ => {}
            }
            continue;
        }

        return evaluate_terminal(condition, held, hit_tally, measured_value, dirty);
    }

    ChainOutcome {
        satisfied: false,
        measured: None,
    }
}

fn evaluate_terminal(
    condition: &mut Condition,
    held: bool,
    hit_tally: i64,
    measured_value: OperandValue,
    dirty: &mut bool,
) -> ChainOutcome {
    let is_pause = condition.condition_type == ConditionType::PAUSE_IF;
    if is_pause && held {
        *dirty = true;
    }

    let satisfied = if condition.required_hits == 0 {
        if is_pause {
            let hits = held as u32;
            if condition.current_hits() != hits {
                condition.override_current_hits(hits);
                *dirty = true;
            }
        } else if held {
            condition.increment_hits();
            *dirty = true;
        }
        held
    } else {
        let required = condition.required_hits as i64;
        if held
            && !condition.is_complete()
            && (condition.current_hits() as i64 + hit_tally) < required
        {
            condition.increment_hits();
            *dirty = true;
        }
        condition.current_hits() as i64 + hit_tally >= required
    };

    let measured = if condition.condition_type.is_measured() {
        Some(if condition.required_hits > 0 {
            MeasuredProgress {
                value: (condition.current_hits() as i64 + hit_tally).max(0) as u32,
                target: condition.required_hits,
            }
        } else {
            MeasuredProgress {
                value: measured_value.as_u32(),
                target: condition.target.value().as_u32(),
            }
        })
    } else {
        None
    };

    ChainOutcome {
        satisfied,
        measured,
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryReader;
    use std::sync::Arc;

    fn group(s: &str) -> ConditionGroup {
        let mut cursor = Cursor::new(s);
        let group = ConditionGroup::parse(&mut cursor).unwrap();
        assert!(cursor.is_at_end(), "trailing input in {}", s);
        group
    }

    fn context(bytes: &[u8]) -> (Arc<MockMemoryReader>, EvaluationContext) {
        let reader = Arc::new(MockMemoryReader::from_bytes(bytes));
        let ctx = EvaluationContext::new(reader.clone());
        (reader, ctx)
    }

    fn run(group: &mut ConditionGroup, ctx: &EvaluationContext) -> GroupOutcome {
        group.advance(ctx);
        group.evaluate()
    }

    fn hits(group: &ConditionGroup) -> Vec<u32> {
        group.conditions().iter().map(|c| c.current_hits()).collect()
    }

    #[test]
    fn test_classify_chains() {
        let group = group("A:0xH01=0_0xH02=1_P:0xH03=1_C:0xH04=1_R:0xH05=1_N:0xH06=1");
        let kinds: Vec<ChainKind> = group.chains.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChainKind::Logic, ChainKind::Pause, ChainKind::Reset]);
        assert_eq!(group.chains[0].range, 0..2);
        assert_eq!(group.chains[2].range, 3..5);
    }

    #[test]
    fn test_parse_stops_at_separators() {
        let mut cursor = Cursor::new("0xH01=1_0xH02=2S0xH03=3");
        let parsed = ConditionGroup::parse(&mut cursor).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(cursor.rest(), "S0xH03=3");

        let mut cursor = Cursor::new("::CAN");
        assert!(ConditionGroup::parse(&mut cursor).unwrap().is_empty());
    }

    #[test]
    fn test_empty_group_is_vacuously_true() {
        let (_reader, ctx) = context(&[0]);
        let mut group = ConditionGroup::default();
        let outcome = run(&mut group, &ctx);
        assert!(outcome.result);
        assert!(!outcome.has_logic);
    }

    #[test]
    fn test_and_next() {
        let (reader, ctx) = context(&[0x00, 0x12, 0x34]);
        let mut group = group("N:0xH0001=18_0xH0002=52(2)");

        assert!(!run(&mut group, &ctx).result);
        assert_eq!(hits(&group), vec![1, 1]);

        reader.write_u8(1, 0);
        assert!(!run(&mut group, &ctx).result);
        assert_eq!(hits(&group), vec![1, 1]);

        reader.write_u8(1, 18);
        assert!(run(&mut group, &ctx).result);
        assert_eq!(hits(&group), vec![2, 2]);
    }

    #[test]
    fn test_or_next() {
        let (reader, ctx) = context(&[0x00, 0x12, 0x34]);
        let mut group = group("O:0xH0001=1_0xH0002=1");

        assert!(!run(&mut group, &ctx).result);

        reader.write_u8(1, 1);
        assert!(run(&mut group, &ctx).result);

        reader.write_u8(1, 0);
        reader.write_u8(2, 1);
        assert!(run(&mut group, &ctx).result);
    }

    #[test]
    fn test_reset_next_if() {
        let (reader, ctx) = context(&[0x00, 0x12]);
        let mut group = group("Z:0xH0000=1_0xH0001=18(3)");

        run(&mut group, &ctx);
        run(&mut group, &ctx);
        assert_eq!(hits(&group)[1], 2);

        reader.write_u8(0, 1);
        let outcome = run(&mut group, &ctx);
        assert!(!outcome.result);
        assert!(!outcome.reset_requested);
        assert_eq!(hits(&group)[1], 1);
    }

    #[test]
    fn test_sub_hits() {
        let (reader, ctx) = context(&[0x00, 0x12]);
        let mut group = group("D:0xH0000=1_0xH0001=18(2)");

        assert!(!run(&mut group, &ctx).result);
        assert!(run(&mut group, &ctx).result);

        reader.write_u8(0, 1);
        // one SubHits hit takes the total below the target
        assert!(!run(&mut group, &ctx).result);
        assert_eq!(hits(&group), vec![1, 2]);
    }

    #[test]
    fn test_add_address() {
        // pointer at 0x00 -> 0x02, value at 0x02 + 1
        let (reader, ctx) = context(&[0x02, 0x00, 0x00, 0x07]);
        let mut group = group("I:0xH0000_0xH0001=7");

        assert!(run(&mut group, &ctx).result);

        reader.write_u8(0, 0x00);
        assert!(!run(&mut group, &ctx).result);
    }

    #[test]
    fn test_measured_values() {
        let (reader, ctx) = context(&[0x00, 0x05]);
        let mut group = group("M:0xH0001=10");

        let outcome = run(&mut group, &ctx);
        assert_eq!(outcome.measured, Some(MeasuredProgress { value: 5, target: 10 }));

        reader.write_u8(1, 10);
        let outcome = run(&mut group, &ctx);
        assert!(outcome.result);
        assert_eq!(outcome.measured, Some(MeasuredProgress { value: 10, target: 10 }));
    }

    #[test]
    fn test_measured_hits_with_measured_if() {
        let (reader, ctx) = context(&[0x01, 0x05]);
        let mut group = group("Q:0xH0000=1_M:0xH0001=5(4)");

        let outcome = run(&mut group, &ctx);
        assert_eq!(outcome.measured, Some(MeasuredProgress { value: 1, target: 4 }));

        reader.write_u8(0, 0);
        let outcome = run(&mut group, &ctx);
        assert_eq!(outcome.measured, Some(MeasuredProgress { value: 0, target: 4 }));
        assert_eq!(hits(&group)[1], 2);
    }

    #[test]
    fn test_trigger_primed() {
        let (reader, ctx) = context(&[0x01, 0x00]);
        let mut group = group("0xH0000=1_T:0xH0001=1");

        let outcome = run(&mut group, &ctx);
        assert!(!outcome.result);
        assert!(outcome.primed);
        assert!(outcome.has_trigger);

        reader.write_u8(1, 1);
        let outcome = run(&mut group, &ctx);
        assert!(outcome.result);
    }

    #[test]
    fn test_serialize() {
        let text = "A:0xH0001=0_B:0xL0002=0_0xL0004=14";
        assert_eq!(group(text).to_string(), text);
    }
}
