//! Achievements and their saved progress
//!
//! A progress ("state") string records, for every group of an achievement,
//! the hit count and raw operand values of each condition:
//!
//! ```text
//! id:count:hits:src:srcPrev:tgt:tgtPrev:...  (one block per group)
//! md5(user + groups + user + id):md5(definition):
//! ```
//!
//! Strings for several achievements are simply concatenated; each
//! achievement consumes its own prefix.

use crate::conditions::{ConditionSet, Cursor, MeasuredProgress, TestOutcome};
use crate::memory::EvaluationContext;
use md5::{Digest, Md5};
use std::fmt::Write as _;

#[derive(Debug, Clone, Default)]
pub struct Achievement {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub progress: String,
    pub progress_max: String,
    pub progress_format: String,
    pub author: String,
    pub points: u32,
    /// Unix timestamps
    pub created: i64,
    pub modified: i64,
    pub upvotes: u32,
    pub downvotes: u32,
    pub badge: String,
    conditions: ConditionSet,
    active: bool,
    last_outcome: TestOutcome,
}

/// Saved values for one condition
#[derive(Debug, Clone, Copy)]
struct ConditionState {
    hits: u32,
    source: (u32, u32),
    target: (u32, u32),
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", Md5::digest(input.as_bytes()))
}

/// Read a decimal number terminated by ':'
fn read_field(cursor: &mut Cursor<'_>) -> Option<u32> {
    let value = cursor.read_unsigned()?;
    cursor.match_char(':').then_some(value)
}

/// Read a token terminated by ':'
fn read_token<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    let rest = cursor.rest();
    let end = rest.find(':')?;
    cursor.skip(end + 1);
    Some(&rest[..end])
}

impl Achievement {
    /// Create an active achievement. A definition that does not parse is
    /// logged and replaced with an empty set that never triggers.
    pub fn new(id: u32, definition: &str) -> Self {
        let conditions = match definition.parse::<ConditionSet>() {
            Ok(set) => set,
            Err(e) => {
                log::warn!("Achievement {}: invalid definition: {}", id, e);
                ConditionSet::default()
            }
        };

        Self {
            id,
            conditions,
            active: true,
            ..Default::default()
        }
    }

    /// Parse a patch file line:
    /// `id:memaddr:title:desc:progress:max:format:author:points:created:modified:up:down:badge`.
    ///
    /// Returns `None` for blank lines and `/` or `\` comments.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if line.is_empty() || line.starts_with('/') || line.starts_with('\\') {
            return None;
        }

        let mut cursor = Cursor::new(line);
        let id = cursor.read_unsigned().unwrap_or(0);
        cursor.match_char(':');

        let memaddr_start = cursor.position();
        let conditions = match ConditionSet::parse(&mut cursor) {
            Ok(set) if cursor.is_at_end() || cursor.peek() == Some(':') => set,
            Ok(_) => {
                log::warn!(
                    "Achievement {}: unexpected input at offset {}",
                    id,
                    cursor.position()
                );
                ConditionSet::default()
            }
            Err(e) => {
                log::warn!("Achievement {}: invalid definition: {}", id, e);
                let failed_at = e.position.unwrap_or(memaddr_start);
                cursor = Cursor::new(line);
                cursor.skip(failed_at);
                ConditionSet::default()
            }
        };

        let rest = cursor.rest();
        let rest = match rest.find(':') {
            Some(index) => &rest[index + 1..],
            None => "",
        };

        let mut fields = rest.splitn(12, ':');
        let mut text = || fields.next().unwrap_or("").to_string();
        let title = text();
        let description = text();
        let progress = text();
        let progress_max = text();
        let progress_format = text();
        let author = text();
        let points = text().trim().parse().unwrap_or(0);
        let created = text().trim().parse().unwrap_or(0);
        let modified = text().trim().parse().unwrap_or(0);
        let upvotes = text().trim().parse().unwrap_or(0);
        let downvotes = text().trim().parse().unwrap_or(0);
        let badge = text();
        let badge = badge.strip_suffix("_lock").unwrap_or(&badge).to_string();

        Some(Self {
            id,
            title,
            description,
            progress,
            progress_max,
            progress_format,
            author,
            points,
            created,
            modified,
            upvotes,
            downvotes,
            badge,
            conditions,
            active: true,
            last_outcome: TestOutcome::default(),
        })
    }

    /// Serialize back to a patch file line
    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.id,
            self.conditions,
            self.title,
            self.description,
            self.progress,
            self.progress_max,
            self.progress_format,
            self.author,
            self.points,
            self.created,
            self.modified,
            self.upvotes,
            self.downvotes,
            self.badge
        )
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut ConditionSet {
        &mut self.conditions
    }

    /// Canonical definition string
    pub fn definition(&self) -> String {
        self.conditions.to_string()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Test one frame. A `true` result means the conditions currently hold;
    /// whether that unlocks anything is up to the caller.
    pub fn test(&mut self, ctx: &EvaluationContext) -> bool {
        self.last_outcome = self.conditions.test(ctx);
        self.last_outcome.result
    }

    /// Outcome of the last `test`
    pub fn last_outcome(&self) -> TestOutcome {
        self.last_outcome
    }

    /// Zero every hit count
    pub fn reset(&mut self) {
        self.conditions.reset();
    }

    pub fn is_primed(&self) -> bool {
        self.conditions.is_primed()
    }

    pub fn measured(&self) -> Option<MeasuredProgress> {
        self.conditions.measured()
    }

    /// Any condition has a non-zero hit count
    pub fn has_progress(&self) -> bool {
        self.conditions
            .groups()
            .flat_map(|g| g.conditions())
            .any(|c| c.current_hits() > 0)
    }

    pub fn create_state_string(&self, user: &str) -> String {
        let mut groups = String::new();
        for group in self.conditions.groups() {
            let _ = write!(groups, "{}:{}:", self.id, group.len());
            for condition in group.conditions() {
                let (source, source_prev) = condition.source.state_values();
                let (target, target_prev) = condition.target.state_values();
                let _ = write!(
                    groups,
                    "{}:{}:{}:{}:{}:",
                    condition.current_hits(),
                    source,
                    source_prev,
                    target,
                    target_prev
                );
            }
        }

        let user_hash = md5_hex(&format!("{}{}{}{}", user, groups, user, self.id));
        let definition_hash = md5_hex(&self.definition());
        format!("{}{}:{}:", groups, user_hash, definition_hash)
    }

    /// Restore progress from the front of `input`, returning the unconsumed
    /// remainder.
    ///
    /// If the checksums do not match this user and definition, hit counts are
    /// zeroed and operand values are left alone. Input that does not start
    /// with this achievement's id is returned untouched.
    pub fn parse_state_string<'a>(&mut self, input: &'a str, user: &str) -> &'a str {
        let mut cursor = Cursor::new(input);
        let mut groups: Vec<Vec<ConditionState>> = Vec::new();

        loop {
            let mut probe = Cursor::new(cursor.rest());
            if read_field(&mut probe) != Some(self.id) {
                break;
            }
            let Some(count) = read_field(&mut probe) else {
                break;
            };

            // count is untrusted; storage grows only as fields are read
            let mut states = Vec::new();
            for _ in 0..count {
                let mut values = [0u32; 5];
                for value in &mut values {
                    match read_field(&mut probe) {
                        Some(v) => *value = v,
                        None => {
                            log::warn!("Achievement {}: truncated progress", self.id);
                            return input;
                        }
                    }
                }
                states.push(ConditionState {
                    hits: values[0],
                    source: (values[1], values[2]),
                    target: (values[3], values[4]),
                });
            }

            groups.push(states);
            cursor.skip(probe.position());
        }

        if groups.is_empty() {
            return input;
        }

        let groups_text = &input[..cursor.position()];
        let (Some(user_hash), Some(definition_hash)) =
            (read_token(&mut cursor), read_token(&mut cursor))
        else {
            log::warn!("Achievement {}: progress is missing checksums", self.id);
            return input;
        };
        let remainder = cursor.rest();

        let expected_user = md5_hex(&format!("{}{}{}{}", user, groups_text, user, self.id));
        let shapes_match = groups.len() == self.conditions.group_count()
            && groups
                .iter()
                .zip(self.conditions.groups())
                .all(|(states, group)| states.len() == group.len());

        if user_hash != expected_user {
            log::debug!("Achievement {}: progress belongs to another user", self.id);
            self.reset();
        } else if definition_hash != md5_hex(&self.definition()) || !shapes_match {
            log::debug!("Achievement {}: definition changed since progress was saved", self.id);
            self.reset();
        } else {
            for (states, group) in groups.iter().zip(self.conditions.groups_mut()) {
                for (index, state) in states.iter().enumerate() {
                    if let Some(condition) = group.condition_mut(index) {
                        condition.override_current_hits(state.hits);
                        condition.source.restore_state(state.source.0, state.source.1);
                        condition.target.restore_state(state.target.0, state.target.1);
                    }
                }
            }
        }

        remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_string() {
        let achievement = Achievement::default();
        assert_eq!(
            achievement.create_state_string("user1"),
            "0:0:a9bf5b6918bb43ec1d430f09d6606fbd:d41d8cd98f00b204e9800998ecf8427e:"
        );
    }

    #[test]
    fn test_parse_line() {
        let line = "12345:0xH1234=6_R:0xH3456=7:Speed Run:Finish fast:0:0::Author:10:1500000000:1500000100:3:1:00234_lock";
        let achievement = Achievement::parse_line(line).unwrap();
        assert_eq!(achievement.id, 12345);
        assert_eq!(achievement.definition(), "0xH1234=6_R:0xH3456=7");
        assert_eq!(achievement.title, "Speed Run");
        assert_eq!(achievement.description, "Finish fast");
        assert_eq!(achievement.author, "Author");
        assert_eq!(achievement.points, 10);
        assert_eq!(achievement.created, 1500000000);
        assert_eq!(achievement.modified, 1500000100);
        assert_eq!(achievement.upvotes, 3);
        assert_eq!(achievement.downvotes, 1);
        assert_eq!(achievement.badge, "00234");
        assert!(achievement.is_active());
    }

    #[test]
    fn test_parse_line_round_trip() {
        let line = "7:0xH0001=1S0xH0002=2:Title:Desc:::::5:0:0:0:0:badge";
        let achievement = Achievement::parse_line(line).unwrap();
        assert_eq!(achievement.to_line(), line);
    }

    #[test]
    fn test_parse_line_comments() {
        assert!(Achievement::parse_line("// comment").is_none());
        assert!(Achievement::parse_line("\\comment").is_none());
        assert!(Achievement::parse_line("").is_none());
    }

    #[test]
    fn test_parse_line_bad_definition() {
        let achievement = Achievement::parse_line("5:0xH12=:Broken:Never fires").unwrap();
        assert!(achievement.conditions().is_empty());
        assert_eq!(achievement.title, "Broken");
        assert_eq!(achievement.description, "Never fires");
    }

    #[test]
    fn test_definition_only_line() {
        let achievement = Achievement::parse_line("12345:0xh1234=6").unwrap();
        assert_eq!(achievement.definition(), "0xH1234=6");
        assert!(achievement.title.is_empty());
    }

    #[test]
    fn test_invalid_definition_never_triggers() {
        use crate::memory::MockMemoryReader;
        use std::sync::Arc;

        let ctx = EvaluationContext::new(Arc::new(MockMemoryReader::from_bytes(&[0])));
        let mut achievement = Achievement::new(1, "0xH0000=");
        assert!(!achievement.test(&ctx));
        assert!(!achievement.test(&ctx));
    }

    #[test]
    fn test_unrelated_state_is_untouched() {
        let mut achievement = Achievement::new(12345, "0xH1234=6");
        let input = "54321:1:0:0:0:0:0:junk:junk:";
        assert_eq!(achievement.parse_state_string(input, "user1"), input);
    }
}
