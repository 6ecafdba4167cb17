//! Rich presence scripts
//!
//! A script is a sequence of sections:
//!
//! ```text
//! Lookup:Location
//! 0=Title Screen
//! 0x10=Green Hill
//! *=Somewhere
//!
//! Format:Score
//! FormatType=POINTS
//!
//! Display:
//! ?0xH0000=1?Paused in @Location(0xH0001)
//! In @Location(0xH0001), @Score(0x 0002)
//! ```
//!
//! `//` starts a comment and `\` escapes the next character. Lines outside a
//! section are ignored. The display section holds any number of `?cond?text`
//! lines followed by one unconditional default line.

use crate::conditions::ConditionSet;
use crate::format::ValueFormat;
use crate::formula::Formula;
use crate::memory::EvaluationContext;
use std::collections::{BTreeMap, HashMap};

/// A named table mapping values to text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    name: String,
    entries: BTreeMap<u32, String>,
    default: Option<String>,
}

impl Lookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
            default: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, value: u32, text: impl Into<String>) {
        self.entries.insert(value, text.into());
    }

    pub fn set_default(&mut self, text: impl Into<String>) {
        self.default = Some(text.into());
    }

    /// Text for `value`, the `*` entry if there is no match, or ""
    pub fn get(&self, value: u32) -> &str {
        self.entries
            .get(&value)
            .or(self.default.as_ref())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.default.is_none()
    }

    /// Add one `key=text` line. Keys are decimal, `0x` hex or `*`.
    fn add_line(&mut self, line: &str) {
        let Some((key, text)) = line.split_once('=') else {
            log::debug!("Lookup {}: ignoring line '{}'", self.name, line);
            return;
        };

        let text = unescape(text);
        let key = key.trim();
        if key == "*" {
            self.default = Some(text);
            return;
        }

        let parsed = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => key.parse::<u32>(),
        };
        match parsed {
            Ok(value) => {
                self.entries.insert(value, text);
            }
            Err(_) => log::debug!("Lookup {}: ignoring key '{}'", self.name, key),
        }
    }
}

/// Piece of a display line
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    /// `@Name(formula)`; `None` when the formula does not parse
    Tag { name: String, formula: Option<Formula> },
}

/// A parsed display line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayString {
    segments: Vec<Segment>,
}

impl DisplayString {
    /// Split a comment-stripped line into text and tags, resolving escapes
    pub fn parse(line: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = line.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        text.push(escaped);
                    }
                }
                '@' => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }

                    let name: String = chars.by_ref().take_while(|&c| c != '(').collect();
                    let source: String = chars.by_ref().take_while(|&c| c != ')').collect();
                    let formula = match source.parse::<Formula>() {
                        Ok(formula) => Some(formula),
                        Err(e) => {
                            log::debug!("Rich presence tag @{}: {}", name, e);
                            None
                        }
                    };
                    segments.push(Segment::Tag { name, formula });
                }
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self { segments }
    }

    fn render(
        &self,
        ctx: &EvaluationContext,
        lookups: &HashMap<String, Lookup>,
        formats: &HashMap<String, ValueFormat>,
    ) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Tag { name, formula } => {
                    let Some(formula) = formula else { continue };
                    if let Some(lookup) = lookups.get(name) {
                        output.push_str(lookup.get(formula.value(ctx)));
                    } else if let Some(format) = formats.get(name) {
                        output.push_str(
                            &format.format_with_frame_rate(formula.value(ctx), ctx.frames_per_second()),
                        );
                    }
                }
            }
        }
        output
    }
}

/// A display line shown while its conditions hold
#[derive(Debug, Clone)]
struct ConditionalDisplay {
    /// `None` when the conditions do not parse; such a line never shows
    condition: Option<ConditionSet>,
    display: DisplayString,
}

/// Loaded rich presence script
#[derive(Debug, Clone, Default)]
pub struct RichPresenceInterpreter {
    lookups: HashMap<String, Lookup>,
    formats: HashMap<String, ValueFormat>,
    conditional: Vec<ConditionalDisplay>,
    default_display: Option<DisplayString>,
}

impl RichPresenceInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a script. Never fails; check [`enabled`](Self::enabled).
    pub fn parse(script: &str) -> Self {
        let mut interpreter = Self::new();
        interpreter.load(script);
        interpreter
    }

    /// Replace the current script, returning whether it has a display line
    pub fn load(&mut self, script: &str) -> bool {
        *self = Self::default();

        let lines: Vec<&str> = script
            .split('\n')
            .map(|line| strip_comment(line.strip_suffix('\r').unwrap_or(line)))
            .collect();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            i += 1;

            if let Some(name) = line.strip_prefix("Lookup:") {
                let mut lookup = Lookup::new(name.trim());
                while i < lines.len() && !lines[i].is_empty() {
                    lookup.add_line(lines[i]);
                    i += 1;
                }
                log::debug!("Rich presence lookup {} ({} entries)", lookup.name(), lookup.len());
                self.lookups.insert(lookup.name().to_string(), lookup);
            } else if let Some(name) = line.strip_prefix("Format:") {
                match lines.get(i).and_then(|l| l.strip_prefix("FormatType=")) {
                    Some(kind) => {
                        self.formats
                            .insert(name.trim().to_string(), ValueFormat::from_name(kind));
                        i += 1;
                    }
                    None => log::debug!("Rich presence format {} has no FormatType", name),
                }
            } else if line.starts_with("Display:") {
                i = self.load_display(&lines, i);
            } else if !line.is_empty() {
                log::debug!("Rich presence: ignoring line '{}'", line);
            }
        }

        if !self.enabled() {
            log::warn!("Rich presence script has no default display line");
        }
        self.enabled()
    }

    /// Read display lines up to and including the default line.
    /// Returns the index of the first line after the section.
    fn load_display(&mut self, lines: &[&str], mut i: usize) -> usize {
        while i < lines.len() {
            let line = lines[i];
            i += 1;

            if line.is_empty() {
                continue;
            }

            let conditional = line
                .strip_prefix('?')
                .and_then(|rest| rest.split_once('?'));
            match conditional {
                Some((condition, text)) => {
                    let condition = match condition.parse::<ConditionSet>() {
                        Ok(set) => Some(set),
                        Err(e) => {
                            log::warn!("Rich presence condition '{}': {}", condition, e);
                            None
                        }
                    };
                    self.conditional.push(ConditionalDisplay {
                        condition,
                        display: DisplayString::parse(text),
                    });
                }
                None => {
                    self.default_display = Some(DisplayString::parse(line));
                    break;
                }
            }
        }
        i
    }

    /// A default display line was loaded
    pub fn enabled(&self) -> bool {
        self.default_display.is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<&Lookup> {
        self.lookups.get(name)
    }

    pub fn format(&self, name: &str) -> Option<ValueFormat> {
        self.formats.get(name).copied()
    }

    /// Build the display string for this frame.
    ///
    /// Every conditional line is tested each call so delta values stay in
    /// step; the first one that holds is shown, else the default.
    pub fn get_rich_presence_string(&mut self, ctx: &EvaluationContext) -> String {
        let Some(default_display) = &self.default_display else {
            return String::new();
        };

        let mut chosen = None;
        for (index, line) in self.conditional.iter_mut().enumerate() {
            if let Some(set) = line.condition.as_mut() {
                if set.test(ctx).result && chosen.is_none() {
                    chosen = Some(index);
                }
            }
        }

        chosen
            .map(|index| &self.conditional[index].display)
            .unwrap_or(default_display)
            .render(ctx, &self.lookups, &self.formats)
    }
}

/// Cut a `//` comment, honoring `\` escapes. Trailing whitespace before a
/// removed comment is dropped too.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'/' if bytes.get(i + 1) == Some(&b'/') => return line[..i].trim_end(),
            _ => i += 1,
        }
    }
    line
}

/// Resolve `\x` escapes. A trailing `\` is dropped.
fn unescape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                output.push(escaped);
            }
        } else {
            output.push(c);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryReader;
    use std::sync::Arc;

    fn context() -> (Arc<MockMemoryReader>, EvaluationContext) {
        let reader = Arc::new(MockMemoryReader::from_bytes(&[0x00, 0x12, 0x34, 0xAB, 0x56]));
        let ctx = EvaluationContext::new(reader.clone());
        (reader, ctx)
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("At here // text"), "At here");
        assert_eq!(strip_comment("What \\// Where"), "What \\// Where");
        assert_eq!(strip_comment("What \\/// Where"), "What \\/");
        assert_eq!(strip_comment("keep trailing  "), "keep trailing  ");
        assert_eq!(strip_comment("// all comment"), "");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\\\b"), "a\\b");
        assert_eq!(unescape("a\\"), "a");
        assert_eq!(unescape(" x "), " x ");
    }

    #[test]
    fn test_lookup_entries() {
        let mut lookup = Lookup::new("Location");
        lookup.add_line("0=Zero");
        lookup.add_line("0x10=Sixteen");
        lookup.add_line("bogus=Nope");
        lookup.add_line("no separator");
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(16), "Sixteen");
        assert_eq!(lookup.get(1), "");

        lookup.add_line("*=Star");
        assert_eq!(lookup.get(1), "Star");
    }

    #[test]
    fn test_display_segments() {
        let display = DisplayString::parse("At @Location(0xH0000), \\@home");
        assert_eq!(display.segments.len(), 3);
        assert_eq!(display.segments[0], Segment::Text("At ".to_string()));
        assert!(matches!(
            &display.segments[1],
            Segment::Tag { name, formula: Some(_) } if name == "Location"
        ));
        assert_eq!(display.segments[2], Segment::Text(", @home".to_string()));
    }

    #[test]
    fn test_bad_tag_formula_renders_empty() {
        let (_reader, ctx) = context();
        let mut rp = RichPresenceInterpreter::parse(
            "Format:Points\nFormatType=VALUE\n\nDisplay:\n[@Points(BANANA)]",
        );
        assert_eq!(rp.get_rich_presence_string(&ctx), "[]");
    }

    #[test]
    fn test_format_types() {
        let rp = RichPresenceInterpreter::parse(
            "Format:Time\nFormatType=FRAMES\n\nFormat:Score\nFormatType=SCORE\n\nDisplay:\nx",
        );
        assert_eq!(rp.format("Time"), Some(ValueFormat::TimeFrames));
        assert_eq!(rp.format("Score"), Some(ValueFormat::Score));
        assert_eq!(rp.format("Missing"), None);
    }

    #[test]
    fn test_time_format_uses_context_frame_rate() {
        let reader = Arc::new(MockMemoryReader::from_bytes(&[125]));
        let ctx = EvaluationContext::new(reader).with_frames_per_second(50);
        let mut rp = RichPresenceInterpreter::parse(
            "Format:Time\nFormatType=FRAMES\n\nDisplay:\n@Time(0xH0000)",
        );
        assert_eq!(rp.get_rich_presence_string(&ctx), "00:02.50");
    }

    #[test]
    fn test_disabled_renders_nothing() {
        let (_reader, ctx) = context();
        let mut rp = RichPresenceInterpreter::parse("Lookup:Location\n0=Zero");
        assert!(!rp.enabled());
        assert_eq!(rp.get_rich_presence_string(&ctx), "");
    }

    #[test]
    fn test_reload_replaces_script() {
        let (_reader, ctx) = context();
        let mut rp = RichPresenceInterpreter::parse("Display:\nFirst");
        assert_eq!(rp.get_rich_presence_string(&ctx), "First");
        assert!(rp.load("Display:\nSecond"));
        assert_eq!(rp.get_rich_presence_string(&ctx), "Second");
        assert!(!rp.load(""));
    }
}
