//! Per-frame runtime
//!
//! Owns the loaded achievements, leaderboards and rich presence script for one
//! game, tests them once per frame and reports what changed as
//! [`RuntimeEvent`]s.

use std::path::Path;
use std::sync::Arc;

use crate::achievement::Achievement;
use crate::config::RuntimeConfig;
use crate::error::{CheevosError, Result};
use crate::events::{EventCallback, EventHandler, RuntimeEvent, TimedEvent};
use crate::game_data::GamePatch;
use crate::leaderboard::{Leaderboard, LeaderboardEvent};
use crate::memory::{EvaluationContext, MemoryReader};
use crate::rich_presence::RichPresenceInterpreter;

#[derive(Debug, Default)]
pub struct Runtime {
    config: RuntimeConfig,
    title: String,
    achievements: Vec<Achievement>,
    leaderboards: Vec<Leaderboard>,
    rich_presence: Option<RichPresenceInterpreter>,
    events: EventHandler,
    frame: u64,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Build an evaluation context for this runtime's memory layout
    pub fn context(&self, reader: Arc<dyn MemoryReader>) -> EvaluationContext {
        EvaluationContext::from_config(reader, &self.config)
    }

    /// Replace everything loaded with the contents of a game document
    pub fn load_game_data(&mut self, patch: &GamePatch) {
        self.title = patch.title.clone();
        self.achievements = patch.achievements.iter().map(|a| a.to_achievement()).collect();
        self.leaderboards = patch.leaderboards.iter().map(|l| l.to_leaderboard()).collect();
        self.rich_presence = patch.rich_presence().map(RichPresenceInterpreter::parse);
        self.frame = 0;

        log::info!(
            "Loaded {} ({} achievements, {} leaderboards, rich presence: {})",
            if self.title.is_empty() { "game" } else { &self.title },
            self.achievements.len(),
            self.leaderboards.len(),
            self.rich_presence.as_ref().is_some_and(|rp| rp.enabled())
        );
    }

    pub fn load_game_file(&mut self, path: &Path) -> Result<()> {
        let patch = GamePatch::from_file(path)?;
        self.load_game_data(&patch);
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_achievement(&mut self, achievement: Achievement) {
        self.achievements.push(achievement);
    }

    pub fn add_leaderboard(&mut self, leaderboard: Leaderboard) {
        self.leaderboards.push(leaderboard);
    }

    /// Install a rich presence script. Returns whether it has a display.
    pub fn set_rich_presence(&mut self, script: &str) -> bool {
        let interpreter = RichPresenceInterpreter::parse(script);
        let enabled = interpreter.enabled();
        self.rich_presence = Some(interpreter);
        enabled
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn leaderboards(&self) -> &[Leaderboard] {
        &self.leaderboards
    }

    pub fn achievement(&self, id: u32) -> Result<&Achievement> {
        self.achievements
            .iter()
            .find(|a| a.id == id)
            .ok_or(CheevosError::UnknownAchievement(id))
    }

    pub fn achievement_mut(&mut self, id: u32) -> Result<&mut Achievement> {
        self.achievements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(CheevosError::UnknownAchievement(id))
    }

    pub fn leaderboard(&self, id: u32) -> Result<&Leaderboard> {
        self.leaderboards
            .iter()
            .find(|l| l.id() == id)
            .ok_or(CheevosError::UnknownLeaderboard(id))
    }

    pub fn leaderboard_mut(&mut self, id: u32) -> Result<&mut Leaderboard> {
        self.leaderboards
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or(CheevosError::UnknownLeaderboard(id))
    }

    /// Activate an achievement, clearing any hits it had
    pub fn activate_achievement(&mut self, id: u32) -> Result<()> {
        let achievement = self.achievement_mut(id)?;
        achievement.reset();
        achievement.set_active(true);
        Ok(())
    }

    pub fn deactivate_achievement(&mut self, id: u32) -> Result<()> {
        self.achievement_mut(id)?.set_active(false);
        Ok(())
    }

    /// Add a listener for runtime events
    pub fn on_event(&mut self, callback: EventCallback) {
        self.events.on_event(callback);
    }

    /// Number of frames processed since the game was loaded
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Test every active achievement and every leaderboard once
    pub fn do_frame(&mut self, ctx: &EvaluationContext) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();

        for achievement in self.achievements.iter_mut().filter(|a| a.is_active()) {
            let was_primed = achievement.is_primed();
            let had_progress = achievement.has_progress();

            if achievement.test(ctx) {
                achievement.set_active(false);
                log::info!("Achievement {} triggered: {}", achievement.id, achievement.title);
                events.push(RuntimeEvent::AchievementTriggered {
                    id: achievement.id,
                    hardcore: self.config.hardcore,
                });
                continue;
            }

            if self.config.pause_on_reset && had_progress && achievement.last_outcome().was_reset {
                log::debug!("Achievement {} reset", achievement.id);
                events.push(RuntimeEvent::AchievementReset { id: achievement.id });
            }

            match (was_primed, achievement.is_primed()) {
                (false, true) => events.push(RuntimeEvent::AchievementPrimed { id: achievement.id }),
                (true, false) => events.push(RuntimeEvent::AchievementUnprimed { id: achievement.id }),
                _ => {}
            }
        }

        for leaderboard in &mut self.leaderboards {
            let id = leaderboard.id();
            match leaderboard.test(ctx) {
                Some(LeaderboardEvent::Started) => events.push(RuntimeEvent::LeaderboardStarted { id }),
                Some(LeaderboardEvent::Canceled) => events.push(RuntimeEvent::LeaderboardCanceled { id }),
                Some(LeaderboardEvent::Submitted(score)) => {
                    let formatted = leaderboard
                        .format()
                        .format_with_frame_rate(score, ctx.frames_per_second());
                    events.push(RuntimeEvent::LeaderboardSubmitted { id, score, formatted });
                }
                None => {}
            }
        }

        if self.events.has_listeners() {
            for event in &events {
                self.events.emit(&TimedEvent::new(event.clone(), self.frame));
            }
        }

        self.frame += 1;
        events
    }

    /// Current rich presence text, or an empty string without a script
    pub fn rich_presence_string(&mut self, ctx: &EvaluationContext) -> String {
        match &mut self.rich_presence {
            Some(rp) if rp.enabled() => rp.get_rich_presence_string(ctx),
            _ => String::new(),
        }
    }

    /// Progress of every achievement, concatenated
    pub fn save_progress(&self, user: &str) -> String {
        self.achievements
            .iter()
            .map(|a| a.create_state_string(user))
            .collect()
    }

    /// Restore progress written by [`Runtime::save_progress`]
    pub fn load_progress(&mut self, progress: &str, user: &str) {
        let mut rest = progress;
        loop {
            let before = rest.len();
            for achievement in &mut self.achievements {
                rest = achievement.parse_state_string(rest, user);
            }
            if rest.is_empty() || rest.len() == before {
                break;
            }
        }

        if !rest.is_empty() {
            log::debug!("Ignoring unmatched progress: {}", rest);
        }
    }

    /// Clear all hits and return leaderboards to waiting
    pub fn reset(&mut self) {
        for achievement in &mut self.achievements {
            achievement.reset();
        }
        for leaderboard in &mut self.leaderboards {
            leaderboard.reset();
        }
    }
}
