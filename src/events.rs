//! Events emitted by the runtime

use std::time::Instant;

/// Something that happened while evaluating a frame
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// Conditions held; the achievement is now inactive
    AchievementTriggered { id: u32, hardcore: bool },
    /// Every non-Trigger condition holds
    AchievementPrimed { id: u32 },
    AchievementUnprimed { id: u32 },
    /// A ResetIf cleared an achievement that had progress
    AchievementReset { id: u32 },
    LeaderboardStarted { id: u32 },
    LeaderboardCanceled { id: u32 },
    LeaderboardSubmitted {
        id: u32,
        score: u32,
        /// Score rendered with the leaderboard's format
        formatted: String,
    },
}

impl RuntimeEvent {
    /// Achievement or leaderboard this event concerns
    pub fn id(&self) -> u32 {
        match self {
            RuntimeEvent::AchievementTriggered { id, .. }
            | RuntimeEvent::AchievementPrimed { id }
            | RuntimeEvent::AchievementUnprimed { id }
            | RuntimeEvent::AchievementReset { id }
            | RuntimeEvent::LeaderboardStarted { id }
            | RuntimeEvent::LeaderboardCanceled { id }
            | RuntimeEvent::LeaderboardSubmitted { id, .. } => *id,
        }
    }

    pub fn is_leaderboard(&self) -> bool {
        matches!(
            self,
            RuntimeEvent::LeaderboardStarted { .. }
                | RuntimeEvent::LeaderboardCanceled { .. }
                | RuntimeEvent::LeaderboardSubmitted { .. }
        )
    }
}

/// An event with the frame it happened on
#[derive(Debug, Clone)]
pub struct TimedEvent {
    pub event: RuntimeEvent,
    /// Frame counter at the time of the event
    pub frame: u64,
    pub timestamp: Instant,
}

impl TimedEvent {
    pub fn new(event: RuntimeEvent, frame: u64) -> Self {
        Self {
            event,
            frame,
            timestamp: Instant::now(),
        }
    }
}

/// Callback type for runtime events
pub type EventCallback = Box<dyn Fn(&TimedEvent) + Send + Sync>;

/// Event handler that can have multiple listeners
pub struct EventHandler {
    callbacks: Vec<EventCallback>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a callback for runtime events
    pub fn on_event(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    /// Emit an event to all listeners
    pub fn emit(&self, event: &TimedEvent) {
        for callback in &self.callbacks {
            callback(event);
        }
    }

    /// Check if there are any listeners
    pub fn has_listeners(&self) -> bool {
        !self.callbacks.is_empty()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("listeners", &self.callbacks.len())
            .finish()
    }
}
