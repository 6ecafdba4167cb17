//! End-to-end runtime behavior: game data, events and saved progress

use nyacore_cheevos::{
    Achievement, GamePatch, MockMemoryReader, Runtime, RuntimeConfig, RuntimeEvent,
};
use std::sync::{Arc, Mutex};

const GAME: &str = r#"{
    "ID": 1,
    "Title": "Test Game",
    "RichPresencePatch": "Lookup:Stage\n0=Intro\n1=Forest\n\nDisplay:\n?0xH0003=1?Paused\nIn @Stage(0xH0000)",
    "Achievements": [
        {"ID": 10, "Title": "Forest", "MemAddr": "0xH0000=1", "Points": 5, "Flags": 3},
        {"ID": 11, "Title": "Patient", "MemAddr": "0xH0001=1.3._R:0xH0002=1", "Points": 10, "Flags": 3},
        {"ID": 12, "Title": "Draft", "MemAddr": "0xH0000=0", "Flags": 5}
    ],
    "Leaderboards": [
        {"ID": 20, "Title": "Speed", "Mem": "STA:0xH0000=1::CAN:0xH0002=1::SUB:0xH0000=2::VAL:0xH0004", "Format": "SCORE"}
    ]
}"#;

fn setup(config: RuntimeConfig) -> (Arc<MockMemoryReader>, Runtime) {
    let _ = env_logger::builder().is_test(true).try_init();
    let patch = GamePatch::from_json(GAME).unwrap();
    let mut runtime = Runtime::new(config);
    runtime.load_game_data(&patch);
    (Arc::new(MockMemoryReader::from_bytes(&[0; 8])), runtime)
}

#[test]
fn test_load_game_data() {
    let (_reader, runtime) = setup(RuntimeConfig::default());
    assert_eq!(runtime.title(), "Test Game");
    assert_eq!(runtime.achievements().len(), 3);
    assert_eq!(runtime.leaderboards().len(), 1);
    assert!(runtime.achievement(10).unwrap().is_active());
    // unofficial achievements are loaded inactive
    assert!(!runtime.achievement(12).unwrap().is_active());
}

#[test]
fn test_achievement_and_leaderboard_events() {
    let (reader, mut runtime) = setup(RuntimeConfig::default());
    let ctx = runtime.context(reader.clone());

    assert!(runtime.do_frame(&ctx).is_empty());

    reader.write_u8(0, 1);
    assert_eq!(
        runtime.do_frame(&ctx),
        vec![
            RuntimeEvent::AchievementTriggered { id: 10, hardcore: false },
            RuntimeEvent::LeaderboardStarted { id: 20 },
        ]
    );

    reader.write_u8(0, 2);
    reader.write_u8(4, 42);
    assert_eq!(
        runtime.do_frame(&ctx),
        vec![RuntimeEvent::LeaderboardSubmitted {
            id: 20,
            score: 42,
            formatted: "000042 Points".to_string(),
        }]
    );
}

#[test]
fn test_hardcore_flag_is_forwarded() {
    let config = RuntimeConfig {
        hardcore: true,
        ..Default::default()
    };
    let (reader, mut runtime) = setup(config);
    let ctx = runtime.context(reader.clone());

    reader.write_u8(0, 1);
    let events = runtime.do_frame(&ctx);
    assert!(events.contains(&RuntimeEvent::AchievementTriggered { id: 10, hardcore: true }));
}

#[test]
fn test_listeners_receive_events() {
    let (reader, mut runtime) = setup(RuntimeConfig::default());
    let ctx = runtime.context(reader.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    runtime.on_event(Box::new(move |timed| {
        sink.lock().unwrap().push((timed.frame, timed.event.clone()));
    }));

    runtime.do_frame(&ctx);
    reader.write_u8(0, 1);
    runtime.do_frame(&ctx);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], (1, RuntimeEvent::AchievementTriggered { id: 10, hardcore: false }));
    assert_eq!(seen[1], (1, RuntimeEvent::LeaderboardStarted { id: 20 }));
}

#[test]
fn test_reset_event_needs_progress() {
    let config = RuntimeConfig {
        pause_on_reset: true,
        ..Default::default()
    };
    let (reader, mut runtime) = setup(config);
    let ctx = runtime.context(reader.clone());

    // reset with no hits yet is silent
    reader.write_u8(2, 1);
    assert!(runtime.do_frame(&ctx).is_empty());

    reader.write_u8(2, 0);
    reader.write_u8(1, 1);
    assert!(runtime.do_frame(&ctx).is_empty());
    assert!(runtime.achievement(11).unwrap().has_progress());

    reader.write_u8(2, 1);
    assert_eq!(runtime.do_frame(&ctx), vec![RuntimeEvent::AchievementReset { id: 11 }]);
    assert!(!runtime.achievement(11).unwrap().has_progress());
}

#[test]
fn test_primed_events() {
    let _ = env_logger::builder().is_test(true).try_init();
    let reader = Arc::new(MockMemoryReader::from_bytes(&[0, 0]));
    let mut runtime = Runtime::new(RuntimeConfig::default());
    runtime.add_achievement(Achievement::new(30, "0xH0000=1_T:0xH0001=1"));
    let ctx = runtime.context(reader.clone());

    reader.write_u8(0, 1);
    assert_eq!(runtime.do_frame(&ctx), vec![RuntimeEvent::AchievementPrimed { id: 30 }]);

    reader.write_u8(0, 0);
    assert_eq!(runtime.do_frame(&ctx), vec![RuntimeEvent::AchievementUnprimed { id: 30 }]);

    reader.write_u8(0, 1);
    runtime.do_frame(&ctx);
    reader.write_u8(1, 1);
    assert_eq!(
        runtime.do_frame(&ctx),
        vec![RuntimeEvent::AchievementTriggered { id: 30, hardcore: false }]
    );
}

#[test]
fn test_rich_presence() {
    let (reader, mut runtime) = setup(RuntimeConfig::default());
    let ctx = runtime.context(reader.clone());
    assert_eq!(runtime.rich_presence_string(&ctx), "In Intro");

    reader.write_u8(0, 1);
    assert_eq!(runtime.rich_presence_string(&ctx), "In Forest");

    reader.write_u8(3, 1);
    assert_eq!(runtime.rich_presence_string(&ctx), "Paused");
}

#[test]
fn test_progress_round_trip() {
    let (reader, mut runtime) = setup(RuntimeConfig::default());
    let ctx = runtime.context(reader.clone());

    reader.write_u8(1, 1);
    runtime.do_frame(&ctx);
    runtime.do_frame(&ctx);
    let progress = runtime.save_progress("player");

    let (_reader, mut restored) = setup(RuntimeConfig::default());
    restored.load_progress(&progress, "player");
    let hits = restored.achievement(11).unwrap().conditions().core().conditions()[0].current_hits();
    assert_eq!(hits, 2);

    // someone else's progress is not applied
    let (_reader, mut other) = setup(RuntimeConfig::default());
    other.load_progress(&progress, "intruder");
    assert!(!other.achievement(11).unwrap().has_progress());
}

#[test]
fn test_activate_clears_hits() {
    let (reader, mut runtime) = setup(RuntimeConfig::default());
    let ctx = runtime.context(reader.clone());

    reader.write_u8(1, 1);
    runtime.do_frame(&ctx);
    runtime.deactivate_achievement(11).unwrap();
    runtime.do_frame(&ctx);
    assert_eq!(
        runtime.achievement(11).unwrap().conditions().core().conditions()[0].current_hits(),
        1
    );

    runtime.activate_achievement(11).unwrap();
    assert!(!runtime.achievement(11).unwrap().has_progress());
    assert!(runtime.activate_achievement(99).is_err());
}

#[test]
fn test_region_translation() {
    let config = RuntimeConfig::from_toml(
        r#"
[[memory.regions]]
start = 0
end = 0xFF
real_address = 0x1000
"#,
    )
    .unwrap();
    let _ = env_logger::builder().is_test(true).try_init();
    let reader = Arc::new(MockMemoryReader::new());
    reader.write_memory_block(0x1000, &[1, 0]);

    let mut runtime = Runtime::new(config);
    runtime.add_achievement(Achievement::new(40, "0xH0000=1"));
    let ctx = runtime.context(reader);
    assert_eq!(
        runtime.do_frame(&ctx),
        vec![RuntimeEvent::AchievementTriggered { id: 40, hardcore: false }]
    );
}
