//! Saving and restoring achievement progress

use nyacore_cheevos::{Achievement, Condition, MemSize, Operand};

fn achievement(definition: &str) -> Achievement {
    let _ = env_logger::builder().is_test(true).try_init();
    Achievement::new(12345, definition)
}

fn condition_mut(achievement: &mut Achievement, group: usize, index: usize) -> &mut Condition {
    achievement
        .conditions_mut()
        .group_mut(group)
        .and_then(|g| g.condition_mut(index))
        .expect("condition exists")
}

fn condition(achievement: &Achievement, group: usize, index: usize) -> &Condition {
    &achievement
        .conditions()
        .groups()
        .nth(group)
        .expect("group exists")
        .conditions()[index]
}

/// Set hits and raw source values on one condition
fn prime(achievement: &mut Achievement, group: usize, index: usize, hits: u32, source: (u32, u32)) {
    let condition = condition_mut(achievement, group, index);
    condition.override_current_hits(hits);
    condition.source.restore_state(source.0, source.1);
}

#[test]
fn test_state_empty() {
    let achievement = Achievement::default();
    assert_eq!(
        achievement.create_state_string("user1"),
        "0:0:a9bf5b6918bb43ec1d430f09d6606fbd:d41d8cd98f00b204e9800998ecf8427e:"
    );
}

#[test]
fn test_state_simple() {
    let mut ach = achievement("0xh1234=6");
    prime(&mut ach, 0, 0, 4, (12, 12));

    let state = ach.create_state_string("user1");
    assert!(state.starts_with("12345:1:4:12:12:6:6:"));

    // another user's progress only clears hits
    assert_eq!(ach.parse_state_string(&state, "user2"), "");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 0);
    assert_eq!(condition(&ach, 0, 0).source.state_values(), (12, 12));

    assert_eq!(ach.parse_state_string(&state, "user1"), "");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 4);
    assert_eq!(condition(&ach, 0, 0).source.state_values(), (12, 12));
}

#[test]
fn test_state_delta() {
    let mut ach = achievement("0xh1234=d0x1234");
    prime(&mut ach, 0, 0, 4, (12, 11));
    condition_mut(&mut ach, 0, 0).target.restore_state(12, 11);

    let state = ach.create_state_string("user1");
    ach.reset();
    condition_mut(&mut ach, 0, 0).source.restore_state(0, 0);
    condition_mut(&mut ach, 0, 0).target.restore_state(0, 0);

    assert_eq!(ach.parse_state_string(&state, "user1"), "");
    let restored = condition(&ach, 0, 0);
    assert_eq!(restored.current_hits(), 4);
    assert_eq!(restored.source.state_values(), (12, 11));
    assert_eq!(restored.target.state_values(), (12, 11));
}

#[test]
fn test_state_multiple_conditions() {
    let mut ach = achievement("0xh1234=6.1._0xh2345!=d0xh2345_R:0xh3456=7");
    prime(&mut ach, 0, 0, 1, (12, 12));
    prime(&mut ach, 0, 1, 0, (32, 32));
    prime(&mut ach, 0, 2, 1700, (0, 0));

    let state = ach.create_state_string("user1");
    ach.reset();
    assert!(!ach.has_progress());

    ach.parse_state_string(&state, "user1");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 1);
    assert_eq!(condition(&ach, 0, 1).current_hits(), 0);
    assert_eq!(condition(&ach, 0, 2).current_hits(), 1700);
}

#[test]
fn test_state_multiple_groups() {
    let mut ach = achievement("0xh1234=6.1._0xh2345!=d0xh2345SR:0xh3456=7S0xh4567=0xh5678");
    prime(&mut ach, 0, 0, 1, (12, 12));
    prime(&mut ach, 0, 1, 0, (32, 32));
    prime(&mut ach, 1, 0, 1700, (0, 0));
    prime(&mut ach, 2, 0, 11, (17, 17));
    condition_mut(&mut ach, 2, 0).target.restore_state(18, 18);

    let state = ach.create_state_string("user1");
    ach.reset();
    assert!(!ach.has_progress());

    ach.parse_state_string(&state, "user1");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 1);
    assert_eq!(condition(&ach, 0, 1).current_hits(), 0);
    assert_eq!(condition(&ach, 1, 0).current_hits(), 1700);
    assert_eq!(condition(&ach, 2, 0).current_hits(), 11);
    assert_eq!(condition(&ach, 2, 0).target.state_values(), (18, 18));
}

#[test]
fn test_state_leaves_next_achievement() {
    let mut ach = achievement("0xh1234=6.1._0xh2345!=d0xh2345_R:0xh3456=7");
    prime(&mut ach, 0, 0, 1, (12, 12));
    prime(&mut ach, 0, 2, 1700, (0, 0));

    let state = ach.create_state_string("user1") + "54321:0:junk:junk";
    ach.reset();

    let rest = ach.parse_state_string(&state, "user1");
    assert_eq!(rest, "54321:0:junk:junk");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 1);
    assert_eq!(condition(&ach, 0, 2).current_hits(), 1700);
}

#[test]
fn test_state_achievement_modified() {
    let mut ach = achievement("0xh1234=6");
    prime(&mut ach, 0, 0, 4, (12, 12));
    let state = ach.create_state_string("user1");

    // a changed definition fails the checksum and only clears hits
    condition_mut(&mut ach, 0, 0).source = Operand::address(MemSize::EightBit, 0x2345);
    ach.parse_state_string(&state, "user1");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 0);
}

#[test]
fn test_state_truncated_is_ignored() {
    let mut ach = achievement("0xh1234=6");
    prime(&mut ach, 0, 0, 4, (12, 12));

    let truncated = "12345:1:4:12";
    assert_eq!(ach.parse_state_string(truncated, "user1"), truncated);
    assert_eq!(condition(&ach, 0, 0).current_hits(), 4);
}

#[test]
fn test_state_oversized_count_is_ignored() {
    let mut ach = achievement("0xH1234=5");
    prime(&mut ach, 0, 0, 4, (12, 12));

    let input = "12345:4294967295:0:0:0:0:0:";
    assert_eq!(ach.parse_state_string(input, "user1"), input);
    assert_eq!(condition(&ach, 0, 0).current_hits(), 4);
}

#[test]
fn test_state_non_numeric_count_is_ignored() {
    let mut ach = achievement("0xH1234=5");
    prime(&mut ach, 0, 0, 4, (12, 12));

    let input = "12345:many:4:12:12:5:5:abc:def:";
    assert_eq!(ach.parse_state_string(input, "user1"), input);
    assert_eq!(condition(&ach, 0, 0).current_hits(), 4);
}

#[test]
fn test_state_zero_count_clears_hits() {
    let mut ach = achievement("0xH1234=5");
    prime(&mut ach, 0, 0, 4, (12, 12));

    // the group shape does not match, so the entry is consumed as a soft reset
    assert_eq!(ach.parse_state_string("12345:0:abc:def:54321:0:", "user1"), "54321:0:");
    assert_eq!(condition(&ach, 0, 0).current_hits(), 0);
    assert_eq!(condition(&ach, 0, 0).source.state_values(), (12, 12));
}
