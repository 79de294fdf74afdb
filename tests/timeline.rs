use chrono::{Duration, TimeZone, Utc};

use cronguard::supervise::Timeline;

#[test]
fn test_entries_never_go_backwards() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let mut timeline = Timeline::new();

    timeline.push_at(t0, "first");
    // Wall clock stepped back.
    timeline.push_at(t0 - Duration::seconds(30), "second");
    timeline.push_at(t0 + Duration::seconds(5), "third");

    let at: Vec<_> = timeline.entries().iter().map(|e| e.at).collect();
    assert_eq!(at, vec![t0, t0, t0 + Duration::seconds(5)]);
}

#[test]
fn test_format_renders_millisecond_bullets() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let mut timeline = Timeline::new();
    timeline.push_at(t0, "task started (PID 42)");
    timeline.push_at(t0 + Duration::milliseconds(1500), "timed out");

    assert_eq!(
        timeline.format(),
        "  * 2024-01-01 12:00:00.000 - task started (PID 42)\n  * 2024-01-01 12:00:01.500 - timed out"
    );
}

#[test]
fn test_empty_timeline_formats_to_nothing() {
    let timeline = Timeline::new();
    assert!(timeline.is_empty());
    assert_eq!(timeline.format(), "");
}
