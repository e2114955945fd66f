use super::*;

fn hms(h: u32, m: u32, s: u32) -> ClockTime {
    ClockTime::from_seconds(h * 3600 + m * 60 + s)
}

#[test]
fn elapsed_within_one_day() {
    let start = hms(9, 15, 0);
    let end = hms(10, 0, 30);
    assert_eq!(start.elapsed_until(end), Duration::from_secs(45 * 60 + 30));
}

#[test]
fn elapsed_wraps_past_midnight() {
    let start = hms(23, 59, 50);
    let end = hms(0, 0, 10);
    assert_eq!(start.elapsed_until(end), Duration::from_secs(20));
}

#[test]
fn elapsed_never_negative_over_whole_day() {
    for start in (0..SECONDS_PER_DAY).step_by(3607) {
        for end in (0..SECONDS_PER_DAY).step_by(4211) {
            let d = ClockTime::from_seconds(start).elapsed_until(ClockTime::from_seconds(end));
            assert!(d < Duration::from_secs(u64::from(SECONDS_PER_DAY)));
        }
    }
}

#[test]
fn same_instant_is_zero() {
    let t = hms(12, 0, 0);
    assert_eq!(t.elapsed_until(t), Duration::ZERO);
}

#[test]
fn from_seconds_wraps_days() {
    assert_eq!(ClockTime::from_seconds(SECONDS_PER_DAY + 5).seconds(), 5);
}

#[test]
fn now_is_within_a_day() {
    assert!(ClockTime::now().seconds() < SECONDS_PER_DAY);
}

#[test]
fn display_is_zero_padded() {
    assert_eq!(hms(7, 3, 9).to_string(), "07:03:09");
}

#[test]
fn minutes_seconds_format() {
    assert_eq!(format_minutes_seconds(Duration::from_secs(0)), "0m 0s");
    assert_eq!(format_minutes_seconds(Duration::from_millis(125_900)), "2m 5s");
}

#[test]
fn stopwatch_is_monotonic() {
    let sw = Stopwatch::start();
    let a = sw.elapsed();
    let b = sw.elapsed();
    assert!(b >= a);
}

#[test]
fn wall_clock_span_is_under_a_day() {
    let sw = Stopwatch::start();
    let (now, span) = sw.wall_clock();
    assert!(now.seconds() < SECONDS_PER_DAY);
    assert!(span < Duration::from_secs(u64::from(SECONDS_PER_DAY)));
}
