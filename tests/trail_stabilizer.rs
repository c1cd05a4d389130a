use gesture_flow::gestures::filter::FilterConfig;
use gesture_flow::gestures::trail::{TrailConfig, TrailStabilizer};
use gesture_flow::gestures::Point;
use std::time::{Duration, Instant};

fn stabilized() -> TrailStabilizer {
    TrailStabilizer::new(TrailConfig::default(), FilterConfig::pointer()).expect("valid config")
}

fn past_deadline(trail: &TrailStabilizer) -> Instant {
    Instant::now() + Duration::from_millis(trail.config().catch_up_delay_ms + 1)
}

#[test]
fn filtered_and_raw_coordinates_are_both_kept() {
    let mut trail = stabilized();
    trail.show();
    for i in 0..10 {
        trail.add_point(Point::with_timestamp(i as f32 * 20.0, 0.0, i as f64 * 16.0));
    }

    let last = trail.points().last().copied().expect("points");
    assert_eq!(last.raw_x, 180.0);
    assert!(last.x < last.raw_x, "filtered x should lag the raw position");
}

#[test]
fn stabilization_off_stores_raw_in_both_fields() {
    let config = TrailConfig {
        stabilization: false,
        ..TrailConfig::default()
    };
    let mut trail = TrailStabilizer::new(config, FilterConfig::pointer()).expect("valid config");
    trail.show();
    trail.add_point(Point::new(10.0, 20.0));
    trail.add_point(Point::new(30.0, 40.0));

    for point in trail.points() {
        assert_eq!(point.x, point.raw_x);
        assert_eq!(point.y, point.raw_y);
    }
}

#[test]
fn duplicate_flood_stops_reaching_the_filter() {
    let mut trail = stabilized();
    trail.show();
    trail.add_point(Point::with_timestamp(5.0, 5.0, 0.0));

    let limit = trail.config().duplicate_point_limit;
    for i in 0..(limit + 5) {
        trail.add_point(Point::with_timestamp(10.0, 10.0, 16.0 + i as f64 * 16.0));
    }

    // First occurrence plus limit-1 tolerated repeats; the rest are dropped.
    let accepted = trail.points().len();
    let frozen = trail.points().last().copied().expect("points");

    for i in 0..5 {
        trail.add_point(Point::with_timestamp(10.0, 10.0, 500.0 + i as f64 * 16.0));
    }
    assert_eq!(trail.points().len(), accepted);
    assert_eq!(trail.points().last().copied(), Some(frozen));
}

#[test]
fn short_duplicate_runs_still_pass_through() {
    let mut trail = stabilized();
    trail.show();
    trail.add_point(Point::with_timestamp(5.0, 5.0, 0.0));

    // First occurrence is not a repeat, so `limit` identical coordinates in
    // a row are all accepted; only the run beyond that gets dropped.
    let limit = trail.config().duplicate_point_limit;
    for i in 0..limit {
        trail.add_point(Point::with_timestamp(10.0, 10.0, 16.0 + i as f64 * 16.0));
    }
    assert_eq!(trail.points().len(), 1 + limit as usize);
}

#[test]
fn catch_up_converges_trail_onto_pointer() {
    let mut trail = stabilized();
    trail.show();
    for i in 0..10 {
        trail.add_point(Point::with_timestamp(i as f32 * 20.0, 0.0, i as f64 * 16.0));
    }
    let before = trail.points().last().copied().expect("points");
    assert!(before.raw_x - before.x > trail.config().catch_up_tolerance_px);

    let mut fired = 0;
    for _ in 0..50 {
        if !trail.tick(past_deadline(&trail)) {
            break;
        }
        fired += 1;
    }
    assert!(fired > 0, "catch-up never fired");

    let last = trail.points().last().copied().expect("points");
    let dx = last.x - last.raw_x;
    let dy = last.y - last.raw_y;
    let tolerance = trail.config().catch_up_tolerance_px;
    assert!(dx * dx + dy * dy <= tolerance * tolerance);
}

#[test]
fn catch_up_is_noop_within_tolerance() {
    let mut trail = stabilized();
    trail.show();
    // Single point: the filter seeds on it, so filtered == raw.
    trail.add_point(Point::with_timestamp(10.0, 10.0, 0.0));
    let count = trail.points().len();

    assert!(!trail.tick(past_deadline(&trail)));
    assert_eq!(trail.points().len(), count);
    // Deadline cleared: nothing left to fire.
    assert!(!trail.tick(past_deadline(&trail)));
}

#[test]
fn tick_before_deadline_does_nothing() {
    let mut trail = stabilized();
    trail.show();
    for i in 0..10 {
        trail.add_point(Point::with_timestamp(i as f32 * 20.0, 0.0, i as f64 * 16.0));
    }
    let count = trail.points().len();
    assert!(!trail.tick(Instant::now()));
    assert_eq!(trail.points().len(), count);
}

#[test]
fn hide_cancels_pending_redraw_and_catch_up() {
    let mut trail = stabilized();
    trail.show();
    for i in 0..10 {
        trail.add_point(Point::with_timestamp(i as f32 * 20.0, 0.0, i as f64 * 16.0));
    }

    trail.hide();
    assert!(!trail.is_visible());
    assert!(trail.points().is_empty());
    assert!(trail.take_redraw().is_none());
    assert!(!trail.tick(Instant::now() + Duration::from_secs(10)));
}

#[test]
fn show_starts_a_clean_session() {
    let mut trail = stabilized();
    trail.show();
    trail.add_point(Point::with_timestamp(50.0, 50.0, 0.0));
    trail.add_point(Point::with_timestamp(60.0, 60.0, 16.0));

    trail.show();
    assert!(trail.points().is_empty());
    assert!(trail.take_redraw().is_none());

    // The filter reseeds: the first point of the new session passes through.
    trail.add_point(Point::with_timestamp(200.0, 200.0, 0.0));
    let first = trail.points()[0];
    assert_eq!((first.x, first.y), (200.0, 200.0));
}

#[test]
fn redraw_is_batched_per_frame() {
    let mut trail = stabilized();
    trail.show();
    for i in 0..5 {
        trail.add_point(Point::with_timestamp(i as f32 * 10.0, 0.0, i as f64 * 16.0));
    }
    let path = trail.take_redraw().expect("pending redraw");
    assert!(!path.is_empty());
    assert!(trail.take_redraw().is_none());

    trail.add_point(Point::with_timestamp(100.0, 0.0, 100.0));
    assert!(trail.take_redraw().is_some());
}

#[test]
fn invalid_config_fails_fast() {
    let config = TrailConfig {
        duplicate_point_limit: 0,
        ..TrailConfig::default()
    };
    assert!(TrailStabilizer::new(config, FilterConfig::pointer()).is_err());

    let config = TrailConfig {
        catch_up_delay_ms: 0,
        ..TrailConfig::default()
    };
    assert!(TrailStabilizer::new(config, FilterConfig::pointer()).is_err());

    let bad_filter = FilterConfig {
        dcutoff: 0.0,
        ..FilterConfig::pointer()
    };
    assert!(TrailStabilizer::new(TrailConfig::default(), bad_filter).is_err());
}
