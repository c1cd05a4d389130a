use crate::gestures::recognizer::{Direction, GestureRecognizer};
use crate::gestures::trail::{PathSegment, TrailStabilizer};
use crate::gestures::Point;
use crate::settings::GestureSettings;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Receives session events for interpretation into host commands. The core
/// never decides what a pattern means; implementations own that mapping.
pub trait ActionDispatcher {
    fn gesture_started(&mut self) {}
    fn direction_changed(&mut self, _direction: Direction, _pattern: &str) {}
    fn gesture_finished(&mut self, _pattern: &str) {}
    fn gesture_cancelled(&mut self) {}
}

/// No-op dispatcher for hosts that only poll return values.
#[derive(Debug, Default)]
pub struct NullDispatcher;

impl ActionDispatcher for NullDispatcher {}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Activated {
        direction: Direction,
        pattern: String,
    },
    DirectionChanged {
        direction: Direction,
        pattern: String,
    },
}

/// Classification of a button release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// No session was in progress.
    Idle,
    /// The press never activated; the host should pass the click through
    /// (e.g. open the context menu).
    Click,
    /// A finished gesture, carrying its pattern tokens.
    Gesture(String),
}

/// Session orchestrator: feeds each raw sample once to the recognizer and
/// once to the trail pipeline, which stay independent by construction —
/// recognition never sees filtered coordinates and rendering never sees
/// recognizer thresholds.
#[derive(Debug)]
pub struct GesturePipeline {
    recognizer: GestureRecognizer,
    trail: TrailStabilizer,
    trail_enabled: bool,
    in_session: bool,
}

impl GesturePipeline {
    pub fn new(settings: &GestureSettings) -> anyhow::Result<Self> {
        settings.validate()?;
        Ok(Self {
            recognizer: GestureRecognizer::new(settings.recognizer)?,
            trail: TrailStabilizer::new(settings.trail, settings.filter)?,
            trail_enabled: settings.show_trail,
            in_session: false,
        })
    }

    pub fn update_settings(&mut self, settings: &GestureSettings) -> anyhow::Result<()> {
        settings.validate()?;
        self.recognizer.update_config(settings.recognizer)?;
        self.trail.update_config(settings.trail)?;
        self.trail.set_filter_config(settings.filter)?;
        self.trail_enabled = settings.show_trail;
        Ok(())
    }

    /// Begins a session at the press position. The trail stays hidden until
    /// the recognizer activates.
    pub fn begin(&mut self, x: f32, y: f32, timestamp_ms: Option<f64>) {
        if !x.is_finite() || !y.is_finite() {
            tracing::debug!(x = x as f64, y = y as f64, "ignoring non-finite session start");
            return;
        }
        // A begin without a matching finish supersedes the old session;
        // cancel its deferred work before anything new can arrive.
        self.trail.hide();
        self.in_session = true;
        self.recognizer.start(sample(x, y, timestamp_ms));
    }

    /// Feeds one pointer sample. Non-finite coordinates are dropped at this
    /// boundary so they can never poison the smoothing state.
    pub fn feed(
        &mut self,
        x: f32,
        y: f32,
        timestamp_ms: Option<f64>,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Option<GestureEvent> {
        if !self.in_session {
            return None;
        }
        if !x.is_finite() || !y.is_finite() {
            tracing::debug!(x = x as f64, y = y as f64, "dropping non-finite pointer sample");
            return None;
        }

        let point = sample(x, y, timestamp_ms);
        let outcome = self.recognizer.feed(point);

        if outcome.activated {
            dispatcher.gesture_started();
            if self.trail_enabled {
                self.trail.show();
                // Retroactively draw the pre-activation path, oldest first.
                let mut merged = outcome.pre_activation_trail.clone();
                merged.sort_by(|a, b| {
                    a.timestamp_ms
                        .unwrap_or(f64::NEG_INFINITY)
                        .total_cmp(&b.timestamp_ms.unwrap_or(f64::NEG_INFINITY))
                });
                self.trail.add_points(&merged);
            }
            let direction = outcome.direction?;
            dispatcher.direction_changed(direction, &outcome.pattern);
            return Some(GestureEvent::Activated {
                direction,
                pattern: outcome.pattern,
            });
        }

        if self.recognizer.is_active() && self.trail_enabled {
            self.trail.add_point(point);
        }

        if outcome.direction_changed {
            let direction = outcome.direction?;
            dispatcher.direction_changed(direction, &outcome.pattern);
            return Some(GestureEvent::DirectionChanged {
                direction,
                pattern: outcome.pattern,
            });
        }

        None
    }

    /// Feeds a micro-batched sample group (e.g. coalesced pointer events) in
    /// timestamp order, regardless of arrival order within the batch.
    pub fn feed_coalesced(
        &mut self,
        samples: &[(f32, f32, Option<f64>)],
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Vec<GestureEvent> {
        let mut ordered: Vec<(f32, f32, Option<f64>)> = samples.to_vec();
        ordered.sort_by(|a, b| {
            a.2.unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&b.2.unwrap_or(f64::NEG_INFINITY))
        });
        ordered
            .into_iter()
            .filter_map(|(x, y, ts)| self.feed(x, y, ts, dispatcher))
            .collect()
    }

    /// Ends the session on button release. An activated session hands its
    /// pattern to the dispatcher; a press that never activated reports
    /// `Click` so the host can pass the click through.
    pub fn finish(&mut self, dispatcher: &mut dyn ActionDispatcher) -> SessionOutcome {
        if !self.in_session {
            return SessionOutcome::Idle;
        }
        self.in_session = false;

        let outcome = if self.recognizer.is_active() {
            let pattern = self.recognizer.pattern();
            tracing::debug!(%pattern, "gesture finished");
            dispatcher.gesture_finished(&pattern);
            SessionOutcome::Gesture(pattern)
        } else {
            SessionOutcome::Click
        };

        self.trail.hide();
        self.recognizer.reset();
        outcome
    }

    /// Aborts the session (e.g. Escape). Nothing is dispatched for
    /// execution; the trail and recognizer reset synchronously.
    pub fn cancel(&mut self, dispatcher: &mut dyn ActionDispatcher) {
        if self.in_session {
            dispatcher.gesture_cancelled();
        }
        self.in_session = false;
        self.trail.hide();
        self.recognizer.reset();
    }

    /// Host timer hook for the catch-up correction.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.trail.tick(now)
    }

    /// Host animation-frame hook; at most one redraw per frame.
    pub fn take_redraw(&mut self) -> Option<Vec<PathSegment>> {
        self.trail.take_redraw()
    }

    pub fn is_active(&self) -> bool {
        self.recognizer.is_active()
    }

    pub fn pattern(&self) -> String {
        self.recognizer.pattern()
    }

    pub fn trail(&self) -> &TrailStabilizer {
        &self.trail
    }
}

impl Default for GesturePipeline {
    fn default() -> Self {
        Self {
            recognizer: GestureRecognizer::default(),
            trail: TrailStabilizer::default(),
            trail_enabled: true,
            in_session: false,
        }
    }
}

fn sample(x: f32, y: f32, timestamp_ms: Option<f64>) -> Point {
    Point { x, y, timestamp_ms }
}

static PIPELINE: OnceCell<Arc<Mutex<GesturePipeline>>> = OnceCell::new();

/// Process-wide pipeline for hosts that run one gesture surface. Multiple
/// independent surfaces should construct their own [`GesturePipeline`]
/// instances instead; they need no synchronization between them.
pub fn shared_pipeline() -> Arc<Mutex<GesturePipeline>> {
    PIPELINE
        .get_or_init(|| Arc::new(Mutex::new(GesturePipeline::default())))
        .clone()
}

pub fn with_pipeline<F>(f: F)
where
    F: FnOnce(&mut GesturePipeline),
{
    let pipeline = shared_pipeline();
    match pipeline.lock() {
        Ok(mut guard) => f(&mut guard),
        Err(err) => tracing::error!(?err, "failed to lock shared gesture pipeline"),
    };
}
