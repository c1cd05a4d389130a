use crate::gestures::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compass direction produced by the recognizer. Classification uses the
/// dominant axis of a displacement; equal magnitudes resolve to the vertical
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn token(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    fn from_delta(dx: f32, dy: f32) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

pub fn pattern_string(pattern: &[Direction]) -> String {
    pattern.iter().map(|dir| dir.token()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Pixels of travel from the start point required to arm the session and,
    /// by default, to register a direction change.
    pub distance_threshold: f32,
    /// Growth factor applied to the accumulated segment length when computing
    /// the direction-change threshold. Larger values make long straight runs
    /// more resistant to spurious turns.
    pub long_gesture_multiplier: f32,
    /// Cap on the adaptive direction-change threshold.
    pub max_threshold: f32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 25.0,
            long_gesture_multiplier: 0.2,
            max_threshold: 120.0,
        }
    }
}

impl RecognizerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            anyhow::bail!(
                "distance_threshold must be positive, got {}",
                self.distance_threshold
            );
        }
        if !self.long_gesture_multiplier.is_finite() || self.long_gesture_multiplier < 0.0 {
            anyhow::bail!(
                "long_gesture_multiplier must be non-negative, got {}",
                self.long_gesture_multiplier
            );
        }
        if !self.max_threshold.is_finite() || self.max_threshold < self.distance_threshold {
            anyhow::bail!(
                "max_threshold must be at least distance_threshold, got {}",
                self.max_threshold
            );
        }
        Ok(())
    }
}

/// Result of feeding one pointer sample to the recognizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveOutcome {
    /// True exactly once per session, on the sample that crossed the
    /// activation threshold.
    pub activated: bool,
    /// True when this sample appended a direction to the pattern.
    pub direction_changed: bool,
    pub direction: Option<Direction>,
    /// Token string of the pattern as of this sample.
    pub pattern: String,
    /// Raw samples buffered before activation, exposed on the activating
    /// sample so a renderer can retroactively draw the early path.
    pub pre_activation_trail: Vec<Point>,
}

/// State machine turning raw pointer samples into an ordered direction
/// sequence.
///
/// A session runs from `start` to `reset` (or the next `start`). Until total
/// displacement from the start point exceeds `distance_threshold` the session
/// only buffers samples; at that instant the buffered history is replayed to
/// reconstruct the directions that would have been detected live, and from
/// then on each sample is measured against a moving anchor with a
/// hysteretic, segment-length-dependent turn threshold.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: RecognizerConfig,
    active: bool,
    start: Point,
    anchor: Point,
    current: Point,
    pattern: Vec<Direction>,
    points: Vec<Point>,
    segment_length: f32,
}

impl GestureRecognizer {
    pub fn new(config: RecognizerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            active: false,
            start: Point::new(0.0, 0.0),
            anchor: Point::new(0.0, 0.0),
            current: Point::new(0.0, 0.0),
            pattern: Vec::new(),
            points: Vec::new(),
            segment_length: 0.0,
        })
    }

    pub fn update_config(&mut self, config: RecognizerConfig) -> anyhow::Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> RecognizerConfig {
        self.config
    }

    /// Begins a new session at `point`, discarding any previous state.
    pub fn start(&mut self, point: Point) {
        self.reset();
        self.start = point;
        self.anchor = point;
        self.current = point;
        self.points.push(point);
    }

    /// Clears all session state. Safe to call when idle.
    pub fn reset(&mut self) {
        self.active = false;
        self.start = Point::new(0.0, 0.0);
        self.anchor = Point::new(0.0, 0.0);
        self.current = Point::new(0.0, 0.0);
        self.pattern.clear();
        self.points.clear();
        self.segment_length = 0.0;
    }

    /// Consumes one raw sample. Never blocks, never fails; zero-length moves
    /// and repeated points fall out naturally because a displacement of zero
    /// exceeds no threshold.
    pub fn feed(&mut self, point: Point) -> MoveOutcome {
        self.current = point;
        self.points.push(point);

        let mut outcome = MoveOutcome {
            pattern: pattern_string(&self.pattern),
            ..MoveOutcome::default()
        };

        let total_dx = self.current.x - self.start.x;
        let total_dy = self.current.y - self.start.y;
        let total_distance = (total_dx * total_dx + total_dy * total_dy).sqrt();

        if !self.active && total_distance > self.config.distance_threshold {
            self.active = true;
            outcome.activated = true;
            outcome.pre_activation_trail = self.points.clone();

            if self.config.distance_threshold >= 10.0 {
                self.replay_buffered();
            }

            // Degenerate short straight burst: replay found no turn, so the
            // net displacement names the single opening direction.
            if self.pattern.is_empty() {
                self.pattern.push(Direction::from_delta(total_dx, total_dy));
                self.anchor = self.current;
                self.segment_length = total_distance;
            }

            outcome.pattern = pattern_string(&self.pattern);
            outcome.direction = self.pattern.last().copied();
            outcome.direction_changed = true;
            tracing::debug!(pattern = %outcome.pattern, "gesture activated");
        }

        if !self.active {
            return outcome;
        }

        let dx = self.current.x - self.anchor.x;
        let dy = self.current.y - self.anchor.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > self.config.distance_threshold {
            let direction = Direction::from_delta(dx, dy);

            if self.pattern.last() == Some(&direction) {
                // Same direction: extend the segment, no event.
                self.segment_length += distance;
                self.anchor = self.current;
            } else {
                // Candidate turn. The required distance grows with the
                // current segment so hand tremor on a long straight drag
                // cannot flip the direction, while short deliberate turns
                // still register quickly.
                let adaptive_threshold = self
                    .config
                    .max_threshold
                    .min(self.config.distance_threshold + self.segment_length * self.config.long_gesture_multiplier);

                if distance > adaptive_threshold {
                    self.pattern.push(direction);
                    outcome.direction_changed = true;
                    outcome.direction = Some(direction);
                    outcome.pattern = pattern_string(&self.pattern);

                    self.segment_length = distance;
                    self.anchor = self.current;
                }
            }
        }

        outcome
    }

    /// Token string of the pattern so far, e.g. `"RDL"`.
    pub fn pattern(&self) -> String {
        pattern_string(&self.pattern)
    }

    pub fn directions(&self) -> &[Direction] {
        &self.pattern
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start_point(&self) -> Point {
        self.start
    }

    /// Reconstructs the direction sequence from the buffered pre-activation
    /// points, as if detection had been live from the first sample. The
    /// replay threshold is deliberately smaller than the live one because the
    /// buffer is a coarser sampling of the path and must not under-report
    /// early turns. The 0.7 / 0.8 split is a tuned compatibility constant.
    fn replay_buffered(&mut self) {
        let multiplier = if self.config.distance_threshold < 15.0 {
            0.8
        } else {
            0.7
        };
        let replay_threshold = self.config.distance_threshold * multiplier;

        self.pattern.clear();
        self.anchor = self.start;
        self.segment_length = 0.0;

        for i in 0..self.points.len() {
            let p = self.points[i];
            let dx = p.x - self.anchor.x;
            let dy = p.y - self.anchor.y;
            let dist = (dx * dx + dy * dy).sqrt();

            if dist > replay_threshold {
                let direction = Direction::from_delta(dx, dy);
                if self.pattern.last() == Some(&direction) {
                    self.segment_length += dist;
                    self.anchor = p;
                } else {
                    self.pattern.push(direction);
                    self.anchor = p;
                    self.segment_length = dist;
                }
            }
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self {
            config: RecognizerConfig::default(),
            active: false,
            start: Point::new(0.0, 0.0),
            anchor: Point::new(0.0, 0.0),
            current: Point::new(0.0, 0.0),
            pattern: Vec::new(),
            points: Vec::new(),
            segment_length: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_axis_ties_resolve_vertical() {
        assert_eq!(Direction::from_delta(10.0, 10.0), Direction::Down);
        assert_eq!(Direction::from_delta(-10.0, -10.0), Direction::Up);
        assert_eq!(Direction::from_delta(10.0, -10.0), Direction::Up);
        assert_eq!(Direction::from_delta(11.0, 10.0), Direction::Right);
        assert_eq!(Direction::from_delta(-11.0, 10.0), Direction::Left);
    }

    #[test]
    fn config_rejects_bad_values() {
        let mut config = RecognizerConfig::default();
        config.distance_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = RecognizerConfig::default();
        config.long_gesture_multiplier = -0.1;
        assert!(config.validate().is_err());

        let mut config = RecognizerConfig::default();
        config.max_threshold = config.distance_threshold - 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn pattern_string_concatenates_tokens() {
        let pattern = [Direction::Right, Direction::Down, Direction::Left];
        assert_eq!(pattern_string(&pattern), "RDL");
    }
}
