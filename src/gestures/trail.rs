use crate::gestures::filter::{AdaptiveFilter, FilterConfig};
use crate::gestures::Point;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// When false, raw coordinates are stored directly and the filter is
    /// bypassed.
    pub stabilization: bool,
    /// Consecutive identical raw coordinates accepted before further
    /// duplicates are dropped ahead of the filter. Some hosts re-deliver the
    /// same coordinate during programmatic autoscroll; letting those through
    /// decays the velocity estimate to "stationary" and makes the filter
    /// overreact to the next genuine move.
    pub duplicate_point_limit: u32,
    /// Quiet time after the last accepted point before the catch-up check
    /// fires.
    pub catch_up_delay_ms: u64,
    /// Drift radius in pixels below which catch-up is a no-op.
    pub catch_up_tolerance_px: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            stabilization: true,
            duplicate_point_limit: 8,
            catch_up_delay_ms: 25,
            catch_up_tolerance_px: 0.5,
        }
    }
}

impl TrailConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.duplicate_point_limit == 0 {
            anyhow::bail!("duplicate_point_limit must be at least 1");
        }
        if self.catch_up_delay_ms == 0 {
            anyhow::bail!("catch_up_delay_ms must be positive");
        }
        if !self.catch_up_tolerance_px.is_finite() || self.catch_up_tolerance_px < 0.0 {
            anyhow::bail!(
                "catch_up_tolerance_px must be non-negative, got {}",
                self.catch_up_tolerance_px
            );
        }
        Ok(())
    }
}

/// One renderable trail entry. The raw fields exist solely to drive the
/// catch-up correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub x: f32,
    pub y: f32,
    pub raw_x: f32,
    pub raw_y: f32,
}

/// One drawing instruction for the host's surface. Short trails render as
/// straight segments; longer trails interpolate quadratically between
/// consecutive midpoints so the polyline has no visible kinks while still
/// passing near every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    QuadTo { ctrl_x: f32, ctrl_y: f32, x: f32, y: f32 },
}

/// Builds the renderable point list for one gesture session, keeping the
/// visible trail faithful to the true pointer position.
///
/// Deferred work is plain state on this object: a pending-redraw flag the
/// host drains once per animation frame with [`take_redraw`], and a catch-up
/// deadline the host checks with [`tick`]. Cancellation on [`hide`] is a
/// synchronous field clear, so nothing can fire into a later session.
///
/// [`take_redraw`]: TrailStabilizer::take_redraw
/// [`tick`]: TrailStabilizer::tick
/// [`hide`]: TrailStabilizer::hide
#[derive(Debug)]
pub struct TrailStabilizer {
    config: TrailConfig,
    filter: AdaptiveFilter,
    points: Vec<TrailPoint>,
    last_raw: Option<(f32, f32)>,
    duplicate_run: u32,
    redraw_pending: bool,
    catch_up_deadline: Option<Instant>,
    visible: bool,
}

impl TrailStabilizer {
    pub fn new(config: TrailConfig, filter_config: FilterConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            filter: AdaptiveFilter::new(filter_config)?,
            points: Vec::new(),
            last_raw: None,
            duplicate_run: 0,
            redraw_pending: false,
            catch_up_deadline: None,
            visible: false,
        })
    }

    pub fn config(&self) -> TrailConfig {
        self.config
    }

    pub fn update_config(&mut self, config: TrailConfig) -> anyhow::Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Swaps the filter tuning between sessions; smoothing state resets with
    /// it.
    pub fn set_filter_config(&mut self, config: FilterConfig) -> anyhow::Result<()> {
        self.filter.set_config(config)
    }

    /// Session start: clears the trail, the filter and the duplicate counter.
    pub fn show(&mut self) {
        self.visible = true;
        self.points.clear();
        self.filter.reset();
        self.last_raw = None;
        self.duplicate_run = 0;
        self.redraw_pending = false;
        self.catch_up_deadline = None;
    }

    /// Session end: cancels the pending redraw and the catch-up deadline.
    /// Mandatory — a correction firing after hide would inject a stale point
    /// into the next session's filter state.
    pub fn hide(&mut self) {
        self.visible = false;
        self.points.clear();
        self.last_raw = None;
        self.duplicate_run = 0;
        self.redraw_pending = false;
        self.catch_up_deadline = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn add_point(&mut self, point: Point) {
        if !point.is_finite() {
            tracing::debug!(
                x = point.x as f64,
                y = point.y as f64,
                "dropping non-finite trail point"
            );
            return;
        }
        if self.last_raw == Some((point.x, point.y)) {
            self.duplicate_run += 1;
            if self.duplicate_run >= self.config.duplicate_point_limit {
                return;
            }
        } else {
            self.duplicate_run = 0;
        }
        self.accept(point);
    }

    pub fn add_points(&mut self, batch: &[Point]) {
        for point in batch {
            self.add_point(*point);
        }
    }

    /// Fires the catch-up check if the deadline has passed. When the last
    /// trail point's filtered position has drifted beyond tolerance from its
    /// raw position, one synthetic point at the raw coordinate is fed through
    /// the filter (re-arming the deadline, so repeated ticks converge the
    /// trail onto the pointer). Returns true when a correction was injected.
    pub fn tick(&mut self, now: Instant) -> bool {
        let deadline = match self.catch_up_deadline {
            Some(deadline) => deadline,
            None => return false,
        };
        if now < deadline {
            return false;
        }
        self.catch_up_deadline = None;

        if !self.visible || !self.config.stabilization {
            return false;
        }
        let last = match self.points.last() {
            Some(last) => *last,
            None => return false,
        };
        let dx = last.x - last.raw_x;
        let dy = last.y - last.raw_y;
        let tolerance = self.config.catch_up_tolerance_px;
        if dx * dx + dy * dy <= tolerance * tolerance {
            return false;
        }

        // Bypasses duplicate suppression: the correction re-feeds the same
        // raw coordinate by design.
        self.accept(Point::new(last.raw_x, last.raw_y));
        true
    }

    /// Drains the pending redraw, at most once per animation frame no matter
    /// how many points arrived since the last frame.
    pub fn take_redraw(&mut self) -> Option<Vec<PathSegment>> {
        if !self.redraw_pending {
            return None;
        }
        self.redraw_pending = false;
        Some(self.render_path())
    }

    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn render_path(&self) -> Vec<PathSegment> {
        let points = &self.points;
        match points.len() {
            0 => Vec::new(),
            1 => vec![PathSegment::MoveTo {
                x: points[0].x,
                y: points[0].y,
            }],
            2 => vec![
                PathSegment::MoveTo {
                    x: points[0].x,
                    y: points[0].y,
                },
                PathSegment::LineTo {
                    x: points[1].x,
                    y: points[1].y,
                },
            ],
            n => {
                let mut path = Vec::with_capacity(n);
                path.push(PathSegment::MoveTo {
                    x: points[0].x,
                    y: points[0].y,
                });
                for i in 1..n - 1 {
                    let mid_x = (points[i].x + points[i + 1].x) / 2.0;
                    let mid_y = (points[i].y + points[i + 1].y) / 2.0;
                    path.push(PathSegment::QuadTo {
                        ctrl_x: points[i].x,
                        ctrl_y: points[i].y,
                        x: mid_x,
                        y: mid_y,
                    });
                }
                let last = points[n - 1];
                path.push(PathSegment::LineTo {
                    x: last.x,
                    y: last.y,
                });
                path
            }
        }
    }

    fn accept(&mut self, point: Point) {
        let (x, y) = if self.config.stabilization {
            self.filter.filter(point.x, point.y, point.timestamp_ms)
        } else {
            (point.x, point.y)
        };
        self.last_raw = Some((point.x, point.y));
        self.points.push(TrailPoint {
            x,
            y,
            raw_x: point.x,
            raw_y: point.y,
        });
        self.redraw_pending = true;
        self.catch_up_deadline =
            Some(Instant::now() + Duration::from_millis(self.config.catch_up_delay_ms));
    }
}

impl Default for TrailStabilizer {
    fn default() -> Self {
        Self {
            config: TrailConfig::default(),
            filter: AdaptiveFilter::default(),
            points: Vec::new(),
            last_raw: None,
            duplicate_run: 0,
            redraw_pending: false,
            catch_up_deadline: None,
            visible: false,
        }
    }
}
