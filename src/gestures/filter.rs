use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Frequency assumed when the elapsed time between samples is zero, negative
/// (non-monotonic host clock) or too small to invert safely.
const FALLBACK_FREQ_HZ: f32 = 60.0;
const MIN_DT_SECS: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Cutoff frequency in Hz applied when the pointer is nearly still.
    pub min_cutoff: f32,
    /// Speed coefficient: the effective cutoff is `min_cutoff + beta * speed`,
    /// so fast motion trades smoothing for responsiveness.
    pub beta: f32,
    /// Cutoff frequency for the velocity estimate itself.
    pub dcutoff: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::pointer()
    }
}

impl FilterConfig {
    /// Tuning for button-held pointer gestures.
    pub fn pointer() -> Self {
        Self {
            min_cutoff: 5.0,
            beta: 0.01,
            dcutoff: 1.0,
        }
    }

    /// Tuning for drag-and-drop gestures, where sample rates are lower and a
    /// steadier trail reads better.
    pub fn drag() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.007,
            dcutoff: 1.0,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("min_cutoff", self.min_cutoff),
            ("beta", self.beta),
            ("dcutoff", self.dcutoff),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{name} must be positive, got {value}");
            }
        }
        Ok(())
    }
}

/// Single-value exponential smoothing. The blend factor is supplied per call
/// so one primitive serves both the position and velocity channels.
#[derive(Debug, Default)]
pub struct LowPassFilter {
    seeded: bool,
    last: f32,
}

impl LowPassFilter {
    pub fn filter(&mut self, value: f32, alpha: f32) -> f32 {
        if self.seeded {
            self.last = alpha * value + (1.0 - alpha) * self.last;
        } else {
            self.seeded = true;
            self.last = value;
        }
        self.last
    }

    pub fn last_output(&self) -> Option<f32> {
        self.seeded.then_some(self.last)
    }

    pub fn reset(&mut self) {
        self.seeded = false;
        self.last = 0.0;
    }
}

fn smoothing_alpha(cutoff: f32, dt: f32) -> f32 {
    let tau = 1.0 / (2.0 * std::f32::consts::PI * cutoff);
    1.0 / (1.0 + tau / dt)
}

/// One-Euro filter over a 2-D point stream: position and velocity channels
/// each get a [`LowPassFilter`] per axis, and the position cutoff rises with
/// the smoothed speed estimate so lag stays low during fast motion while
/// jitter stays suppressed when the hand is nearly still.
#[derive(Debug)]
pub struct AdaptiveFilter {
    config: FilterConfig,
    x: LowPassFilter,
    y: LowPassFilter,
    dx: LowPassFilter,
    dy: LowPassFilter,
    epoch: Instant,
    /// Offset between the caller's event clock and our monotonic clock,
    /// recomputed on every timestamped sample so untimestamped samples keep
    /// advancing on the same time base.
    clock_offset_ms: f64,
    last_time_ms: Option<f64>,
}

impl AdaptiveFilter {
    pub fn new(config: FilterConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: FilterConfig) -> Self {
        Self {
            config,
            x: LowPassFilter::default(),
            y: LowPassFilter::default(),
            dx: LowPassFilter::default(),
            dy: LowPassFilter::default(),
            epoch: Instant::now(),
            clock_offset_ms: 0.0,
            last_time_ms: None,
        }
    }

    pub fn config(&self) -> FilterConfig {
        self.config
    }

    /// Replaces the tuning. Smoothing state is cleared because velocity
    /// history under the old cutoffs is meaningless under the new ones.
    pub fn set_config(&mut self, config: FilterConfig) -> anyhow::Result<()> {
        config.validate()?;
        self.config = config;
        self.reset();
        Ok(())
    }

    /// Smooths one sample. A supplied timestamp drives `dt` exactly; without
    /// one the local monotonic clock (offset onto the caller's clock, if one
    /// was ever seen) is used.
    pub fn filter(&mut self, x: f32, y: f32, timestamp_ms: Option<f64>) -> (f32, f32) {
        let local_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        let now_ms = match timestamp_ms {
            Some(ts) => {
                self.clock_offset_ms = ts - local_ms;
                ts
            }
            None => local_ms + self.clock_offset_ms,
        };

        let raw_dt = match self.last_time_ms {
            Some(last) => (now_ms - last) / 1000.0,
            None => 0.0,
        };
        self.last_time_ms = Some(now_ms);

        let (freq, dt) = if raw_dt < MIN_DT_SECS {
            (FALLBACK_FREQ_HZ, 1.0 / FALLBACK_FREQ_HZ)
        } else {
            ((1.0 / raw_dt) as f32, raw_dt as f32)
        };

        let prev_x = self.x.last_output().unwrap_or(x);
        let prev_y = self.y.last_output().unwrap_or(y);
        let d_alpha = smoothing_alpha(self.config.dcutoff, dt);
        let vx = self.dx.filter((x - prev_x) * freq, d_alpha);
        let vy = self.dy.filter((y - prev_y) * freq, d_alpha);
        let speed = (vx * vx + vy * vy).sqrt();

        let cutoff = self.config.min_cutoff + self.config.beta * speed;
        let alpha = smoothing_alpha(cutoff, dt);
        (self.x.filter(x, alpha), self.y.filter(y, alpha))
    }

    /// Clears all smoothing state and the time base. Required at the start
    /// of every session so stale velocity history never leaks across
    /// gestures.
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.dx.reset();
        self.dy.reset();
        self.clock_offset_ms = 0.0;
        self.last_time_ms = None;
    }
}

impl Default for AdaptiveFilter {
    fn default() -> Self {
        Self::with_config(FilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_pass_first_call_returns_input() {
        let mut lp = LowPassFilter::default();
        assert_eq!(lp.filter(42.0, 0.1), 42.0);
        assert_eq!(lp.last_output(), Some(42.0));
    }

    #[test]
    fn low_pass_blends_subsequent_calls() {
        let mut lp = LowPassFilter::default();
        lp.filter(0.0, 0.5);
        assert_eq!(lp.filter(10.0, 0.5), 5.0);
        assert_eq!(lp.filter(10.0, 0.5), 7.5);
    }

    #[test]
    fn low_pass_reset_unseeds() {
        let mut lp = LowPassFilter::default();
        lp.filter(10.0, 0.5);
        lp.reset();
        assert_eq!(lp.last_output(), None);
        assert_eq!(lp.filter(3.0, 0.5), 3.0);
    }

    #[test]
    fn alpha_grows_with_cutoff_and_dt() {
        let slow = smoothing_alpha(1.0, 1.0 / 60.0);
        let fast = smoothing_alpha(10.0, 1.0 / 60.0);
        assert!(fast > slow);
        let short = smoothing_alpha(1.0, 1.0 / 120.0);
        assert!(slow > short);
        assert!(fast > 0.0 && fast < 1.0);
    }

    #[test]
    fn non_monotonic_timestamp_does_not_blow_up() {
        let mut filter = AdaptiveFilter::default();
        filter.filter(0.0, 0.0, Some(100.0));
        // Clock went backwards; dt falls back to the default frequency.
        let (x, y) = filter.filter(5.0, 5.0, Some(50.0));
        assert!(x.is_finite() && y.is_finite());
    }

    #[test]
    fn config_rejects_non_positive_cutoffs() {
        let mut config = FilterConfig::default();
        config.min_cutoff = 0.0;
        assert!(config.validate().is_err());

        let mut config = FilterConfig::default();
        config.dcutoff = -1.0;
        assert!(config.validate().is_err());

        assert!(FilterConfig::pointer().validate().is_ok());
        assert!(FilterConfig::drag().validate().is_ok());
    }
}
