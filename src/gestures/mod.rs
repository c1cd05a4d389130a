pub mod filter;
pub mod pipeline;
pub mod recognizer;
pub mod trail;

/// One raw pointer sample. The timestamp is the host's event clock in
/// milliseconds; when absent, consumers substitute their local clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: Option<f64>,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            timestamp_ms: None,
        }
    }

    pub fn with_timestamp(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self {
            x,
            y,
            timestamp_ms: Some(timestamp_ms),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from(value: (f32, f32)) -> Self {
        Self::new(value.0, value.1)
    }
}
