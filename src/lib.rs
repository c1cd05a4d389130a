pub mod gestures;
pub mod logging;
pub mod settings;

pub use gestures::filter::{AdaptiveFilter, FilterConfig, LowPassFilter};
pub use gestures::pipeline::{
    shared_pipeline, with_pipeline, ActionDispatcher, GestureEvent, GesturePipeline,
    NullDispatcher, SessionOutcome,
};
pub use gestures::recognizer::{
    pattern_string, Direction, GestureRecognizer, MoveOutcome, RecognizerConfig,
};
pub use gestures::trail::{PathSegment, TrailConfig, TrailPoint, TrailStabilizer};
pub use gestures::Point;
pub use settings::{load_settings, save_settings, GestureSettings};
