use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("terrain path needs at least one segment")]
    ZeroSegments,
    #[error("malformed color string: {0:?}")]
    MalformedColor(String),
    #[error("expected HH:MM, got {0:?}")]
    MalformedClock(String),
    #[error("invalid time of day: {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}
