use crate::cv::frame::FrameError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[cfg(feature = "opencv")]
    #[error(transparent)]
    OpenCV(#[from] opencv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid servo channel {0}, expected 1 or 2")]
    InvalidChannel(u8),
    #[error("camera {0} could not be opened")]
    CameraUnavailable(i32),
    #[error("command sink is busy")]
    SinkBusy,
    #[error("command sink is disconnected")]
    SinkClosed,
}
