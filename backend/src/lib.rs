pub mod config;
pub mod control;
pub mod cv;
pub mod error;
pub mod pipeline;
pub mod servo;
pub mod sink;

pub use config::Config;
pub use control::{lock, Direction, DirectionSet, RepeatPolicy, SharedTurret, Turret};
pub use servo::{ChannelId, Command, ServoBank};
pub use sink::{list_devices, CommandSink, NullSink};

pub type Result<T> = std::result::Result<T, crate::error::Error>;
