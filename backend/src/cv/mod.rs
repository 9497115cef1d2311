pub mod annotate;
#[cfg(feature = "opencv")]
pub mod camera;
pub mod detect;
pub mod frame;
pub mod keypad;
pub mod raster;
#[cfg(feature = "opencv")]
pub mod vision;

pub use annotate::annotate;
pub use detect::{Detections, LandmarkDetector, NoDetector};
pub use frame::{Frame, Rgb};
pub use keypad::render_keypad;
