use crate::cv::frame::Frame;
use std::fmt::{Display, Formatter};

/// A point in normalized image coordinates, both axes in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pixel position, with out-of-range coordinates pulled onto the frame edge.
    pub fn to_pixel(self, width: u32, height: u32) -> (i32, i32) {
        (to_extent(self.x, width), to_extent(self.y, height))
    }
}

/// Scales a normalized coordinate to `0..=extent`. NaN maps to 0.
pub(crate) fn to_extent(v: f32, extent: u32) -> i32 {
    (v.clamp(0.0, 1.0) * extent as f32) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Display for Handedness {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

/// The 21 points of the MediaPipe hand model, in model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

pub const HAND_LANDMARK_COUNT: usize = 21;

/// Skeleton edges drawn between hand landmarks.
pub const HAND_CONNECTIONS: [(HandLandmark, HandLandmark); 21] = {
    use HandLandmark::*;
    [
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        (Wrist, IndexMcp),
        (IndexMcp, IndexPip),
        (IndexPip, IndexDip),
        (IndexDip, IndexTip),
        (IndexMcp, MiddleMcp),
        (MiddleMcp, MiddlePip),
        (MiddlePip, MiddleDip),
        (MiddleDip, MiddleTip),
        (MiddleMcp, RingMcp),
        (RingMcp, RingPip),
        (RingPip, RingDip),
        (RingDip, RingTip),
        (RingMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

/// One detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub handedness: Handedness,
    /// Indexed by [`HandLandmark`]; detectors may report fewer than 21.
    pub points: Vec<Point2>,
}

impl HandLandmarks {
    pub fn point(&self, landmark: HandLandmark) -> Option<Point2> {
        self.points.get(landmark as usize).copied()
    }
}

/// Normalized axis-aligned face box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Centroid of a bright/colored blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub center: Point2,
    /// Contour area in pixels.
    pub area: f64,
}

/// Everything found in one frame. Produced fresh per frame, never kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
    pub hands: Vec<HandLandmarks>,
    pub faces: Vec<FaceBox>,
    pub targets: Vec<Target>,
}

impl Detections {
    pub fn is_empty(&self) -> bool {
        self.hands.is_empty() && self.faces.is_empty() && self.targets.is_empty()
    }
}

/// Black-box detector run on every frame.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame) -> crate::Result<Detections>;
}

/// Finds nothing.
#[derive(Debug, Default)]
pub struct NoDetector;

impl LandmarkDetector for NoDetector {
    fn detect(&mut self, _frame: &Frame) -> crate::Result<Detections> {
        Ok(Detections::default())
    }
}
