//! Display overlays for detections.

use crate::cv::detect::{
    to_extent, Detections, FaceBox, HandLandmark, HandLandmarks, Target, HAND_CONNECTIONS,
};
use crate::cv::frame::{Frame, Rgb};
use crate::cv::raster;
use imageproc::drawing::draw_filled_circle_mut;
use std::borrow::Cow;

const CONNECTION_COLOR: Rgb<u8> = Rgb([224, 224, 224]);
const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TARGET_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const FACE_LABEL: &str = "Head";
const FACE_LABEL_OFFSET: i32 = 10;

/// Returns `frame` with every detection drawn on it.
///
/// The input is never modified: with nothing to draw the frame is handed
/// back borrowed, otherwise a copy is drawn on.
pub fn annotate<'a>(frame: &'a Frame, detections: &Detections) -> Cow<'a, Frame> {
    if detections.is_empty() {
        return Cow::Borrowed(frame);
    }

    let mut out = frame.clone();
    for hand in &detections.hands {
        draw_hand(&mut out, hand);
    }
    for face in &detections.faces {
        draw_face(&mut out, face);
    }
    for target in &detections.targets {
        draw_target(&mut out, target);
    }

    Cow::Owned(out)
}

fn draw_hand(frame: &mut Frame, hand: &HandLandmarks) {
    let (w, h) = frame.dimensions();

    for (a, b) in HAND_CONNECTIONS {
        if let (Some(a), Some(b)) = (hand.point(a), hand.point(b)) {
            raster::line(frame, a.to_pixel(w, h), b.to_pixel(w, h), CONNECTION_COLOR, 2);
        }
    }
    for point in &hand.points {
        draw_filled_circle_mut(frame, point.to_pixel(w, h), 2, LANDMARK_COLOR);
    }

    if let Some(wrist) = hand.point(HandLandmark::Wrist) {
        let label = hand.handedness.to_string();
        raster::text(frame, &label, wrist.to_pixel(w, h), LABEL_COLOR, 1);
    }
}

fn draw_face(frame: &mut Frame, face: &FaceBox) {
    let (iw, ih) = frame.dimensions();
    let x = to_extent(face.x, iw);
    let y = to_extent(face.y, ih);
    let right = (x + to_extent(face.width, iw)).min(iw as i32 - 1);
    let bottom = (y + to_extent(face.height, ih)).min(ih as i32 - 1);

    raster::rectangle(frame, (x, y), (right, bottom), FACE_COLOR, 2);
    raster::text(frame, FACE_LABEL, (x, y - FACE_LABEL_OFFSET), FACE_COLOR, 1);
}

fn draw_target(frame: &mut Frame, target: &Target) {
    let (w, h) = frame.dimensions();
    draw_filled_circle_mut(frame, target.center.to_pixel(w, h), 3, TARGET_COLOR);
}
