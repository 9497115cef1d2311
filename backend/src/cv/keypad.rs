//! Radial indicator of the held directions.

use crate::control::{Direction, DirectionSet};
use crate::cv::frame::{Frame, Rgb};
use crate::cv::raster;
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;

/// Side of the square indicator viewport in pixels.
pub const KEYPAD_SIZE: u32 = 100;

const DISC_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const DISC_ALPHA: u8 = 128;
const WEDGE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

fn wedge(direction: Direction) -> [Point<i32>; 3] {
    let s = KEYPAD_SIZE as i32;
    let m = s / 2;
    let [a, b, c] = match direction {
        Direction::Up => [(m, 0), (s, m), (0, m)],
        Direction::Down => [(0, m), (s, m), (m, s)],
        Direction::Left => [(0, m), (m, 0), (m, s)],
        Direction::Right => [(s, m), (m, 0), (m, s)],
    };
    [a, b, c].map(|(x, y)| Point::new(x, y))
}

/// Renders the indicator: a translucent disc plus one wedge per held
/// direction, pointing that way. Always `KEYPAD_SIZE` square.
pub fn render_keypad(held: DirectionSet, background: Rgb<u8>) -> Frame {
    let mut frame = Frame::from_pixel(KEYPAD_SIZE, KEYPAD_SIZE, background);

    let mut disc = GrayImage::new(KEYPAD_SIZE, KEYPAD_SIZE);
    let m = KEYPAD_SIZE as i32 / 2;
    draw_filled_circle_mut(&mut disc, (m, m), m, Luma([u8::MAX]));
    raster::blend_mask(&mut frame, &disc, DISC_COLOR, DISC_ALPHA);

    for direction in held.iter() {
        draw_polygon_mut(&mut frame, &wedge(direction), WEDGE_COLOR);
    }

    frame
}
