//! Drawing helpers on top of `imageproc`: thick strokes, alpha fills and a
//! small bitmap font for labels.

use crate::cv::frame::{Frame, Rgb};
use image::{GrayImage, Pixel};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

pub const GLYPH_WIDTH: i32 = 5;
pub const GLYPH_HEIGHT: i32 = 7;
const GLYPH_ADVANCE: i32 = GLYPH_WIDTH + 1;

/// Line stroked with a `thickness` square brush anchored at its top-left.
pub fn line(
    frame: &mut Frame,
    from: (i32, i32),
    to: (i32, i32),
    color: Rgb<u8>,
    thickness: i32,
) {
    for dy in 0..thickness.max(1) {
        for dx in 0..thickness.max(1) {
            draw_line_segment_mut(
                frame,
                ((from.0 + dx) as f32, (from.1 + dy) as f32),
                ((to.0 + dx) as f32, (to.1 + dy) as f32),
                color,
            );
        }
    }
}

/// Outline between two opposite corners, extra thickness grows outward.
pub fn rectangle(
    frame: &mut Frame,
    a: (i32, i32),
    b: (i32, i32),
    color: Rgb<u8>,
    thickness: i32,
) {
    let (x0, y0) = (a.0.min(b.0), a.1.min(b.1));
    let (w, h) = ((a.0 - b.0).unsigned_abs(), (a.1 - b.1).unsigned_abs());

    for t in 0..thickness.max(1) {
        let grow = 2 * t as u32;
        let rect = Rect::at(x0 - t, y0 - t).of_size(w + 1 + grow, h + 1 + grow);
        draw_hollow_rect_mut(frame, rect, color);
    }
}

/// Composites `color` at `alpha` over every pixel set in `mask`.
pub fn blend_mask(frame: &mut Frame, mask: &GrayImage, color: Rgb<u8>, alpha: u8) {
    let a = alpha as u32;
    for (x, y, px) in frame.enumerate_pixels_mut() {
        if mask.get_pixel_checked(x, y).map_or(true, |m| m.0[0] == 0) {
            continue;
        }
        px.apply2(&color, |dst, src| ((src as u32 * a + dst as u32 * (255 - a)) / 255) as u8);
    }
}

/// Draws `text` with its bottom-left corner at `origin`.
///
/// Letters render upper case; characters without a glyph leave a gap.
pub fn text(frame: &mut Frame, text: &str, origin: (i32, i32), color: Rgb<u8>, scale: i32) {
    let scale = scale.max(1);
    let top = origin.1 - GLYPH_HEIGHT * scale;

    for (n, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else { continue };
        let left = origin.0 + n as i32 * GLYPH_ADVANCE * scale;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let cell = Rect::at(left + col * scale, top + row as i32 * scale)
                    .of_size(scale as u32, scale as u32);
                draw_filled_rect_mut(frame, cell, color);
            }
        }
    }
}

/// 5x7 bitmap, one byte per row, bit 4 is the leftmost column.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::frame::pixel_at;
    use image::Luma;
    use imageproc::drawing::draw_filled_circle_mut;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn count(frame: &Frame, color: Rgb<u8>) -> usize {
        frame.pixels().filter(|px| **px == color).count()
    }

    #[test]
    fn test_horizontal_line() {
        let mut frame = Frame::from_pixel(10, 10, BLACK);
        line(&mut frame, (1, 5), (8, 5), WHITE, 1);
        assert_eq!(count(&frame, WHITE), 8);
        assert_eq!(pixel_at(&frame, 1, 5), Some(WHITE));
        assert_eq!(pixel_at(&frame, 8, 5), Some(WHITE));
    }

    #[test]
    fn test_thick_line_and_clipping() {
        let mut frame = Frame::from_pixel(10, 10, BLACK);
        line(&mut frame, (-5, 0), (20, 0), WHITE, 2);
        // rows 0 and 1 are covered, the rest are clipped away
        assert_eq!(count(&frame, WHITE), 20);
    }

    #[test]
    fn test_rectangle_outline() {
        let mut frame = Frame::from_pixel(10, 10, BLACK);
        rectangle(&mut frame, (2, 2), (6, 6), WHITE, 1);
        assert_eq!(pixel_at(&frame, 2, 4), Some(WHITE));
        assert_eq!(pixel_at(&frame, 6, 6), Some(WHITE));
        assert_eq!(pixel_at(&frame, 4, 4), Some(BLACK));
        assert_eq!(count(&frame, WHITE), 16);
    }

    #[test]
    fn test_thick_rectangle_grows_outward() {
        let mut frame = Frame::from_pixel(10, 10, BLACK);
        rectangle(&mut frame, (6, 6), (2, 2), WHITE, 2);
        assert_eq!(pixel_at(&frame, 1, 1), Some(WHITE));
        assert_eq!(pixel_at(&frame, 7, 4), Some(WHITE));
        assert_eq!(pixel_at(&frame, 3, 3), Some(BLACK));
    }

    #[test]
    fn test_blend_mask_only_touches_masked_pixels() {
        let mut frame = Frame::from_pixel(11, 11, Rgb([200, 100, 0]));
        let mut mask = GrayImage::new(11, 11);
        draw_filled_circle_mut(&mut mask, (5, 5), 3, Luma([u8::MAX]));

        blend_mask(&mut frame, &mask, BLACK, 128);
        assert_eq!(pixel_at(&frame, 5, 5), Some(Rgb([99, 49, 0])));
        assert_eq!(pixel_at(&frame, 0, 0), Some(Rgb([200, 100, 0])));
    }

    #[test]
    fn test_text_sits_above_origin() {
        let mut frame = Frame::from_pixel(40, 20, BLACK);
        text(&mut frame, "Head", (2, 12), WHITE, 1);

        assert!(count(&frame, WHITE) > 0);
        // nothing at or below the baseline row
        for x in 0..40 {
            assert_eq!(pixel_at(&frame, x, 12), Some(BLACK));
        }
        // 'H' left stem
        assert_eq!(pixel_at(&frame, 2, 5), Some(WHITE));
    }

    #[test]
    fn test_text_clips_at_edges() {
        let mut frame = Frame::from_pixel(10, 10, BLACK);
        text(&mut frame, "HH", (-3, 3), WHITE, 2);
        assert!(count(&frame, WHITE) > 0);
    }

    #[test]
    fn test_unknown_glyphs_are_skipped() {
        let mut frame = Frame::from_pixel(20, 10, BLACK);
        text(&mut frame, "~~", (0, 8), WHITE, 1);
        assert_eq!(count(&frame, WHITE), 0);
    }
}
