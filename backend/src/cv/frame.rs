//! RGB frame buffer shared by the camera, the detectors and the annotator.

use image::RgbImage;
pub use image::Rgb;

/// 3-channel interleaved RGB image, row-major.
pub type Frame = RgbImage;

/// Wraps raw RGB bytes, checking they cover exactly `width * height` pixels.
pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Frame, FrameError> {
    let expected = width as usize * height as usize * 3;
    let actual = data.len();
    RgbImage::from_raw(width, height, data).filter(|_| actual == expected).ok_or(
        FrameError::InvalidLength {
            expected,
            actual,
        },
    )
}

/// Pixel at signed coordinates, `None` outside the frame.
pub fn pixel_at(frame: &Frame, x: i32, y: i32) -> Option<Rgb<u8>> {
    let x = u32::try_from(x).ok()?;
    let y = u32::try_from(y).ok()?;
    frame.get_pixel_checked(x, y).copied()
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid RGB length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(from_rgb(2, 2, vec![0; 12]).is_ok());

        let err = from_rgb(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidLength {
                expected: 12,
                actual: 11
            }
        ));
        // oversized buffers are rejected too
        assert!(from_rgb(2, 2, vec![0; 13]).is_err());
    }

    #[test]
    fn test_pixel_at_outside_is_none() {
        let frame = Frame::from_pixel(4, 3, Rgb([1, 2, 3]));
        assert_eq!(pixel_at(&frame, 3, 2), Some(Rgb([1, 2, 3])));
        assert_eq!(pixel_at(&frame, -1, 0), None);
        assert_eq!(pixel_at(&frame, 4, 0), None);
    }
}
