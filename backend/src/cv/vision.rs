//! OpenCV-backed detection: Haar cascade faces plus star or color targets.

use crate::config::{TargetMode, VisionConfig};
use crate::cv::detect::{Detections, FaceBox, LandmarkDetector, Point2, Target};
use crate::cv::frame::{self, Frame};
use opencv::core::{
    find_file, in_range, Point, Rect, Scalar, Size, Vector, BORDER_CONSTANT, BORDER_DEFAULT,
    CV_8UC3,
};
use opencv::imgproc::{
    adaptive_threshold, contour_area, cvt_color, find_contours, gaussian_blur,
    get_structuring_element, moments, morphology_default_border_value, morphology_ex,
    ADAPTIVE_THRESH_GAUSSIAN_C, CHAIN_APPROX_SIMPLE, COLOR_RGB2GRAY, COLOR_RGB2HSV, MORPH_CLOSE,
    MORPH_ELLIPSE, MORPH_OPEN, RETR_EXTERNAL, THRESH_BINARY_INV,
};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::{
    CascadeClassifierTrait, CascadeClassifierTraitConst, Mat, MatTraitConst, MatTraitConstManual,
    MatTraitManual,
};
use opencv::types::VectorOfVectorOfPoint;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

const NEG_POINT: Point = Point::new(-1, -1);
const FACE_SCALE_FACTOR: f64 = 1.1;
const FACE_MIN_NEIGHBORS: i32 = 4;
const STAR_BLUR: i32 = 15;
const STAR_BLOCK_SIZE: i32 = 11;
const STAR_OFFSET: f64 = 2.;

/// Copies a continuous 3-channel RGB `Mat` into a [`Frame`].
pub fn mat_to_frame(mat: &Mat) -> crate::Result<Frame> {
    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };

    Ok(frame::from_rgb(
        mat.cols() as u32,
        mat.rows() as u32,
        mat.data_bytes()?.into(),
    )?)
}

pub fn frame_to_mat(frame: &Frame) -> crate::Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        CV_8UC3,
        Scalar::all(0.),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(frame.as_raw());
    Ok(mat)
}

/// Segmentation mode, HSV window and minimum blob size for target detection.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFilter {
    pub enabled: bool,
    pub mode: TargetMode,
    /// (H, S, V)
    pub lower_bound: (u8, u8, u8),
    /// (H, S, V)
    pub upper_bound: (u8, u8, u8),
    pub min_area: f64,
}

impl From<&VisionConfig> for TargetFilter {
    fn from(config: &VisionConfig) -> Self {
        Self {
            enabled: config.targets,
            mode: config.target_mode,
            lower_bound: config.lower_bound,
            upper_bound: config.upper_bound,
            min_area: config.min_target_area,
        }
    }
}

/// Filter settings shared between the detector and whoever tunes them.
pub type TargetFilterHandle = Arc<Mutex<TargetFilter>>;

fn bound(hsv: (u8, u8, u8)) -> crate::Result<Mat> {
    Ok(Mat::new_rows_cols_with_default(
        1,
        1,
        CV_8UC3,
        Scalar::new(hsv.0 as f64, hsv.1 as f64, hsv.2 as f64, 0.),
    )?)
}

pub struct VisionDetector {
    faces: Option<CascadeClassifier>,
    filter: TargetFilterHandle,
}

impl VisionDetector {
    pub fn new(config: &VisionConfig) -> crate::Result<Self> {
        let faces = match &config.face_cascade {
            Some(path) => load_cascade(path)?,
            None => None,
        };

        Ok(Self {
            faces,
            filter: Arc::new(Mutex::new(TargetFilter::from(config))),
        })
    }

    pub fn filter(&self) -> TargetFilterHandle {
        Arc::clone(&self.filter)
    }

    fn detect_faces(&mut self, rgb: &Mat) -> crate::Result<Vec<FaceBox>> {
        let Some(cascade) = &mut self.faces else {
            return Ok(Vec::new());
        };

        let mut gray = Mat::default();
        cvt_color(rgb, &mut gray, COLOR_RGB2GRAY, 0)?;

        let mut found = Vector::<Rect>::new();
        cascade.detect_multi_scale(
            &gray,
            &mut found,
            FACE_SCALE_FACTOR,
            FACE_MIN_NEIGHBORS,
            0,
            Size::default(),
            Size::default(),
        )?;

        let (w, h) = (rgb.cols() as f32, rgb.rows() as f32);
        Ok(found
            .iter()
            .map(|r| FaceBox {
                x: r.x as f32 / w,
                y: r.y as f32 / h,
                width: r.width as f32 / w,
                height: r.height as f32 / h,
            })
            .collect())
    }

    /// Returns a binary mask of pixels inside the HSV window.
    fn filter_color(&self, rgb: &Mat, filter: &TargetFilter) -> crate::Result<Mat> {
        let mut gb = Mat::default();
        gaussian_blur(rgb, &mut gb, Size::new(15, 15), 0., 0., BORDER_DEFAULT)?;

        let mut hsv_frame = Mat::default();
        cvt_color(&gb, &mut hsv_frame, COLOR_RGB2HSV, 0)?;

        let mut mask = Mat::default();
        in_range(
            &hsv_frame,
            &bound(filter.lower_bound)?,
            &bound(filter.upper_bound)?,
            &mut mask,
        )?;

        let kernel_close = get_structuring_element(MORPH_ELLIPSE, Size::new(3, 3), NEG_POINT)?;
        let kernel_open = get_structuring_element(MORPH_ELLIPSE, Size::new(7, 7), NEG_POINT)?;

        let mut morph_open = Mat::default();
        morphology_ex(
            &mask,
            &mut morph_open,
            MORPH_OPEN,
            &kernel_open,
            NEG_POINT,
            2,
            BORDER_CONSTANT,
            morphology_default_border_value()?,
        )?;

        let mut morph_close = Mat::default();
        morphology_ex(
            &morph_open,
            &mut morph_close,
            MORPH_CLOSE,
            &kernel_close,
            NEG_POINT,
            4,
            BORDER_CONSTANT,
            morphology_default_border_value()?,
        )?;

        Ok(morph_close)
    }

    /// Binary mask of small points brighter or darker than their surroundings.
    fn filter_stars(&self, rgb: &Mat) -> crate::Result<Mat> {
        let mut gray = Mat::default();
        cvt_color(rgb, &mut gray, COLOR_RGB2GRAY, 0)?;

        let mut blurred = Mat::default();
        gaussian_blur(
            &gray,
            &mut blurred,
            Size::new(STAR_BLUR, STAR_BLUR),
            0.,
            0.,
            BORDER_DEFAULT,
        )?;

        let mut binary = Mat::default();
        adaptive_threshold(
            &blurred,
            &mut binary,
            255.,
            ADAPTIVE_THRESH_GAUSSIAN_C,
            THRESH_BINARY_INV,
            STAR_BLOCK_SIZE,
            STAR_OFFSET,
        )?;

        Ok(binary)
    }

    fn detect_targets(&self, rgb: &Mat) -> crate::Result<Vec<Target>> {
        let filter = self
            .filter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if !filter.enabled {
            return Ok(Vec::new());
        }

        let mask = match filter.mode {
            TargetMode::Stars => self.filter_stars(rgb)?,
            TargetMode::Color => self.filter_color(rgb, &filter)?,
        };
        let mut contours = VectorOfVectorOfPoint::new();
        find_contours(
            &mask,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::default(),
        )?;

        let (w, h) = (rgb.cols() as f32, rgb.rows() as f32);
        let mut targets = Vec::new();
        for c in &contours {
            let area = contour_area(&c, false)?;
            if area <= filter.min_area {
                continue;
            }

            let Some((cx, cy)) = centroid(&c, filter.mode)? else {
                continue;
            };
            targets.push(Target {
                center: Point2::new(cx as f32 / w, cy as f32 / h),
                area,
            });
        }

        Ok(targets)
    }
}

/// Loads a cascade from `path`, falling back to OpenCV's data directory.
/// A missing or unreadable cascade disables face detection.
fn load_cascade(path: &Path) -> crate::Result<Option<CascadeClassifier>> {
    let name = path.to_string_lossy();
    let resolved = if path.exists() {
        name.to_string()
    } else {
        find_file(&name, false, true)?
    };
    if resolved.is_empty() {
        tracing::warn!(cascade = %name, "face cascade not found, face detection disabled");
        return Ok(None);
    }

    let cascade = CascadeClassifier::new(&resolved)?;
    if cascade.empty()? {
        tracing::warn!(
            cascade = %resolved,
            "face cascade failed to load, face detection disabled"
        );
        return Ok(None);
    }

    tracing::info!(cascade = %resolved, "face detection enabled");
    Ok(Some(cascade))
}

/// Star centers are the mean of the outline points; color blobs use moments.
fn centroid(contour: &Vector<Point>, mode: TargetMode) -> crate::Result<Option<(f64, f64)>> {
    match mode {
        TargetMode::Stars => {
            let n = contour.len();
            if n == 0 {
                return Ok(None);
            }
            let (sx, sy) = contour
                .iter()
                .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
            Ok(Some((sx as f64 / n as f64, sy as f64 / n as f64)))
        }
        TargetMode::Color => {
            let m = moments(contour, false)?;
            if m.m00 == 0. {
                return Ok(None);
            }
            Ok(Some((m.m10 / m.m00, m.m01 / m.m00)))
        }
    }
}

impl LandmarkDetector for VisionDetector {
    fn detect(&mut self, frame: &Frame) -> crate::Result<Detections> {
        let rgb = frame_to_mat(frame)?;

        Ok(Detections {
            hands: Vec::new(),
            faces: self.detect_faces(&rgb)?,
            targets: self.detect_targets(&rgb)?,
        })
    }
}
