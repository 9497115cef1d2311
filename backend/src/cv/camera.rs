use crate::config::CameraConfig;
use crate::cv::frame::Frame;
use crate::cv::vision::mat_to_frame;
use crate::error::Error;
use crate::pipeline::FrameSource;
use opencv::core::{flip, Size};
use opencv::imgproc::{cvt_color, resize, COLOR_BGR2RGB, INTER_AREA};
use opencv::prelude::{Mat, MatTraitConst, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{self, VideoCapture};

pub struct Camera {
    source: VideoCapture,
    size: Size,
    flip_frame: bool,
}

impl Camera {
    // TODO: list cameras and connect by name instead of index
    pub fn open(config: &CameraConfig) -> crate::Result<Self> {
        let source = VideoCapture::new(config.device, videoio::CAP_ANY)?;
        if !source.is_opened()? {
            return Err(Error::CameraUnavailable(config.device));
        }
        tracing::info!(device = config.device, "camera opened");

        Ok(Self {
            source,
            size: Size::new(config.width as i32, config.height as i32),
            flip_frame: config.flip,
        })
    }

    pub fn disconnect(&mut self) -> crate::Result<()> {
        self.source.release()?;
        Ok(())
    }

    /// Next frame as RGB, mirrored and resized as configured.
    pub fn get_frame(&mut self) -> crate::Result<Option<Frame>> {
        let mut frame = Mat::default();
        if !self.source.read(&mut frame)? || frame.rows() == 0 {
            return Ok(None);
        }

        let frame = if self.flip_frame {
            let mut flipped = Mat::default();
            flip(&frame, &mut flipped, 1)?;
            flipped
        } else {
            frame
        };

        let mut resized = Mat::default();
        resize(&frame, &mut resized, self.size, 0., 0., INTER_AREA)?;

        let mut rgb = Mat::default();
        cvt_color(&resized, &mut rgb, COLOR_BGR2RGB, 0)?;

        Ok(Some(mat_to_frame(&rgb)?))
    }
}

impl FrameSource for Camera {
    fn grab(&mut self) -> crate::Result<Option<Frame>> {
        self.get_frame()
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            tracing::warn!(%err, "failed to release camera");
        }
    }
}
