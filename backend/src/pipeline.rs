//! Periodic acquire → detect → annotate loop, run off the UI thread.

use crate::control::{lock, SharedTurret};
use crate::cv::detect::{Detections, LandmarkDetector};
use crate::cv::frame::{Frame, Rgb};
use crate::cv::{annotate, render_keypad};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const KEYPAD_BACKGROUND: Rgb<u8> = Rgb([224, 128, 128]);
const OUTPUT_DEPTH: usize = 2;

/// Supplies raw frames. `Ok(None)` means nothing this tick.
pub trait FrameSource: Send {
    fn grab(&mut self) -> crate::Result<Option<Frame>>;
}

/// No camera attached.
#[derive(Debug, Default)]
pub struct NoSource;

impl FrameSource for NoSource {
    fn grab(&mut self) -> crate::Result<Option<Frame>> {
        Ok(None)
    }
}

/// One tick's worth of display output.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    /// Absent when no frame could be acquired this tick.
    pub video: Option<Frame>,
    pub keypad: Frame,
}

/// Runs one pipeline step.
pub fn process(
    source: &mut dyn FrameSource,
    detector: &mut dyn LandmarkDetector,
    turret: &SharedTurret,
) -> AnnotatedFrame {
    let held = lock(turret).held_directions();
    let keypad = render_keypad(held, KEYPAD_BACKGROUND);

    let frame = match source.grab() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            tracing::trace!("no frame this tick");
            return AnnotatedFrame {
                video: None,
                keypad,
            };
        }
        Err(err) => {
            tracing::debug!(%err, "frame acquisition failed, skipping tick");
            return AnnotatedFrame {
                video: None,
                keypad,
            };
        }
    };

    let detections = detector.detect(&frame).unwrap_or_else(|err| {
        tracing::debug!(%err, "detector failed, treating as no detections");
        Detections::default()
    });

    let video = annotate(&frame, &detections).into_owned();
    AnnotatedFrame {
        video: Some(video),
        keypad,
    }
}

/// Background worker producing [`AnnotatedFrame`]s at a fixed tick.
pub struct Pipeline {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    output: Receiver<AnnotatedFrame>,
}

impl Pipeline {
    pub fn spawn(
        mut source: Box<dyn FrameSource>,
        mut detector: Box<dyn LandmarkDetector>,
        turret: SharedTurret,
        tick: Duration,
    ) -> crate::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, output) = mpsc::sync_channel(OUTPUT_DEPTH);

        let worker_stop = Arc::clone(&stop);
        let worker = std::thread::Builder::new()
            .name("frame-pipeline".to_string())
            .spawn(move || {
                run(
                    source.as_mut(),
                    detector.as_mut(),
                    &turret,
                    tick,
                    &worker_stop,
                    &tx,
                )
            })?;

        tracing::info!(tick_ms = tick.as_millis() as u64, "frame pipeline started");
        Ok(Self {
            stop,
            worker: Some(worker),
            output,
        })
    }

    /// Newest frame produced since the last call, if any.
    pub fn latest(&self) -> Option<AnnotatedFrame> {
        self.output.try_iter().last()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("frame pipeline panicked");
            }
        }
    }
}

fn run(
    source: &mut dyn FrameSource,
    detector: &mut dyn LandmarkDetector,
    turret: &SharedTurret,
    tick: Duration,
    stop: &AtomicBool,
    tx: &SyncSender<AnnotatedFrame>,
) {
    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();

        match tx.try_send(process(source, detector, turret)) {
            Ok(()) => {}
            // display is behind, drop this one
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }

        std::thread::sleep(tick.saturating_sub(started.elapsed()));
    }
    tracing::info!("frame pipeline stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::control::{Direction, Turret};
    use crate::cv::detect::{FaceBox, NoDetector};
    use crate::cv::frame::pixel_at;
    use crate::error::Error;
    use crate::sink::NullSink;
    use std::collections::VecDeque;

    struct ScriptedSource(VecDeque<crate::Result<Option<Frame>>>);

    impl FrameSource for ScriptedSource {
        fn grab(&mut self) -> crate::Result<Option<Frame>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    struct FailingDetector;

    impl LandmarkDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> crate::Result<Detections> {
            Err(Error::SinkClosed)
        }
    }

    struct FaceDetector;

    impl LandmarkDetector for FaceDetector {
        fn detect(&mut self, _frame: &Frame) -> crate::Result<Detections> {
            Ok(Detections {
                faces: vec![FaceBox {
                    x: 0.25,
                    y: 0.25,
                    width: 0.5,
                    height: 0.5,
                }],
                ..Detections::default()
            })
        }
    }

    fn turret() -> SharedTurret {
        Turret::new(ControlConfig::default(), Box::new(NullSink)).into_shared()
    }

    #[test]
    fn test_missing_frame_still_renders_keypad() {
        let turret = turret();
        lock(&turret).on_press(Direction::Up);

        let out = process(&mut NoSource, &mut NoDetector, &turret);
        assert!(out.video.is_none());
        assert_eq!(pixel_at(&out.keypad, 50, 25), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn test_source_error_skips_video() {
        let mut source = ScriptedSource(VecDeque::from([Err(Error::CameraUnavailable(0))]));
        let out = process(&mut source, &mut NoDetector, &turret());
        assert!(out.video.is_none());
    }

    #[test]
    fn test_detector_failure_passes_frame_through() {
        let frame = Frame::from_pixel(8, 6, Rgb([10, 20, 30]));
        let mut source = ScriptedSource(VecDeque::from([Ok(Some(frame.clone()))]));

        let out = process(&mut source, &mut FailingDetector, &turret());
        assert_eq!(out.video, Some(frame));
    }

    #[test]
    fn test_detections_are_drawn() {
        let frame = Frame::from_pixel(40, 40, Rgb([0, 0, 0]));
        let mut source = ScriptedSource(VecDeque::from([Ok(Some(frame.clone()))]));

        let out = process(&mut source, &mut FaceDetector, &turret());
        let video = out.video.unwrap();
        assert_eq!(video.dimensions(), frame.dimensions());
        assert_ne!(video, frame);
    }

    #[test]
    fn test_worker_publishes_and_stops() {
        let frames = (0..3)
            .map(|_| Ok(Some(Frame::from_pixel(4, 4, Rgb([1, 2, 3])))))
            .collect();
        let pipeline = Pipeline::spawn(
            Box::new(ScriptedSource(frames)),
            Box::new(NoDetector),
            turret(),
            Duration::from_millis(1),
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = None;
        while seen.is_none() && Instant::now() < deadline {
            seen = pipeline.latest();
            std::thread::sleep(Duration::from_millis(2));
        }

        let frame = seen.expect("pipeline produced nothing");
        assert_eq!(frame.keypad.dimensions(), (100, 100));
        drop(pipeline);
    }
}
