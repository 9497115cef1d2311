use crate::error::Error;
use crate::input::{key_action, KeyAction};
use backend::config::{Config, SinkKind};
use backend::cv::{LandmarkDetector, NoDetector};
use backend::pipeline::{FrameSource, NoSource, Pipeline};
use backend::sink::{self, CommandSink};
use backend::{list_devices, lock, ChannelId, NullSink, SharedTurret, Turret};
use eframe::egui::{self, ColorImage, Context, RichText, TextureHandle, TextureOptions, Ui};
use eframe::Frame;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "camera")]
use backend::config::TargetMode;
#[cfg(feature = "camera")]
use backend::cv::vision::TargetFilterHandle;
#[cfg(feature = "camera")]
use eframe::egui::Slider;

struct Dialog {
    title: &'static str,
    body: String,
}

struct VisionParts {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    #[cfg(feature = "camera")]
    targets: Option<TargetFilterHandle>,
}

#[cfg(feature = "camera")]
fn vision(config: &Config) -> VisionParts {
    use backend::cv::camera::Camera;
    use backend::cv::vision::VisionDetector;

    let source: Box<dyn FrameSource> = match Camera::open(&config.camera) {
        Ok(camera) => Box::new(camera),
        Err(err) => {
            tracing::warn!(%err, "camera unavailable, running without video");
            Box::new(NoSource)
        }
    };

    match VisionDetector::new(&config.vision) {
        Ok(detector) => {
            let targets = Some(detector.filter());
            VisionParts {
                source,
                detector: Box::new(detector),
                targets,
            }
        }
        Err(err) => {
            tracing::warn!(%err, "detector unavailable, frames pass through unannotated");
            VisionParts {
                source,
                detector: Box::new(NoDetector),
                targets: None,
            }
        }
    }
}

#[cfg(not(feature = "camera"))]
fn vision(_config: &Config) -> VisionParts {
    tracing::info!("built without camera support");
    VisionParts {
        source: Box::new(NoSource),
        detector: Box::new(NoDetector),
    }
}

fn upload(ctx: &Context, slot: &mut Option<TextureHandle>, name: &str, frame: &backend::cv::Frame) {
    let size = [frame.width() as usize, frame.height() as usize];
    let image = ColorImage::from_rgb(size, frame.as_raw());
    match slot {
        Some(texture) => texture.set(image, TextureOptions::default()),
        None => *slot = Some(ctx.load_texture(name, image, TextureOptions::default())),
    }
}

pub(crate) struct App {
    config: Config,
    turret: SharedTurret,
    pipeline: Option<Pipeline>,
    port: Option<PathBuf>,

    video_tex: Option<TextureHandle>,
    keypad_tex: Option<TextureHandle>,

    dark_mode: bool,
    calibrate_open: bool,
    #[cfg(feature = "camera")]
    targets: Option<TargetFilterHandle>,

    dialog: Option<Dialog>,
    error: Option<Error>,
    error_open: bool,
}

impl App {
    pub(crate) fn new(_cc: &eframe::CreationContext, config: Config) -> Self {
        let (sink, port): (Box<dyn CommandSink>, Option<PathBuf>) =
            match sink::from_config(&config.sink) {
                Ok(sink) => {
                    let port = match config.sink.kind {
                        SinkKind::Serial => config.sink.port.clone(),
                        SinkKind::Null => None,
                    };
                    (sink, port)
                }
                Err(err) => {
                    tracing::warn!(%err, "command sink unavailable, running without hardware");
                    (Box::new(NullSink), None)
                }
            };
        let turret = Turret::new(config.control.clone(), sink).into_shared();

        let parts = vision(&config);
        #[cfg(feature = "camera")]
        let targets = parts.targets;
        let pipeline = Pipeline::spawn(
            parts.source,
            parts.detector,
            SharedTurret::clone(&turret),
            Duration::from_millis(config.camera.tick_ms),
        )
        .map_err(|err| tracing::error!(%err, "failed to start frame pipeline"))
        .ok();

        Self {
            config,
            turret,
            pipeline,
            port,
            video_tex: None,
            keypad_tex: None,
            dark_mode: false,
            calibrate_open: false,
            #[cfg(feature = "camera")]
            targets,
            dialog: None,
            error: None,
            error_open: false,
        }
    }

    fn handle_keys(&mut self, ctx: &Context) {
        let actions: Vec<KeyAction> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed,
                        repeat,
                        ..
                    } => key_action(*key, *pressed, *repeat),
                    _ => None,
                })
                .collect()
        });
        if actions.is_empty() {
            return;
        }

        let mut turret = lock(&self.turret);
        for action in actions {
            match action {
                KeyAction::Press(direction) => {
                    turret.on_press(direction);
                }
                KeyAction::Repeat(direction) => {
                    turret.on_repeat(direction);
                }
                KeyAction::Release(direction) => {
                    turret.on_release(direction);
                }
            }
        }
    }

    fn poll_pipeline(&mut self, ctx: &Context) {
        let Some(out) = self.pipeline.as_ref().and_then(Pipeline::latest) else {
            return;
        };

        if let Some(video) = &out.video {
            upload(ctx, &mut self.video_tex, "camera-frame", video);
        }
        upload(ctx, &mut self.keypad_tex, "keypad", &out.keypad);
    }

    fn connect(&mut self, port: Option<PathBuf>) -> crate::Result<()> {
        let sink: Box<dyn CommandSink> = match &port {
            Some(path) => Box::new(sink::open_serial(&self.config.sink, path).map_err(
                |source| Error::Connect {
                    port: path.clone(),
                    source,
                },
            )?),
            None => Box::new(NullSink),
        };
        lock(&self.turret).set_sink(sink);
        self.port = port;

        Ok(())
    }

    fn port_picker(&mut self, ui: &mut Ui) -> crate::Result<()> {
        let mut selected = self.port.clone();
        egui::ComboBox::from_label("Port")
            .selected_text(
                selected
                    .as_ref()
                    .map(|v| v.display().to_string())
                    .unwrap_or("None".to_string()),
            )
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "None");
                for port in list_devices().unwrap_or_default() {
                    let label = port.display().to_string();
                    ui.selectable_value(&mut selected, Some(port), label);
                }
            });

        if selected != self.port {
            self.connect(selected)?;
        }

        Ok(())
    }

    fn show_current_directory(&mut self) {
        let body = match std::env::current_dir() {
            Ok(dir) => format!("You are in: {}", dir.display()),
            Err(err) => format!("Could not read the current directory: {err}"),
        };
        self.dialog = Some(Dialog {
            title: "Current Directory",
            body,
        });
    }

    fn top_bar(&mut self, ui: &mut Ui) -> crate::Result<()> {
        egui::menu::bar(ui, |ui| -> crate::Result<()> {
            ui.menu_button("File", |ui| {
                if ui.button("Show Current Directory").clicked() {
                    self.show_current_directory();
                    ui.close_menu();
                }
            });
            ui.menu_button("View", |ui| {
                if ui.checkbox(&mut self.dark_mode, "Dark Mode").changed() {
                    let visuals = if self.dark_mode {
                        egui::Visuals::dark()
                    } else {
                        egui::Visuals::light()
                    };
                    ui.ctx().set_visuals(visuals);
                    ui.close_menu();
                }
            });
            ui.menu_button("Tool", |ui| {
                if ui.button("Calibrate").clicked() {
                    self.calibrate_open = !self.calibrate_open;
                    ui.close_menu();
                }
            });
            ui.separator();
            self.port_picker(ui)
        })
        .inner
    }

    fn sidebar(&mut self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            {
                let turret = lock(&self.turret);
                for (channel, title) in [(ChannelId::One, "Servo 1"), (ChannelId::Two, "Servo 2")] {
                    let text = format!("{title} Position: {}", turret.servo(channel));
                    ui.label(RichText::new(text).strong().size(14.0));
                }
                ui.small(format!("Sink: {}", turret.sink_name()));
            }

            ui.add_space(8.0);
            if let Some(texture) = &self.keypad_tex {
                ui.image((texture.id(), texture.size_vec2()));
            }
        });
    }

    fn central_panel(&mut self, ui: &mut Ui) {
        ui.label("Camera Window");
        match &self.video_tex {
            Some(texture) => {
                ui.image((texture.id(), texture.size_vec2()));
            }
            None => {
                ui.label("Webcam feed here");
            }
        }
    }

    #[cfg(feature = "camera")]
    fn camera_settings(&mut self, ui: &mut Ui) {
        let Some(handle) = &self.targets else {
            ui.label("Target detection is unavailable.");
            return;
        };
        let mut filter = handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        ui.checkbox(&mut filter.enabled, "Detect targets");
        ui.horizontal(|ui| {
            ui.radio_value(&mut filter.mode, TargetMode::Stars, "Stars");
            ui.radio_value(&mut filter.mode, TargetMode::Color, "Color");
        });
        ui.add(
            Slider::new(&mut filter.min_area, 0f64..=50000f64)
                .step_by(1f64)
                .text("Min area"),
        );
        if filter.mode == TargetMode::Color {
            ui.horizontal(|ui| {
                hsv_sliders(ui, "Upper bound:", &mut filter.upper_bound);
                hsv_sliders(ui, "Lower bound:", &mut filter.lower_bound);
            });
        }
    }

    #[cfg(not(feature = "camera"))]
    fn camera_settings(&mut self, ui: &mut Ui) {
        ui.label("Built without camera support, rebuild with `--features camera`.");
    }

    fn show_calibrate(&mut self, ctx: &Context) {
        let mut open = self.calibrate_open;
        egui::Window::new("Calibrate")
            .open(&mut open)
            .show(ctx, |ui| self.camera_settings(ui));
        self.calibrate_open = open;
    }

    fn show_dialog(&mut self, ctx: &Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };

        let mut close = false;
        egui::Window::new(dialog.title)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&dialog.body);
                if ui.button("Ok").clicked() {
                    close = true;
                }
            });
        if close {
            self.dialog = None;
        }
    }

    fn show_err(&mut self, ctx: &Context) {
        let Some(error) = &self.error else {
            self.error_open = false;
            return;
        };

        let mut close = false;
        egui::Window::new("Error").show(ctx, |ui| {
            ui.label("An error was encountered:");
            ui.monospace(error.to_string());
            ui.horizontal(|ui| {
                if ui.button("Ok").clicked() {
                    close = true;
                }
            });
        });
        if close {
            self.error_open = false;
        }
    }

    fn app(&mut self, ctx: &Context, _frame: &mut Frame) -> crate::Result<()> {
        self.handle_keys(ctx);
        self.poll_pipeline(ctx);

        if self.error_open {
            self.show_err(ctx);
        }
        self.show_dialog(ctx);
        if self.calibrate_open {
            self.show_calibrate(ctx);
        }

        egui::TopBottomPanel::top("top-row")
            .show(ctx, |ui| self.top_bar(ui))
            .inner?;
        egui::SidePanel::right("sidebar")
            .resizable(false)
            .show(ctx, |ui| self.sidebar(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.central_panel(ui));

        Ok(())
    }
}

#[cfg(feature = "camera")]
fn hsv_sliders(ui: &mut Ui, title: &str, hsv: &mut (u8, u8, u8)) {
    ui.vertical(|ui| {
        ui.monospace(title);
        ui.add(Slider::new(&mut hsv.0, 0..=255).text("Hue"));
        ui.add(Slider::new(&mut hsv.1, 0..=255).text("Saturation"));
        ui.add(Slider::new(&mut hsv.2, 0..=255).text("Value"));
    });
}

impl eframe::App for App {
    fn update(&mut self, ctx: &Context, frame: &mut Frame) {
        match self.app(ctx, frame) {
            Err(err) if !self.error_open => {
                tracing::error!(%err, "ui error");
                self.error_open = true;
                self.error = Some(err);
            }
            _ => {}
        }

        ctx.request_repaint_after(Duration::from_millis(self.config.camera.tick_ms));
    }
}
