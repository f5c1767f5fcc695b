use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use spr_core::StageKind;
use spr_experiment::config::DisplayConfig;
use spr_experiment::{
    DataSet, ExperimentEvent, ExperimentStateMachine, Session, StepError, Transition,
};
use spr_render::{FontVec, SkiaRenderer, TextSizes, View, load_font};
use spr_timing::HighPrecisionTimer;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::ModifiersState,
    window::{Fullscreen, Window, WindowId},
};

use crate::input::{Action, translate};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    experiment: ExperimentStateMachine<HighPrecisionTimer>,
    display: DisplayConfig,
    font: Option<FontVec>,
    results: Arc<Mutex<Option<DataSet>>>,
    cursor_position: PhysicalPosition<f64>,
    modifiers: ModifiersState,
    form_error: Option<String>,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(session: Session, display: DisplayConfig) -> Result<Self> {
        let font = load_font(display.font_path.as_deref())?;

        let results = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&results);
        let experiment = ExperimentStateMachine::from_session(session, HighPrecisionTimer::new())
            .on_finish(move |data: &DataSet| {
                if let Ok(mut slot) = sink.lock() {
                    *slot = Some(data.clone());
                }
            });

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            experiment,
            display,
            font: Some(font),
            results,
            cursor_position: PhysicalPosition::new(0.0, 0.0),
            modifiers: ModifiersState::empty(),
            form_error: None,
            failure: None,
        })
    }

    /// Runs the window until the session finishes or is aborted, then returns its data.
    pub fn run(mut self) -> Result<DataSet> {
        let event_loop = EventLoop::new()?;
        tracing::info!(
            platform = std::env::consts::OS,
            stages = self.experiment.stage_count(),
            "starting session, press ESC to abort"
        );

        event_loop.run_app(&mut self)?;

        // no-op unless the loop ended before the last stage
        self.experiment.abort();
        if let Some(e) = self.failure.take() {
            return Err(e);
        }

        self.results
            .lock()
            .map_err(|_| anyhow!("results lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("session ended without producing data"))
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attributes = Window::default_attributes()
            .with_title("Self-paced reading")
            .with_resizable(!self.display.fullscreen);

        if self.display.fullscreen {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .ok_or_else(|| anyhow!("No monitor available"))?;
            if let Some(rate) = monitor.refresh_rate_millihertz() {
                tracing::info!(refresh_hz = rate as f64 / 1000.0, "primary monitor");
            }
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        } else {
            attributes = attributes.with_inner_size(LogicalSize::new(1280.0, 720.0));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        tracing::info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            "window created"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow!("renderer already created"))?;
        let sizes = TextSizes {
            word: self.display.word_size,
            text: self.display.text_size,
        };
        self.renderer = Some(SkiaRenderer::new(size.width, size.height, font, sizes)?);

        self.window = Some(window);
        self.update_cursor();
        self.request_redraw();
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let view = View::from_stage(
            self.experiment.current_stage(),
            self.experiment.current_form().map(|(_, state)| state),
            self.form_error.as_deref(),
        );
        renderer.render_frame(view, pixels.frame_mut())?;
        pixels.render().context("failed to present frame")?;
        Ok(())
    }

    fn dispatch(&mut self, event: ExperimentEvent, event_loop: &ActiveEventLoop) {
        match self.experiment.handle_event(event) {
            Ok(Transition::Ignored) => {}
            Ok(Transition::Edited) => {
                self.form_error = None;
                self.request_redraw();
            }
            Ok(Transition::Advanced) => {
                self.form_error = None;
                self.update_cursor();
                self.request_redraw();
            }
            Ok(Transition::Finished) | Err(StepError::Finished) => event_loop.exit(),
            Err(StepError::Form(e)) => {
                self.form_error = Some(e.to_string());
                self.request_redraw();
            }
        }
    }

    fn handle_click(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let (x, y) = (self.cursor_position.x as f32, self.cursor_position.y as f32);
        if !renderer.hits_button(x, y) {
            return;
        }
        let event = match self.experiment.current_kind() {
            Some(StageKind::Button) => ExperimentEvent::ButtonPressed(0),
            Some(StageKind::Form) => ExperimentEvent::FormSubmitted,
            _ => return,
        };
        self.dispatch(event, event_loop);
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) -> Result<()> {
        if new_size.width == 0 || new_size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(new_size.width, new_size.height)?;
            pixels.resize_buffer(new_size.width, new_size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height)?;
        }
        tracing::debug!(width = new_size.width, height = new_size.height, "display resized");
        self.request_redraw();
        Ok(())
    }

    fn update_cursor(&self) {
        if let Some(window) = &self.window {
            let visible = matches!(
                self.experiment.current_kind(),
                Some(StageKind::Button | StageKind::Form) | None
            );
            window.set_cursor_visible(visible);
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn abort_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if !self.experiment.is_finished() {
            self.experiment.abort();
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        event_loop.exit();
    }

    fn fail(&mut self, error: anyhow::Error, event_loop: &ActiveEventLoop) {
        tracing::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(e.context("failed to create window and surface"), event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.abort_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    self.fail(e, event_loop);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                let shift = self.modifiers.shift_key();
                match translate(&event.logical_key, self.experiment.current_kind(), shift) {
                    Some(Action::Quit) => self.abort_and_exit(event_loop),
                    Some(Action::Respond(response)) => self.dispatch(response, event_loop),
                    None => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor_position = position,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(event_loop),
            WindowEvent::Resized(size) => {
                if let Err(e) = self.handle_resize(size) {
                    self.fail(e, event_loop);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    if let Err(e) = self.handle_resize(size) {
                        self.fail(e, event_loop);
                    }
                }
            }
            _ => {}
        }
    }
}
