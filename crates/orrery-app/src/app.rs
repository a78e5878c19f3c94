//! Window creation and event handling via winit.
//!
//! [`OrreryApp`] implements winit's [`ApplicationHandler`]: it performs the
//! whole startup sequence on `resumed`, then renders one frame per
//! `RedrawRequested` until the window is closed.

use std::sync::Arc;

use orrery_config::Config;
use orrery_input::{InputState, PointerCapture, RawKeyEvent};
use orrery_player::CameraController;
use orrery_render::{
    DepthBuffer, FrameEncoder, RenderContext, RenderContextError, RenderPassBuilder,
    SurfaceError, init_render_context_blocking,
};
use orrery_scene::{SceneError, SceneRenderer, SceneToggles};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::clock::FrameClock;

/// Fatal errors that end the application before or instead of a normal quit.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    RenderContext(#[from] RenderContextError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Returns [`WindowAttributes`] for the configured viewport.
///
/// The window is not resizable; the projection keeps the configured aspect.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .with_resizable(false)
}

/// Everything created by the startup sequence.
struct Running {
    window: Arc<Window>,
    gpu: RenderContext,
    depth: DepthBuffer,
    scene: SceneRenderer,
}

pub struct OrreryApp {
    config: Config,
    running: Option<Running>,
    startup_error: Option<AppError>,
    clock: FrameClock,
    input: InputState,
    pointer: PointerCapture,
    camera: CameraController,
    toggles: SceneToggles,
}

impl OrreryApp {
    pub fn new(config: Config) -> Self {
        let camera = CameraController::from_config(&config.camera);
        Self {
            config,
            running: None,
            startup_error: None,
            clock: FrameClock::new(),
            input: InputState::new(),
            pointer: PointerCapture::new(),
            camera,
            toggles: SceneToggles::default(),
        }
    }

    /// The error that aborted startup, if any.
    pub fn take_startup_error(&mut self) -> Option<AppError> {
        self.startup_error.take()
    }

    /// Frame timing starts once startup is done, so the first frame does not
    /// integrate input over the time spent loading.
    fn begin_frame_loop(&mut self) {
        self.clock.restart();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running, AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let gpu = init_render_context_blocking(window.clone(), self.config.window.vsync)?;

        let size = window.inner_size();
        let depth = DepthBuffer::new(&gpu.device, size.width, size.height);
        let scene = SceneRenderer::new(
            &gpu.device,
            &gpu.queue,
            gpu.surface_format,
            &self.config.assets,
            self.config.window.aspect_ratio(),
        )?;

        self.pointer.capture(&window);
        Ok(Running {
            window,
            gpu,
            depth,
            scene,
        })
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };

        let timing = self.clock.tick();
        self.camera.advance(&mut self.input, timing.delta as f32);

        let surface_texture = match running.gpu.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Lost) => {
                let size = running.window.inner_size();
                running.gpu.resize(size.width, size.height);
                running.window.request_redraw();
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                running.window.request_redraw();
                return;
            }
        };

        running.scene.prepare(
            &running.gpu.queue,
            self.camera.state(),
            timing.elapsed as f32,
            self.toggles,
        );

        let builder = RenderPassBuilder::new()
            .depth(running.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("scene");
        let mut frame = FrameEncoder::new(&running.gpu.device, &running.gpu.queue, surface_texture);
        {
            let mut pass = frame.begin_render_pass(&builder);
            running.scene.draw(&mut pass);
        }
        frame.submit();

        running.window.request_redraw();
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.startup_error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                info!("Startup complete, entering frame loop");
                running.window.request_redraw();
                self.running = Some(running);
                self.begin_frame_loop();
            }
            Err(e) => {
                error!("Startup failed: {e}");
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(running) = &mut self.running {
                    running.gpu.resize(new_size.width, new_size.height);
                    running
                        .depth
                        .resize(&running.gpu.device, new_size.width, new_size.height);
                }
            }
            WindowEvent::Focused(focused) => {
                if let Some(running) = &self.running {
                    if focused {
                        self.pointer.capture(&running.window);
                    } else {
                        self.input.release_all();
                        self.pointer.release(&running.window);
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(toggle) = self.input.process_key(RawKeyEvent::from(&event)) {
                    self.toggles.apply(toggle);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event
            && self.pointer.is_captured()
        {
            self.input.add_pointer_delta(delta.0 as f32, delta.1 as f32);
        }
    }
}

/// Creates an event loop and runs the orrery until the window is closed.
///
/// Returns the startup error if initialization failed.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = OrreryApp::new(config);
    event_loop.run_app(&mut app)?;
    match app.take_startup_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
