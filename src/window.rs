//! winit event loop that drives the scene and the renderer.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::controls::ControlAction;
use crate::error::ViewerError;
use crate::gpu::GpuState;
use crate::mode::Mode;
use crate::scene::Scene;
use crate::time::Clock;

const TITLE: &str = "arix";
const ORBIT_SENSITIVITY: f32 = 0.005;

/// Open a window and run `scene` until it is closed.
pub fn run(scene: Scene) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn title_for(mode: Mode) -> String {
    format!("{TITLE} - {mode}")
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    scene: Scene,
    clock: Clock,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<ViewerError>,
}

impl App {
    fn new(scene: Scene) -> Self {
        Self {
            window: None,
            gpu_state: None,
            scene,
            clock: Clock::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(title_for(self.scene.mode()))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), &self.scene))?;

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        // Don't count window and device setup as the first frame.
        self.clock = Clock::new();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let tick = self.clock.tick();
        self.scene.tick(tick);

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        if self.scene.mode().is_assembled() {
            gpu_state.camera.auto_rotate(tick.delta);
        }

        match gpu_state.render(&mut self.scene) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                gpu_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("gpu out of memory");
                event_loop.exit();
            }
            Err(e) => tracing::warn!(error = %e, "render error"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                tracing::error!(error = %err, "viewer setup failed");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(action) = ControlAction::from_key_event(&event) {
                    let mode = action.apply(self.scene.controller());
                    if let Some(window) = &self.window {
                        window.set_title(&title_for(mode));
                    }
                } else if event.state == ElementState::Pressed
                    && !event.repeat
                    && event.physical_key == PhysicalKey::Code(KeyCode::KeyP)
                {
                    self.clock.toggle_pause();
                    tracing::info!(paused = self.clock.is_paused(), "clock");
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state
                                .camera
                                .orbit(dx * ORBIT_SENSITIVITY, dy * ORBIT_SENSITIVITY);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
