use anyhow::{Context, Result};
use clap::Parser;
use glam::{Mat4, Vec2, Vec3};
use scriptcam_camera::ScriptCamera;
use scriptcam_input::{CamKey, KeyMask};
use scriptcam_render_wgpu::SceneRenderer;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "scriptcam", about = "Scripted-camera rendering demo")]
struct Cli {
    /// Camera controller script
    #[arg(long, default_value = "scripts/camera.lua")]
    script: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Map held OS keys onto the controller's fixed key vocabulary.
/// Either side's CTRL and SHIFT count, as the original demo did.
fn build_key_mask(held: &HashSet<KeyCode>) -> KeyMask {
    let mut mask = KeyMask::EMPTY;
    if held.contains(&KeyCode::ArrowLeft) {
        mask.insert(CamKey::Left);
    }
    if held.contains(&KeyCode::ArrowRight) {
        mask.insert(CamKey::Right);
    }
    if held.contains(&KeyCode::ArrowUp) {
        mask.insert(CamKey::Up);
    }
    if held.contains(&KeyCode::ArrowDown) {
        mask.insert(CamKey::Down);
    }
    if held.contains(&KeyCode::Space) {
        mask.insert(CamKey::Space);
    }
    if held.contains(&KeyCode::ControlLeft) || held.contains(&KeyCode::ControlRight) {
        mask.insert(CamKey::LCtrl);
    }
    if held.contains(&KeyCode::ShiftLeft) || held.contains(&KeyCode::ShiftRight) {
        mask.insert(CamKey::LShift);
    }
    if held.contains(&KeyCode::Tab) {
        mask.insert(CamKey::Tab);
    }
    if held.contains(&KeyCode::Escape) {
        mask.insert(CamKey::Esc);
    }
    mask
}

/// Driver-side state around the controller.
struct DriverState {
    camera: ScriptCamera,
    keys_held: HashSet<KeyCode>,
    mouse_delta: Vec2,
    /// Last-known-good view matrix, reused when an update fails.
    view: Mat4,
    mouse_look: bool,
    last_frame: Instant,
    start: Instant,
}

impl DriverState {
    fn new(camera: ScriptCamera) -> Self {
        Self {
            camera,
            keys_held: HashSet::new(),
            mouse_delta: Vec2::ZERO,
            view: Mat4::IDENTITY,
            mouse_look: false,
            last_frame: Instant::now(),
            start: Instant::now(),
        }
    }
}

struct GpuApp {
    state: DriverState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
}

impl GpuApp {
    fn new(camera: ScriptCamera) -> Self {
        Self {
            state: DriverState::new(camera),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
        }
    }

    fn apply_mouse_look(&self, enabled: bool) {
        let Some(window) = &self.window else {
            return;
        };
        let grab = if enabled {
            CursorGrabMode::Locked
        } else {
            CursorGrabMode::None
        };
        // Some platforms only support one of Locked/Confined.
        if window.set_cursor_grab(grab).is_err() && enabled {
            let _ = window.set_cursor_grab(CursorGrabMode::Confined);
        }
        window.set_cursor_visible(!enabled);
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("scriptcam")
            .with_inner_size(PhysicalSize::new(900u32, 600));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("scriptcam_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = SceneRenderer::new(&device, &queue, surface_format, size.width, size.height);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key_state == ElementState::Pressed {
                    self.state.keys_held.insert(key);
                } else {
                    self.state.keys_held.remove(&key);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;

                self.state.camera.reload_if_needed();

                let mask = build_key_mask(&self.state.keys_held);
                let delta = std::mem::take(&mut self.state.mouse_delta);

                match self.state.camera.update(mask, delta, dt) {
                    Ok(frame) => {
                        self.state.view = frame.view;
                        if frame.quit {
                            tracing::info!("controller requested quit");
                            event_loop.exit();
                            return;
                        }
                        if frame.mouse_look != self.state.mouse_look {
                            self.state.mouse_look = frame.mouse_look;
                            self.apply_mouse_look(frame.mouse_look);
                        }
                    }
                    Err(err) => {
                        tracing::warn!("camera update failed, holding last view: {err}");
                    }
                }

                let (Some(surface), Some(device), Some(queue)) =
                    (&self.surface, &self.device, &self.queue)
                else {
                    return;
                };

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(config) = &self.config {
                            surface.configure(device, config);
                        }
                        return;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return;
                    }
                };

                let view_tex = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let config = self.config.as_ref().unwrap();
                let aspect = config.width as f32 / config.height.max(1) as f32;
                let proj = Mat4::perspective_rh(45.0_f32.to_radians(), aspect, 0.1, 500.0);

                let t = (now - self.state.start).as_secs_f32();
                let model = Mat4::from_translation(Vec3::new(0.0, 1.2, 0.0))
                    * Mat4::from_rotation_y(t)
                    * Mat4::from_rotation_x(t * 0.7);

                if let Some(renderer) = &self.renderer {
                    renderer.render(
                        device,
                        queue,
                        &view_tex,
                        proj * self.state.view,
                        proj * self.state.view * model,
                    );
                }

                output.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        // Deltas accumulate between frames; the script decides whether
        // mouse-look consumes them.
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.mouse_delta += Vec2::new(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("scriptcam starting");

    let camera = ScriptCamera::load(&cli.script)
        .with_context(|| format!("failed to load controller script {}", cli.script))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(camera);
    event_loop.run_app(&mut app)?;

    Ok(())
}
