use std::num::NonZeroU32;

use anyhow::{anyhow, bail, Context, Result};
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference, GetGlDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::GlWindow;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawWindowHandle};
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::debug::error_name;
use crate::gl;
use crate::glapi::{GlApi, NativeGl};
use crate::program::ShaderProgram;
use crate::scene::{prepare_pipeline, TriangleScene};
use crate::types::{RendererConfig, ShaderPayload, WindowMode};

/// Upper bound on error flags drained per frame; a lost context reports forever.
const MAX_ERRORS_PER_FRAME: usize = 8;

/// Everything that lives for the duration of the window.
///
/// Field order is drop order: GL objects go first, while the context is
/// still current, then the surface, the context and the window.
pub(crate) struct WindowState {
    scene: TriangleScene<NativeGl>,
    _program: ShaderProgram<NativeGl>,
    gl: NativeGl,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl WindowState {
    pub(crate) fn new(event_loop: &EventLoop<()>, config: &RendererConfig) -> Result<Self> {
        let (window, gl_config) = create_window(event_loop, config)?;
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 6))))
            .with_profile(GlProfile::Core)
            .with_debug(config.debug_output)
            .build(Some(window.raw_window_handle()));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("failed to create an OpenGL 4.6 core context")?;

        let surface_attributes = window.build_surface_attributes(Default::default());
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("failed to create window surface")?;
        let context = not_current
            .make_current(&surface)
            .context("failed to make OpenGL context current")?;

        if config.vsync {
            if let Err(err) =
                surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                warn!(%err, "failed to enable vsync");
            }
        }

        let gl = unsafe { NativeGl::load(|symbol| gl_display.get_proc_address(symbol)) };
        info!(
            version = gl.string(gl::VERSION).as_deref().unwrap_or("unknown"),
            renderer = gl.string(gl::RENDERER).as_deref().unwrap_or("unknown"),
            samples = gl_config.num_samples(),
            "OpenGL context ready"
        );
        if config.debug_output {
            gl.install_debug_callback();
        }

        let needs_spirv = config
            .shaders
            .iter()
            .any(|source| matches!(source.payload, ShaderPayload::SpirV(_)));
        if needs_spirv && !gl.supports_spirv() {
            bail!("driver does not expose glShaderBinary/glSpecializeShader; SPIR-V shaders need OpenGL 4.6");
        }

        let program = ShaderProgram::new(&gl, &config.shaders)
            .context("failed to build shader program")?;
        let size = window.inner_size();
        prepare_pipeline(&gl, &program, size.width, size.height, config.samples > 0);

        let scene = TriangleScene::new(&gl).context("failed to upload triangle")?;

        Ok(Self {
            scene,
            _program: program,
            gl,
            surface,
            context,
            window,
        })
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn render_frame(&self) -> Result<()> {
        self.gl.clear();
        self.scene.draw();
        self.report_gl_errors();
        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")
    }

    fn report_gl_errors(&self) {
        for _ in 0..MAX_ERRORS_PER_FRAME {
            let code = self.gl.error();
            if code == gl::NO_ERROR {
                break;
            }
            warn!(code, error = error_name(code), "OpenGL error during frame");
        }
    }
}

fn window_builder(event_loop: &EventLoop<()>, config: &RendererConfig) -> WindowBuilder {
    let builder = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_resizable(false);

    match config.window_mode {
        WindowMode::Windowed { width, height } => {
            builder.with_inner_size(PhysicalSize::new(width, height))
        }
        WindowMode::Borderless => {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next());
            let builder = match monitor.as_ref() {
                Some(monitor) => {
                    debug!(
                        name = monitor.name().as_deref().unwrap_or("unknown"),
                        width = monitor.size().width,
                        height = monitor.size().height,
                        "using monitor for borderless window"
                    );
                    builder.with_inner_size(monitor.size())
                }
                None => {
                    warn!("no monitor reported; letting the platform size the borderless window");
                    builder
                }
            };
            builder
                .with_decorations(false)
                .with_fullscreen(Some(Fullscreen::Borderless(monitor)))
        }
    }
}

/// Opens the GL display, picks a framebuffer config and creates the window.
///
/// WGL needs the window before the display so the config matches it; the
/// other backends create it last so the config can choose the X11 visual.
fn create_window(event_loop: &EventLoop<()>, config: &RendererConfig) -> Result<(Window, Config)> {
    let builder = window_builder(event_loop, config);

    #[cfg(target_os = "windows")]
    let early_window = Some(
        builder
            .clone()
            .build(event_loop)
            .context("failed to create window")?,
    );
    #[cfg(not(target_os = "windows"))]
    let early_window: Option<Window> = None;

    let raw_window_handle = early_window.as_ref().map(|window| window.raw_window_handle());
    let gl_display = unsafe {
        Display::new(
            event_loop.raw_display_handle(),
            display_preference(raw_window_handle),
        )
    }
    .context("failed to open OpenGL display")?;

    let mut template = ConfigTemplateBuilder::new();
    if config.samples > 0 {
        template = template.with_multisampling(config.samples);
    }
    if let Some(handle) = raw_window_handle {
        template = template.compatible_with_native_window(handle);
    }

    let configs = unsafe { gl_display.find_configs(template.build()) }
        .context("failed to query framebuffer configs")?;
    let gl_config = most_samples(configs, Config::num_samples).with_context(|| {
        format!(
            "no framebuffer config offers {} MSAA samples",
            config.samples
        )
    })?;

    let window = match early_window {
        Some(window) => window,
        None => glutin_winit::finalize_window(event_loop, builder, &gl_config)
            .context("failed to create window")?,
    };
    Ok((window, gl_config))
}

#[cfg(target_os = "windows")]
fn display_preference(window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(window)
}

#[cfg(target_os = "macos")]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::EglThenGlx(Box::new(winit::platform::x11::register_xlib_error_hook))
}

/// Prefers the candidate with the most MSAA samples; the first one wins ties.
fn most_samples<T>(candidates: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    candidates.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}

fn is_exit_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape)
}

/// Opens the window and renders until it is closed or Escape is pressed.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut state = Some(WindowState::new(&event_loop, &config)?);
    event_loop.set_control_flow(ControlFlow::Poll);

    info!(mode = ?config.window_mode, "entering render loop");
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::KeyboardInput { event, .. } if is_exit_key(&event) => {
                    info!("escape pressed; closing window");
                    elwt.exit();
                }
                WindowEvent::RedrawRequested => {
                    if let Some(window_state) = state.as_ref() {
                        if let Err(err) = window_state.render_frame() {
                            error!("{err:#}");
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if let Some(window_state) = state.as_ref() {
                    window_state.window().request_redraw();
                }
            }
            Event::LoopExiting => {
                if state.take().is_some() {
                    debug!("released GL resources");
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop failed: {err}"))
}
