use clap::Parser;
use renderer::{WindowMode, DEFAULT_WINDOW_SIZE};

/// Literal positional argument that selects borderless fullscreen.
pub const BORDERLESS: &str = "borderless";

#[derive(Parser, Debug)]
#[command(
    name = "vitore",
    author,
    version,
    about = "Draws a colour-interpolated triangle with OpenGL 4.6"
)]
pub struct Args {
    /// Window mode: `borderless` covers the primary monitor; anything else opens a 1200x800 window.
    #[arg(value_name = "MODE", allow_hyphen_values = true)]
    pub mode: Option<String>,

    /// Anything after the mode is accepted and ignored.
    #[arg(
        value_name = "IGNORED",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        hide = true
    )]
    pub ignored: Vec<String>,
}

impl Args {
    pub fn window_mode(&self) -> WindowMode {
        match self.mode.as_deref() {
            Some(BORDERLESS) => WindowMode::Borderless,
            _ => {
                let (width, height) = DEFAULT_WINDOW_SIZE;
                WindowMode::Windowed { width, height }
            }
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
