use std::path::PathBuf;

use fromscratch_core::channel::InboxSender;
use fromscratch_core::error::{Result, ScratchError};
use fromscratch_core::window::{
    Bounds, Vibrancy, WindowEvent, WindowHost, WindowOptions, WindowPort,
};
use tauri::webview::PageLoadEvent;
use tauri::window::{Color, Effect, EffectsBuilder};
use tauri::{AppHandle, Theme, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

pub const MAIN_WINDOW_LABEL: &str = "main";

/// Creates the single webview window.
pub struct TauriHost {
    app: AppHandle,
    inbox: InboxSender,
    profile_dir: Option<PathBuf>,
}

impl TauriHost {
    pub fn new(app: AppHandle, inbox: InboxSender, profile_dir: Option<PathBuf>) -> Self {
        Self {
            app,
            inbox,
            profile_dir,
        }
    }
}

impl WindowHost for TauriHost {
    type Window = TauriWindow;

    fn create(&mut self, options: &WindowOptions) -> Result<TauriWindow> {
        let inbox = self.inbox.clone();
        let mut builder = WebviewWindowBuilder::new(
            &self.app,
            MAIN_WINDOW_LABEL,
            WebviewUrl::App("index.html".into()),
        )
        .title(&options.title)
        .inner_size(f64::from(options.width), f64::from(options.height))
        .visible(options.visible)
        .on_page_load(move |_window, payload| {
            if payload.event() == PageLoadEvent::Finished {
                inbox.post_window(WindowEvent::ReadyToShow);
            }
        });

        if let (Some(x), Some(y)) = (options.x, options.y) {
            builder = builder.position(f64::from(x), f64::from(y));
        }
        if options.dark_theme {
            builder = builder.theme(Some(Theme::Dark));
        }
        if let Some(color) = options.background_color.as_deref().and_then(parse_hex_color) {
            builder = builder.background_color(color);
        }
        #[cfg(target_os = "macos")]
        if options.hidden_title_bar {
            builder = builder
                .title_bar_style(tauri::TitleBarStyle::Overlay)
                .hidden_title(true)
                .transparent(true);
        }
        // No menu is attached, so there is no menu bar to hide.
        if let Some(dir) = &self.profile_dir {
            builder = builder.data_directory(dir.clone());
        }

        let window = builder
            .build()
            .map_err(|e| ScratchError::WindowCreation(e.to_string()))?;
        Ok(TauriWindow {
            app: self.app.clone(),
            window,
        })
    }
}

/// `#rrggbb` to an opaque color.
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color(channel(0)?, channel(2)?, channel(4)?, 255))
}

pub struct TauriWindow {
    app: AppHandle,
    window: WebviewWindow,
}

impl WindowPort for TauriWindow {
    fn show(&mut self) -> Result<()> {
        self.window
            .show()
            .map_err(|e| ScratchError::window("show", e))
    }

    fn focus(&mut self) -> Result<()> {
        self.window
            .set_focus()
            .map_err(|e| ScratchError::window("focus", e))
    }

    fn maximize(&mut self) -> Result<()> {
        self.window
            .maximize()
            .map_err(|e| ScratchError::window("maximize", e))
    }

    fn is_maximized(&self) -> Result<bool> {
        self.window
            .is_maximized()
            .map_err(|e| ScratchError::window("is_maximized", e))
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.window
            .set_fullscreen(fullscreen)
            .map_err(|e| ScratchError::window("set_fullscreen", e))
    }

    fn is_fullscreen(&self) -> Result<bool> {
        self.window
            .is_fullscreen()
            .map_err(|e| ScratchError::window("is_fullscreen", e))
    }

    /// Outer position and inner size, in logical pixels.
    fn bounds(&self) -> Result<Bounds> {
        let scale = self
            .window
            .scale_factor()
            .map_err(|e| ScratchError::window("scale_factor", e))?;
        let position = self
            .window
            .outer_position()
            .map_err(|e| ScratchError::window("outer_position", e))?
            .to_logical::<f64>(scale);
        let size = self
            .window
            .inner_size()
            .map_err(|e| ScratchError::window("inner_size", e))?
            .to_logical::<f64>(scale);

        Ok(Bounds::new(
            position.x.round() as i32,
            position.y.round() as i32,
            size.width.round() as u32,
            size.height.round() as u32,
        ))
    }

    fn set_vibrancy(&mut self, vibrancy: Vibrancy) -> Result<()> {
        let effect = match vibrancy {
            Vibrancy::MediumLight => Effect::MediumLight,
            Vibrancy::UltraDark => Effect::UltraDark,
        };
        self.window
            .set_effects(EffectsBuilder::new().effect(effect).build())
            .map_err(|e| ScratchError::window("set_effects", e))
    }

    fn quit(&mut self) {
        self.app.exit(0);
    }
}
