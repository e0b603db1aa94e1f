//! Window geometry persistence and the window host port.
//!
//! The coordinator never talks to a windowing toolkit directly. It creates the
//! window through a [`WindowHost`] and drives it through a [`WindowPort`]; the
//! shell crate implements both over the real runtime and tests use fakes.
//!
//! # Persisted state
//!
//! Stored under the `windowstate` key:
//!
//! ```json
//! { "bounds": { "x": 120, "y": 80, "width": 800, "height": 600 }, "isMaximized": false }
//! ```
//!
//! `bounds` only appears once the window has been moved or resized. While the
//! window is maximized only the flag is refreshed, so un-maximizing on the next
//! launch restores the last normal geometry.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::APP_NAME;
use crate::error::Result;
use crate::kv::JsonStorage;
use crate::storage::WINDOW_STATE_KEY;

pub const DEFAULT_WIDTH: u32 = 550;
pub const DEFAULT_HEIGHT: u32 = 450;
const BACKGROUND_COLOR: &str = "#002b36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub is_maximized: bool,
}

/// Platform translucency effect behind the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vibrancy {
    MediumLight,
    UltraDark,
}

impl Vibrancy {
    pub fn for_theme(light_theme: bool) -> Self {
        if light_theme {
            Vibrancy::MediumLight
        } else {
            Vibrancy::UltraDark
        }
    }
}

/// Creation parameters for the main window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    /// Windows start hidden and are shown once the content is ready.
    pub visible: bool,
    pub dark_theme: bool,
    pub hidden_title_bar: bool,
    pub auto_hide_menu_bar: bool,
    /// Solid background where vibrancy is unavailable.
    pub background_color: Option<String>,
}

/// Window lifecycle notifications, delivered in order by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    ReadyToShow,
    Resized,
    Moved,
    CloseRequested,
    Focused,
    Blurred,
}

/// Operations the coordinator needs on the live window.
pub trait WindowPort {
    fn show(&mut self) -> Result<()>;
    fn focus(&mut self) -> Result<()>;
    fn maximize(&mut self) -> Result<()>;
    fn is_maximized(&self) -> Result<bool>;
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;
    fn is_fullscreen(&self) -> Result<bool>;
    /// Outer position and size of the window as it is now.
    fn bounds(&self) -> Result<Bounds>;
    fn set_vibrancy(&mut self, vibrancy: Vibrancy) -> Result<()>;
    /// Ends the application.
    fn quit(&mut self);
}

/// Creates the single application window.
pub trait WindowHost {
    type Window: WindowPort;

    fn create(&mut self, options: &WindowOptions) -> Result<Self::Window>;
}

/// Loads, applies and re-persists [`WindowState`].
#[derive(Debug)]
pub struct WindowStateManager {
    state: WindowState,
}

impl WindowStateManager {
    /// Reads the persisted state, falling back to defaults on absence or
    /// corruption.
    pub fn load(store: &JsonStorage) -> Self {
        let state = match store.get::<WindowState>(WINDOW_STATE_KEY) {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("No window state yet; using defaults");
                WindowState::default()
            }
            Err(err) => {
                warn!(error = %err, "Window state unreadable; starting with defaults");
                WindowState::default()
            }
        };
        Self { state }
    }

    pub fn from_state(state: WindowState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn window_options(&self, macos: bool) -> WindowOptions {
        let bounds = self.state.bounds.as_ref();
        WindowOptions {
            title: APP_NAME.to_string(),
            x: bounds.and_then(|b| b.x),
            y: bounds.and_then(|b| b.y),
            width: bounds
                .map(|b| b.width)
                .filter(|w| *w > 0)
                .unwrap_or(DEFAULT_WIDTH),
            height: bounds
                .map(|b| b.height)
                .filter(|h| *h > 0)
                .unwrap_or(DEFAULT_HEIGHT),
            visible: false,
            dark_theme: true,
            hidden_title_bar: true,
            auto_hide_menu_bar: true,
            background_color: (!macos).then(|| BACKGROUND_COLOR.to_string()),
        }
    }

    /// Re-applies the maximized flag once the window is on screen; the host
    /// cannot create a window already maximized.
    pub fn restore_after_show<W: WindowPort>(&self, window: &mut W) -> Result<()> {
        if self.state.is_maximized {
            window.maximize()?;
        }
        Ok(())
    }

    /// Captures the live window into the state and writes it out.
    ///
    /// The maximized flag is queried first: a maximized window's geometry is
    /// the screen's, not the user's, and must not replace the stored bounds.
    pub fn capture<W: WindowPort>(&mut self, window: &W) -> Result<&WindowState> {
        self.state.is_maximized = window.is_maximized()?;
        if !self.state.is_maximized {
            self.state.bounds = Some(window.bounds()?);
        }
        Ok(&self.state)
    }

    pub fn persist<W: WindowPort>(&mut self, window: &W, store: &JsonStorage) -> Result<()> {
        self.capture(window)?;
        store.set(WINDOW_STATE_KEY, &self.state)
    }
}
