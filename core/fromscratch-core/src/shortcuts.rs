//! Global shortcut table and its focus-scoped registration.
//!
//! Global shortcuts are intercepted system-wide, so they are only registered
//! while the window has focus: blur unregisters the whole table, focus
//! registers it again. Registration is all-or-nothing per transition; there is
//! no per-binding lifecycle.

use fromscratch_protocol::UiCommand;
use tracing::{debug, warn};

use crate::error::Result;

/// What a binding does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutEffect {
    /// Forward a command to the UI.
    Dispatch(UiCommand),
    Quit,
    ToggleFullscreen,
    /// Bound so the key does nothing (keeps the webview from reloading).
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub accelerator: &'static str,
    pub command_name: &'static str,
    pub effect: ShortcutEffect,
}

const fn binding(
    accelerator: &'static str,
    command_name: &'static str,
    effect: ShortcutEffect,
) -> ShortcutBinding {
    ShortcutBinding {
        accelerator,
        command_name,
        effect,
    }
}

pub const SHORTCUTS: [ShortcutBinding; 10] = [
    binding(
        "CmdOrCtrl+0",
        "reset-font",
        ShortcutEffect::Dispatch(UiCommand::ResetFont),
    ),
    binding(
        "CmdOrCtrl+-",
        "decrease-font",
        ShortcutEffect::Dispatch(UiCommand::DecreaseFont),
    ),
    binding(
        "CmdOrCtrl+=",
        "increase-font",
        ShortcutEffect::Dispatch(UiCommand::IncreaseFont),
    ),
    binding(
        "CmdOrCtrl+Plus",
        "increase-font",
        ShortcutEffect::Dispatch(UiCommand::IncreaseFont),
    ),
    binding(
        "CmdOrCtrl+I",
        "toggle-theme",
        ShortcutEffect::Dispatch(UiCommand::ToggleTheme),
    ),
    binding(
        "CmdOrCtrl+S",
        "save",
        ShortcutEffect::Dispatch(UiCommand::Save),
    ),
    binding("CmdOrCtrl+W", "quit", ShortcutEffect::Quit),
    binding("CmdOrCtrl+Q", "quit", ShortcutEffect::Quit),
    binding("CmdOrCtrl+R", "reload", ShortcutEffect::Disabled),
    binding("F11", "toggle-fullscreen", ShortcutEffect::ToggleFullscreen),
];

/// Looks a fired accelerator up in the table (case-insensitive).
pub fn find_binding(accelerator: &str) -> Option<&'static ShortcutBinding> {
    let accelerator = accelerator.trim();
    SHORTCUTS
        .iter()
        .find(|b| b.accelerator.eq_ignore_ascii_case(accelerator))
}

/// Host-side registration of global accelerators.
pub trait ShortcutRegistrar {
    fn register(&mut self, accelerator: &str) -> Result<()>;
    fn unregister_all(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Registered,
    Unregistered,
}

pub struct ShortcutDispatcher<R> {
    registrar: R,
    state: RegistrationState,
}

impl<R: ShortcutRegistrar> ShortcutDispatcher<R> {
    /// Registers the full table immediately; the window starts out focused.
    pub fn start(registrar: R) -> Self {
        let mut dispatcher = Self {
            registrar,
            state: RegistrationState::Unregistered,
        };
        dispatcher.register_all();
        dispatcher
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn on_focus(&mut self) {
        self.register_all();
    }

    pub fn on_blur(&mut self) {
        if let Err(err) = self.registrar.unregister_all() {
            warn!(error = %err, "Failed to unregister global shortcuts");
        }
        self.state = RegistrationState::Unregistered;
        debug!("Global shortcuts unregistered");
    }

    /// Maps a fired accelerator to its effect, or `None` while unregistered.
    pub fn resolve(&self, accelerator: &str) -> Option<ShortcutEffect> {
        if self.state == RegistrationState::Unregistered {
            debug!(accelerator, "Ignoring shortcut while unfocused");
            return None;
        }
        let binding = find_binding(accelerator);
        if binding.is_none() {
            warn!(accelerator, "Unknown shortcut fired");
        }
        binding.map(|b| b.effect)
    }

    fn register_all(&mut self) {
        // Clearing first keeps a repeated focus from stacking duplicates.
        if self.state == RegistrationState::Registered {
            if let Err(err) = self.registrar.unregister_all() {
                warn!(error = %err, "Failed to clear global shortcuts before re-registering");
            }
        }
        for binding in SHORTCUTS.iter() {
            if let Err(err) = self.registrar.register(binding.accelerator) {
                warn!(
                    error = %err,
                    accelerator = binding.accelerator,
                    "Failed to register global shortcut"
                );
            }
        }
        self.state = RegistrationState::Registered;
        debug!(count = SHORTCUTS.len(), "Global shortcuts registered");
    }
}
