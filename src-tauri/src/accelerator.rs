//! Accelerator strings from the shortcut table, as plugin shortcuts.

use fromscratch_core::error::{Result, ScratchError};
use fromscratch_core::shortcuts::{ShortcutRegistrar, SHORTCUTS};
use tauri::AppHandle;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Shortcut};

/// Parses a table accelerator with the plugin's own parser.
///
/// `Plus` has no plugin key name; it is taken as the keypad plus, with the
/// modifiers of the rest of the string.
pub fn parse(accelerator: &str) -> Option<Shortcut> {
    if let Some(modifiers) = accelerator.strip_suffix("+Plus") {
        let base: Shortcut = format!("{modifiers}+=").parse().ok()?;
        return Some(Shortcut::new(Some(base.mods), Code::NumpadAdd));
    }
    accelerator.parse().ok()
}

/// Table accelerator matching a shortcut the plugin reported.
pub fn accelerator_for(shortcut: &Shortcut) -> Option<&'static str> {
    SHORTCUTS
        .iter()
        .find(|binding| parse(binding.accelerator).as_ref() == Some(shortcut))
        .map(|binding| binding.accelerator)
}

pub struct TauriRegistrar {
    app: AppHandle,
}

impl TauriRegistrar {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ShortcutRegistrar for TauriRegistrar {
    fn register(&mut self, accelerator: &str) -> Result<()> {
        let failed = |details: String| ScratchError::ShortcutRegistration {
            accelerator: accelerator.to_string(),
            details,
        };
        let shortcut = parse(accelerator).ok_or_else(|| failed("unparsable accelerator".to_string()))?;
        self.app
            .global_shortcut()
            .register(shortcut)
            .map_err(|e| failed(e.to_string()))
    }

    fn unregister_all(&mut self) -> Result<()> {
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|e| ScratchError::ShortcutRegistration {
                accelerator: "*".to_string(),
                details: e.to_string(),
            })
    }
}
