//! Message schemas shared by the FromScratch core and its UI.
//!
//! The core and the presentation layer only talk through these types, in two
//! one-way directions: the UI asks the core to persist things, the core tells
//! the UI to run a named command. Keeping the names here prevents the two sides
//! from drifting apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event name the UI listens on for core→UI commands.
pub const EXECUTE_SHORTCUT_EVENT: &str = "executeShortCut";

/// UI→core request names.
pub const WRITE_CONTENT_REQUEST: &str = "writeContent";
pub const SET_VIBRANCY_REQUEST: &str = "setVibrancy";
pub const READ_CONTENT_REQUEST: &str = "readContent";

/// Commands the core sends to the UI. The serialized form is the command name
/// the UI dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiCommand {
    ResetFont,
    DecreaseFont,
    IncreaseFont,
    ToggleTheme,
    Save,
    /// Reserved: a newer release than the running one exists.
    ShowUpdateMsg,
}

impl UiCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiCommand::ResetFont => "reset-font",
            UiCommand::DecreaseFont => "decrease-font",
            UiCommand::IncreaseFont => "increase-font",
            UiCommand::ToggleTheme => "toggle-theme",
            UiCommand::Save => "save",
            UiCommand::ShowUpdateMsg => "show-update-msg",
        }
    }
}

impl fmt::Display for UiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core→UI event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum CoreEvent {
    #[serde(rename = "executeShortCut")]
    ExecuteShortcut(UiCommand),
}

impl CoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CoreEvent::ExecuteShortcut(_) => EXECUTE_SHORTCUT_EVENT,
        }
    }
}

/// UI→core messages as they arrive over the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "camelCase")]
pub enum UiMessage {
    WriteContent {
        text: String,
    },
    SetVibrancy {
        #[serde(rename = "isLightTheme")]
        is_light_theme: bool,
    },
    ReadContent,
}

impl UiMessage {
    pub fn name(&self) -> &'static str {
        match self {
            UiMessage::WriteContent { .. } => WRITE_CONTENT_REQUEST,
            UiMessage::SetVibrancy { .. } => SET_VIBRANCY_REQUEST,
            UiMessage::ReadContent => READ_CONTENT_REQUEST,
        }
    }
}

/// Body of `latest.json` served by the update host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub version: String,
}

impl VersionDescriptor {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_match_serialized_form() {
        for command in [
            UiCommand::ResetFont,
            UiCommand::DecreaseFont,
            UiCommand::IncreaseFont,
            UiCommand::ToggleTheme,
            UiCommand::Save,
            UiCommand::ShowUpdateMsg,
        ] {
            let json = serde_json::to_string(&command).unwrap();
            assert_eq!(json, format!("\"{}\"", command.as_str()));
        }
    }

    #[test]
    fn execute_shortcut_event_shape() {
        let event = CoreEvent::ExecuteShortcut(UiCommand::ShowUpdateMsg);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "executeShortCut");
        assert_eq!(value["payload"], "show-update-msg");
        assert_eq!(event.name(), EXECUTE_SHORTCUT_EVENT);
    }

    #[test]
    fn parses_ui_messages() {
        let msg: UiMessage =
            serde_json::from_str(r#"{"request":"setVibrancy","isLightTheme":true}"#).unwrap();
        assert_eq!(
            msg,
            UiMessage::SetVibrancy {
                is_light_theme: true
            }
        );

        let msg: UiMessage =
            serde_json::from_str(r#"{"request":"writeContent","text":"hello"}"#).unwrap();
        assert_eq!(msg.name(), WRITE_CONTENT_REQUEST);
    }

    #[test]
    fn version_descriptor_ignores_unknown_fields() {
        let descriptor =
            VersionDescriptor::parse(br#"{"version":"1.4.2","notes":"bugfixes"}"#).unwrap();
        assert_eq!(descriptor.version, "1.4.2");
    }

    #[test]
    fn version_descriptor_rejects_missing_version() {
        assert!(VersionDescriptor::parse(br#"{"name":"x"}"#).is_err());
        assert!(VersionDescriptor::parse(b"<html>").is_err());
    }
}
