mod accelerator;
mod window;

use std::path::Path;
use std::sync::mpsc::Receiver;
use std::thread;

use fromscratch_core::channel::{self, CoordinatorInput, InboxSender, UiRequest};
use fromscratch_core::protocol::{CoreEvent, UiMessage};
use fromscratch_core::window::WindowEvent;
use fromscratch_core::{logging, Coordinator, HttpFetcher, LaunchArgs, LaunchConfig, Wiring};
use tauri::{AppHandle, Emitter, Manager, RunEvent, State};
use tauri_plugin_global_shortcut::ShortcutState;
use tracing::{debug, error, info, warn};

use crate::accelerator::{accelerator_for, TauriRegistrar};
use crate::window::{TauriHost, MAIN_WINDOW_LABEL};

/// Managed state: the way into the coordinator.
struct Bridge {
    inbox: InboxSender,
}

/// Runs a blocking coordinator round trip off the event loop thread, which
/// the coordinator may need while answering.
async fn blocking<T, F>(f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> fromscratch_core::Result<T> + Send + 'static,
{
    tauri::async_runtime::spawn_blocking(f)
        .await
        .map_err(|e| e.to_string())?
        .map_err(String::from)
}

/// Content writes, reads and vibrancy changes from the editor page.
///
/// Answers with the stored text for `readContent` and nothing otherwise.
#[tauri::command]
async fn ui_request(
    message: UiMessage,
    bridge: State<'_, Bridge>,
) -> Result<Option<String>, String> {
    debug!(request = message.name(), "UI request");
    let inbox = bridge.inbox.clone();
    blocking(move || match message {
        UiMessage::WriteContent { text } => inbox.write_content(text).map(|()| None),
        UiMessage::ReadContent => inbox.read_content(),
        other => inbox
            .send(CoordinatorInput::Ui(UiRequest::from_message(other)))
            .map(|()| None),
    })
    .await
}

#[tauri::command]
async fn latest_version(bridge: State<'_, Bridge>) -> Result<Option<String>, String> {
    let inbox = bridge.inbox.clone();
    blocking(move || inbox.latest_version()).await
}

fn forward_ui_events(app: AppHandle, events: Receiver<CoreEvent>) {
    for event in events {
        let CoreEvent::ExecuteShortcut(command) = &event;
        if let Err(err) = app.emit(event.name(), command.as_str()) {
            warn!(error = %err, command = %command, "Failed to deliver UI command");
        }
    }
    debug!("UI event forwarder finished");
}

fn on_window_event(window: &tauri::Window, event: &tauri::WindowEvent) {
    if window.label() != MAIN_WINDOW_LABEL {
        return;
    }
    let Some(bridge) = window.try_state::<Bridge>() else {
        return;
    };
    let event = match event {
        tauri::WindowEvent::Resized(_) => WindowEvent::Resized,
        tauri::WindowEvent::Moved(_) => WindowEvent::Moved,
        tauri::WindowEvent::Focused(true) => WindowEvent::Focused,
        tauri::WindowEvent::Focused(false) => WindowEvent::Blurred,
        tauri::WindowEvent::CloseRequested { api, .. } => {
            // The coordinator persists state, then exits the app. Without a
            // coordinator the close just goes ahead.
            if bridge.inbox.post_window(WindowEvent::CloseRequested) {
                api.prevent_close();
            }
            return;
        }
        _ => return,
    };
    bridge.inbox.post_window(event);
}

fn shortcut_plugin() -> tauri::plugin::TauriPlugin<tauri::Wry> {
    tauri_plugin_global_shortcut::Builder::new()
        .with_handler(|app, shortcut, event| {
            if event.state() != ShortcutState::Pressed {
                return;
            }
            let Some(accelerator) = accelerator_for(shortcut) else {
                debug!(shortcut = ?shortcut, "Shortcut outside the table");
                return;
            };
            if let Some(bridge) = app.try_state::<Bridge>() {
                bridge
                    .inbox
                    .try_send(CoordinatorInput::Shortcut(accelerator.to_string()));
            }
        })
        .build()
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let args = LaunchArgs::from_process();
    let config = match LaunchConfig::from_env(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("fromscratch: {err}");
            std::process::exit(1);
        }
    };
    let mut log_guard = logging::init(&config.location.log_dir());

    let (inbox, inbox_rx) = channel::inbox();
    let (events, ui_rx) = channel::ui_events();
    let bridge_inbox = inbox.clone();

    let app = tauri::Builder::default()
        .plugin(shortcut_plugin())
        .manage(Bridge {
            inbox: bridge_inbox,
        })
        .on_window_event(on_window_event)
        .setup(move |app| {
            let handle = app.handle().clone();
            let profile_dir = config.location.webview_profile_dir().map(Path::to_path_buf);
            let mut host = TauriHost::new(handle.clone(), inbox.clone(), profile_dir);
            let wiring = Wiring {
                registrar: TauriRegistrar::new(handle.clone()),
                fetcher: HttpFetcher,
                events,
                inbox,
            };

            let mut coordinator = match Coordinator::start(&config, &mut host, wiring) {
                Ok(coordinator) => coordinator,
                Err(err) => {
                    error!(error = %err, "Cannot create the main window");
                    std::process::exit(1);
                }
            };

            thread::Builder::new()
                .name("coordinator".to_string())
                .spawn(move || coordinator.run(&inbox_rx))?;
            thread::Builder::new()
                .name("ui-events".to_string())
                .spawn(move || forward_ui_events(handle, ui_rx))?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![ui_request, latest_version])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(move |_app, event| {
        if let RunEvent::Exit = event {
            info!("Exiting");
            // Flush the file log before the process goes away.
            drop(log_guard.take());
        }
    });
}
