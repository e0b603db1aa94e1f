//! Application lifecycle coordinator.
//!
//! Startup order:
//!
//! 1. open the stores under the resolved data location
//! 2. load window state and create the (hidden) window; failure here is fatal
//! 3. register global shortcuts (the window starts out focused)
//! 4. on `ReadyToShow`: show, restore maximized, focus, start the update check
//!
//! After that the coordinator is purely reactive: every window event, UI
//! request, shortcut trigger and update result arrives through one inbound
//! queue and is handled to completion before the next. Only content writes
//! report failure back to their caller; every other failure is logged and
//! the application carries on.

use std::ops::ControlFlow;
use std::thread::JoinHandle;

use tracing::{debug, error, info, warn};

use crate::channel::{answer, CoordinatorInput, EventSender, Inbox, InboxSender, UiRequest};
use crate::config::LaunchConfig;
use crate::content::ContentStore;
use crate::error::Result;
use crate::kv::JsonStorage;
use crate::shortcuts::{ShortcutDispatcher, ShortcutEffect, ShortcutRegistrar};
use crate::storage::DataLocation;
use crate::update::{UpdateChecker, VersionFetcher};
use crate::window::{Vibrancy, WindowEvent, WindowHost, WindowPort, WindowStateManager};

/// State shared by the coordinator's collaborators. Passed explicitly; there
/// are no process-wide globals.
#[derive(Debug)]
pub struct AppContext {
    location: DataLocation,
    kv: JsonStorage,
    content: ContentStore,
    latest_version: Option<String>,
}

impl AppContext {
    pub fn new(location: DataLocation) -> Self {
        let kv = JsonStorage::new(location.root());
        let content = ContentStore::new(location.content_file());
        Self {
            location,
            kv,
            content,
            latest_version: None,
        }
    }

    pub fn location(&self) -> &DataLocation {
        &self.location
    }

    pub fn kv(&self) -> &JsonStorage {
        &self.kv
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Newest released version, once the update check has found one.
    pub fn latest_version(&self) -> Option<&str> {
        self.latest_version.as_deref()
    }
}

/// Host-side collaborators handed to [`Coordinator::start`].
pub struct Wiring<R, F> {
    pub registrar: R,
    pub fetcher: F,
    pub events: EventSender,
    pub inbox: InboxSender,
}

pub struct Coordinator<W, R, F> {
    ctx: AppContext,
    window: W,
    window_state: WindowStateManager,
    shortcuts: ShortcutDispatcher<R>,
    events: EventSender,
    inbox: InboxSender,
    update_checker: Option<UpdateChecker<F>>,
    update_handle: Option<JoinHandle<()>>,
    macos: bool,
    shown: bool,
}

impl<W, R, F> Coordinator<W, R, F>
where
    W: WindowPort,
    R: ShortcutRegistrar,
    F: VersionFetcher,
{
    /// Runs startup up to window creation and shortcut registration.
    ///
    /// Only a window creation failure is returned; without a window there is
    /// nothing to run.
    pub fn start<H>(config: &LaunchConfig, host: &mut H, wiring: Wiring<R, F>) -> Result<Self>
    where
        H: WindowHost<Window = W>,
    {
        let ctx = AppContext::new(config.location.clone());
        info!(
            data_dir = %ctx.location().root().display(),
            portable = ctx.location().is_portable(),
            version = %config.app_version,
            "Starting"
        );

        let window_state = WindowStateManager::load(ctx.kv());
        let options = window_state.window_options(config.macos);
        let window = host.create(&options)?;

        let shortcuts = ShortcutDispatcher::start(wiring.registrar);
        let update_checker = UpdateChecker::new(
            wiring.fetcher,
            config.update_url(),
            config.app_version.clone(),
        );

        Ok(Self {
            ctx,
            window,
            window_state,
            shortcuts,
            events: wiring.events,
            inbox: wiring.inbox,
            update_checker: Some(update_checker),
            update_handle: None,
            macos: config.macos,
            shown: false,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_state(&self) -> &WindowStateManager {
        &self.window_state
    }

    pub fn shortcuts(&self) -> &ShortcutDispatcher<R> {
        &self.shortcuts
    }

    /// Handles inputs until quit, close or the inbox is closed.
    ///
    /// Pending window events are drained before every queued input.
    pub fn run(&mut self, inbox: &Inbox) {
        loop {
            if self.drain_window_events(inbox).is_break() {
                break;
            }
            let Ok(input) = inbox.recv() else {
                break;
            };
            if self.handle(input).is_break() {
                break;
            }
        }
        debug!("Coordinator loop finished");
    }

    /// Handles the window events posted through [`InboxSender::post_window`].
    pub fn drain_window_events(&mut self, inbox: &Inbox) -> ControlFlow<()> {
        for event in inbox.take_window_events() {
            if self.on_window_event(event).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    pub fn handle(&mut self, input: CoordinatorInput) -> ControlFlow<()> {
        match input {
            CoordinatorInput::Window(event) => return self.on_window_event(event),
            CoordinatorInput::Ui(request) => self.on_ui_request(request),
            CoordinatorInput::Shortcut(accelerator) => return self.on_shortcut(&accelerator),
            CoordinatorInput::UpdateAvailable(latest) => {
                self.ctx.latest_version = Some(latest);
            }
            // Drained by `run` before the next input.
            CoordinatorInput::WindowPending => {}
            CoordinatorInput::Shutdown => {
                self.persist_window_state();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Blocks until the update check thread, if started, has finished.
    pub fn wait_for_update_check(&mut self) {
        if let Some(handle) = self.update_handle.take() {
            if handle.join().is_err() {
                warn!("Update check thread panicked");
            }
        }
    }

    fn on_window_event(&mut self, event: WindowEvent) -> ControlFlow<()> {
        match event {
            WindowEvent::ReadyToShow => self.on_ready_to_show(),
            WindowEvent::Resized | WindowEvent::Moved => self.persist_window_state(),
            // Closing the only window ends the application.
            WindowEvent::CloseRequested => {
                self.persist_window_state();
                self.window.quit();
                return ControlFlow::Break(());
            }
            WindowEvent::Focused => self.shortcuts.on_focus(),
            WindowEvent::Blurred => self.shortcuts.on_blur(),
        }
        ControlFlow::Continue(())
    }

    fn on_ready_to_show(&mut self) {
        if self.shown {
            return;
        }
        self.shown = true;

        if let Err(err) = self.window.show() {
            warn!(error = %err, "Failed to show window");
        }
        if let Err(err) = self.window_state.restore_after_show(&mut self.window) {
            warn!(error = %err, "Failed to restore maximized state");
        }
        if let Err(err) = self.window.focus() {
            warn!(error = %err, "Failed to focus window");
        }
        self.start_update_check();
    }

    fn start_update_check(&mut self) {
        let Some(checker) = self.update_checker.take() else {
            return;
        };
        debug!(url = checker.url(), "Checking for updates");
        match checker.spawn(self.events.clone(), self.inbox.clone()) {
            Ok(handle) => self.update_handle = Some(handle),
            Err(err) => warn!(error = %err, "Failed to start update check"),
        }
    }

    fn on_ui_request(&mut self, request: UiRequest) {
        match request {
            UiRequest::WriteContent { text, reply } => {
                let result = self.ctx.content.write(&text);
                if let Err(err) = &result {
                    error!(error = %err, "Saving content failed");
                } else {
                    debug!(bytes = text.len(), "Content saved");
                }
                answer(reply, result);
            }
            UiRequest::ReadContent { reply } => {
                let result = self.ctx.content.read();
                if let Err(err) = &result {
                    warn!(error = %err, "Reading content failed");
                }
                answer(reply, result);
            }
            UiRequest::LatestVersion { reply } => {
                answer(reply, Ok(self.ctx.latest_version.clone()));
            }
            UiRequest::SetVibrancy { light_theme } => {
                if !self.macos {
                    debug!(light_theme, "Vibrancy unsupported on this platform");
                    return;
                }
                if let Err(err) = self.window.set_vibrancy(Vibrancy::for_theme(light_theme)) {
                    warn!(error = %err, "Failed to set vibrancy");
                }
            }
        }
    }

    fn on_shortcut(&mut self, accelerator: &str) -> ControlFlow<()> {
        match self.shortcuts.resolve(accelerator) {
            Some(ShortcutEffect::Dispatch(command)) => {
                self.events.execute(command);
            }
            Some(ShortcutEffect::Quit) => {
                info!(accelerator, "Quit requested");
                self.persist_window_state();
                self.window.quit();
                return ControlFlow::Break(());
            }
            Some(ShortcutEffect::ToggleFullscreen) => self.toggle_fullscreen(),
            Some(ShortcutEffect::Disabled) => debug!(accelerator, "Disabled shortcut"),
            None => {}
        }
        ControlFlow::Continue(())
    }

    fn toggle_fullscreen(&mut self) {
        let result = self
            .window
            .is_fullscreen()
            .and_then(|fullscreen| self.window.set_fullscreen(!fullscreen));
        if let Err(err) = result {
            warn!(error = %err, "Failed to toggle fullscreen");
        }
    }

    fn persist_window_state(&mut self) {
        if let Err(err) = self.window_state.persist(&self.window, &self.ctx.kv) {
            warn!(error = %err, "Failed to persist window state");
        }
    }
}
