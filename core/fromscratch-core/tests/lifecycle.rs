//! End-to-end lifecycle tests against fake window, shortcut and network ports.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use fromscratch_core::channel::{self, Reply, CHANNEL_CAPACITY};
use fromscratch_core::protocol::{CoreEvent, UiCommand};
use fromscratch_core::{
    Bounds, CoordinatorInput, Coordinator, Inbox, InboxSender, JsonStorage, LaunchConfig, RegistrationState, Result,
    ScratchError, ShortcutRegistrar, UiRequest, VersionFetcher, Vibrancy, WindowEvent, WindowHost,
    WindowOptions, WindowPort, WindowState, Wiring, WINDOW_STATE_KEY,
};
use tempfile::TempDir;

// ─────────────────────────────────────────────────────────────────────────────
// Fakes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct WindowLog {
    shown: usize,
    focused: usize,
    maximize_calls: usize,
    maximized: bool,
    fullscreen: bool,
    bounds: Option<Bounds>,
    vibrancy: Vec<Vibrancy>,
    quit: bool,
}

#[derive(Clone, Default)]
struct FakeWindow {
    log: Arc<Mutex<WindowLog>>,
}

impl FakeWindow {
    fn with<T>(&self, f: impl FnOnce(&mut WindowLog) -> T) -> T {
        f(&mut self.log.lock().unwrap())
    }

    fn user_moves_to(&self, bounds: Bounds) {
        self.with(|log| log.bounds = Some(bounds));
    }

    fn user_maximizes(&self) {
        self.with(|log| {
            log.maximized = true;
            log.bounds = Some(Bounds::new(0, 0, 1920, 1080));
        });
    }
}

impl WindowPort for FakeWindow {
    fn show(&mut self) -> Result<()> {
        self.with(|log| log.shown += 1);
        Ok(())
    }

    fn focus(&mut self) -> Result<()> {
        self.with(|log| log.focused += 1);
        Ok(())
    }

    fn maximize(&mut self) -> Result<()> {
        self.with(|log| {
            log.maximize_calls += 1;
            log.maximized = true;
        });
        Ok(())
    }

    fn is_maximized(&self) -> Result<bool> {
        Ok(self.with(|log| log.maximized))
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.with(|log| log.fullscreen = fullscreen);
        Ok(())
    }

    fn is_fullscreen(&self) -> Result<bool> {
        Ok(self.with(|log| log.fullscreen))
    }

    fn bounds(&self) -> Result<Bounds> {
        self.with(|log| log.bounds)
            .ok_or_else(|| ScratchError::window("bounds", "window has no geometry yet"))
    }

    fn set_vibrancy(&mut self, vibrancy: Vibrancy) -> Result<()> {
        self.with(|log| log.vibrancy.push(vibrancy));
        Ok(())
    }

    fn quit(&mut self) {
        self.with(|log| log.quit = true);
    }
}

#[derive(Default)]
struct FakeHost {
    created: Vec<WindowOptions>,
    window: FakeWindow,
    fail: bool,
}

impl WindowHost for FakeHost {
    type Window = FakeWindow;

    fn create(&mut self, options: &WindowOptions) -> Result<FakeWindow> {
        if self.fail {
            return Err(ScratchError::WindowCreation("no display".to_string()));
        }
        self.created.push(options.clone());
        let window = self.window.clone();
        window.with(|log| {
            log.bounds = Some(Bounds::new(
                options.x.unwrap_or(200),
                options.y.unwrap_or(150),
                options.width,
                options.height,
            ))
        });
        Ok(window)
    }
}

#[derive(Default)]
struct FakeRegistrar {
    active: Vec<String>,
}

impl ShortcutRegistrar for FakeRegistrar {
    fn register(&mut self, accelerator: &str) -> Result<()> {
        self.active.push(accelerator.to_string());
        Ok(())
    }

    fn unregister_all(&mut self) -> Result<()> {
        self.active.clear();
        Ok(())
    }
}

#[derive(Clone)]
struct FakeFetcher {
    body: Option<&'static str>,
    calls: Arc<Mutex<usize>>,
}

impl FakeFetcher {
    fn serving(body: &'static str) -> Self {
        Self {
            body: Some(body),
            calls: Arc::default(),
        }
    }

    fn offline() -> Self {
        Self {
            body: None,
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl VersionFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        *self.calls.lock().unwrap() += 1;
        self.body
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| ScratchError::UpdateTransport {
                url: url.to_string(),
                details: "offline".to_string(),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

struct Harness {
    coordinator: Coordinator<FakeWindow, FakeRegistrar, FakeFetcher>,
    host: FakeHost,
    fetcher: FakeFetcher,
    ui: Receiver<CoreEvent>,
    inbox: Inbox,
    sender: InboxSender,
}

fn config_for(root: &Path) -> LaunchConfig {
    let mut config = LaunchConfig::with_root(root);
    config.app_version = "1.3.0".to_string();
    config.macos = false;
    config
}

fn start_with(config: &LaunchConfig, fetcher: FakeFetcher) -> Harness {
    let (inbox_tx, inbox) = channel::inbox();
    let (events, ui) = channel::ui_events();
    let mut host = FakeHost::default();
    let coordinator = Coordinator::start(
        config,
        &mut host,
        Wiring {
            registrar: FakeRegistrar::default(),
            fetcher: fetcher.clone(),
            events,
            inbox: inbox_tx.clone(),
        },
    )
    .unwrap();
    Harness {
        coordinator,
        host,
        fetcher,
        ui,
        inbox,
        sender: inbox_tx,
    }
}

fn start(root: &Path) -> Harness {
    start_with(&config_for(root), FakeFetcher::offline())
}

fn stored_state(root: &Path) -> Option<WindowState> {
    JsonStorage::new(root).get(WINDOW_STATE_KEY).unwrap()
}

fn read_content(harness: &mut Harness) -> Result<Option<String>> {
    let (tx, rx) = mpsc::channel();
    let reply: Reply<Option<String>> = Some(tx);
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Ui(UiRequest::ReadContent { reply }));
    rx.recv().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Startup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn first_run_opens_default_window_with_no_content() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());

    let options = &harness.host.created[0];
    assert_eq!((options.width, options.height), (550, 450));
    assert_eq!((options.x, options.y), (None, None));
    assert!(!options.visible);

    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::ReadyToShow));
    harness.coordinator.wait_for_update_check();

    harness.coordinator.window().with(|log| {
        assert_eq!(log.shown, 1);
        assert_eq!(log.focused, 1);
        assert_eq!(log.maximize_calls, 0);
    });
    assert_eq!(read_content(&mut harness).unwrap(), None);
}

#[test]
fn restores_geometry_and_maximized_flag() {
    let tmp = TempDir::new().unwrap();
    let saved = Bounds::new(40, 60, 900, 700);
    JsonStorage::new(tmp.path())
        .set(
            WINDOW_STATE_KEY,
            &WindowState {
                bounds: Some(saved),
                is_maximized: true,
            },
        )
        .unwrap();

    let mut harness = start(tmp.path());
    let options = &harness.host.created[0];
    assert_eq!((options.x, options.y), (Some(40), Some(60)));
    assert_eq!((options.width, options.height), (900, 700));

    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::ReadyToShow));
    harness.coordinator.wait_for_update_check();
    assert_eq!(
        harness.coordinator.window().with(|log| log.maximize_calls),
        1
    );

    // Resizing while maximized only refreshes the flag.
    harness.coordinator.window().user_maximizes();
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::Resized));
    let state = stored_state(tmp.path()).unwrap();
    assert!(state.is_maximized);
    assert_eq!(state.bounds, Some(saved));
}

#[test]
fn corrupt_window_state_still_opens_window() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(WINDOW_STATE_KEY), "{\"bounds\": [").unwrap();

    let harness = start(tmp.path());
    let options = &harness.host.created[0];
    assert_eq!((options.width, options.height), (550, 450));
}

#[test]
fn window_creation_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let (inbox, _inbox_rx) = channel::inbox();
    let (events, _ui_rx) = channel::ui_events();
    let mut host = FakeHost {
        fail: true,
        ..Default::default()
    };
    let result = Coordinator::start(
        &config_for(tmp.path()),
        &mut host,
        Wiring {
            registrar: FakeRegistrar::default(),
            fetcher: FakeFetcher::offline(),
            events,
            inbox,
        },
    );
    assert!(matches!(result, Err(ScratchError::WindowCreation(_))));
}

// ─────────────────────────────────────────────────────────────────────────────
// Window state
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn move_and_resize_capture_live_bounds_when_not_maximized() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());

    let moved = Bounds::new(10, 20, 550, 450);
    harness.coordinator.window().user_moves_to(moved);
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::Moved));
    assert_eq!(stored_state(tmp.path()).unwrap().bounds, Some(moved));

    let resized = Bounds::new(10, 20, 1000, 800);
    harness.coordinator.window().user_moves_to(resized);
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::Resized));
    let state = stored_state(tmp.path()).unwrap();
    assert_eq!(state.bounds, Some(resized));
    assert!(!state.is_maximized);
}

#[test]
fn close_persists_and_ends_the_loop() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    harness
        .coordinator
        .window()
        .user_moves_to(Bounds::new(1, 1, 600, 500));

    let flow = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::CloseRequested));
    assert_eq!(flow, ControlFlow::Break(()));
    assert!(harness.coordinator.window().with(|log| log.quit));
    assert_eq!(
        stored_state(tmp.path()).unwrap().bounds,
        Some(Bounds::new(1, 1, 600, 500))
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Shortcuts
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn shortcuts_follow_focus() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    assert_eq!(
        harness.coordinator.shortcuts().state(),
        RegistrationState::Registered
    );

    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::Blurred));
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Shortcut("CmdOrCtrl+S".to_string()));
    assert_eq!(harness.ui.try_iter().count(), 0);
    assert!(harness.coordinator.shortcuts().registrar().active.is_empty());

    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::Focused));
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::Focused));
    assert_eq!(harness.coordinator.shortcuts().registrar().active.len(), 10);

    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Shortcut("CmdOrCtrl+S".to_string()));
    let events: Vec<_> = harness.ui.try_iter().collect();
    assert_eq!(events, vec![CoreEvent::ExecuteShortcut(UiCommand::Save)]);
}

#[test]
fn posted_window_events_survive_a_resize_flood() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    for _ in 0..CHANNEL_CAPACITY {
        assert!(harness
            .sender
            .try_send(CoordinatorInput::Shortcut("CmdOrCtrl+=".to_string())));
    }

    harness
        .coordinator
        .window()
        .user_moves_to(Bounds::new(40, 50, 700, 520));
    for _ in 0..500 {
        assert!(harness.sender.post_window(WindowEvent::Resized));
    }
    assert!(harness.sender.post_window(WindowEvent::Blurred));

    let flow = harness.coordinator.drain_window_events(&harness.inbox);
    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(
        harness.coordinator.shortcuts().state(),
        RegistrationState::Unregistered
    );
    assert_eq!(
        stored_state(tmp.path()).unwrap().bounds,
        Some(Bounds::new(40, 50, 700, 520))
    );

    assert!(harness.sender.post_window(WindowEvent::CloseRequested));
    let flow = harness.coordinator.drain_window_events(&harness.inbox);
    assert_eq!(flow, ControlFlow::Break(()));
    assert!(harness.coordinator.window().with(|log| log.quit));
}

#[test]
fn both_increase_font_accelerators_dispatch() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    for accelerator in ["CmdOrCtrl+=", "CmdOrCtrl+Plus"] {
        let _ = harness
            .coordinator
            .handle(CoordinatorInput::Shortcut(accelerator.to_string()));
    }
    let events: Vec<_> = harness.ui.try_iter().collect();
    assert_eq!(
        events,
        vec![
            CoreEvent::ExecuteShortcut(UiCommand::IncreaseFont),
            CoreEvent::ExecuteShortcut(UiCommand::IncreaseFont),
        ]
    );
}

#[test]
fn reload_shortcut_is_inert() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    let flow = harness
        .coordinator
        .handle(CoordinatorInput::Shortcut("CmdOrCtrl+R".to_string()));
    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(harness.ui.try_iter().count(), 0);
    assert!(!harness.coordinator.window().with(|log| log.quit));
}

#[test]
fn quit_shortcuts_persist_and_quit() {
    for accelerator in ["CmdOrCtrl+W", "CmdOrCtrl+Q"] {
        let tmp = TempDir::new().unwrap();
        let mut harness = start(tmp.path());
        let flow = harness
            .coordinator
            .handle(CoordinatorInput::Shortcut(accelerator.to_string()));
        assert_eq!(flow, ControlFlow::Break(()));
        assert!(harness.coordinator.window().with(|log| log.quit));
        assert!(stored_state(tmp.path()).is_some());
    }
}

#[test]
fn f11_toggles_fullscreen() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Shortcut("F11".to_string()));
    assert!(harness.coordinator.window().with(|log| log.fullscreen));
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Shortcut("F11".to_string()));
    assert!(!harness.coordinator.window().with(|log| log.fullscreen));
}

// ─────────────────────────────────────────────────────────────────────────────
// Content and theme requests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn content_round_trip_through_requests() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());

    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Ui(UiRequest::write_content("hello")));
    assert_eq!(read_content(&mut harness).unwrap().as_deref(), Some("hello"));
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("content.txt")).unwrap(),
        "hello"
    );
}

#[test]
fn failed_write_reaches_the_caller() {
    let tmp = TempDir::new().unwrap();
    // content.txt is a directory, so the save cannot succeed.
    std::fs::create_dir(tmp.path().join("content.txt")).unwrap();
    let mut harness = start(tmp.path());

    let (tx, rx) = mpsc::channel();
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Ui(UiRequest::WriteContent {
            text: "precious".to_string(),
            reply: Some(tx),
        }));
    let err = rx.recv().unwrap().unwrap_err();
    assert!(matches!(err, ScratchError::ContentWriteFailed { .. }));
}

#[test]
fn vibrancy_only_applies_on_macos() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Ui(UiRequest::SetVibrancy { light_theme: true }));
    assert!(harness.coordinator.window().with(|log| log.vibrancy.is_empty()));

    let mut config = config_for(tmp.path());
    config.macos = true;
    let mut harness = start_with(&config, FakeFetcher::offline());
    assert_eq!(harness.host.created[0].background_color, None);
    for light_theme in [true, false] {
        let _ = harness
            .coordinator
            .handle(CoordinatorInput::Ui(UiRequest::SetVibrancy { light_theme }));
    }
    assert_eq!(
        harness.coordinator.window().with(|log| log.vibrancy.clone()),
        vec![Vibrancy::MediumLight, Vibrancy::UltraDark]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Update check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn newer_release_notifies_once_and_is_recorded() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start_with(
        &config_for(tmp.path()),
        FakeFetcher::serving(r#"{"version":"1.10.0"}"#),
    );

    for _ in 0..2 {
        let _ = harness
            .coordinator
            .handle(CoordinatorInput::Window(WindowEvent::ReadyToShow));
    }
    harness.coordinator.wait_for_update_check();

    assert_eq!(harness.fetcher.calls(), 1);
    let events: Vec<_> = harness.ui.try_iter().collect();
    assert_eq!(
        events,
        vec![CoreEvent::ExecuteShortcut(UiCommand::ShowUpdateMsg)]
    );

    let input = harness.inbox.try_recv().unwrap();
    let _ = harness.coordinator.handle(input);
    assert_eq!(harness.coordinator.context().latest_version(), Some("1.10.0"));
}

#[test]
fn same_or_older_release_is_silent() {
    for body in [r#"{"version":"1.3.0"}"#, r#"{"version":"1.2.12"}"#] {
        let tmp = TempDir::new().unwrap();
        let mut harness = start_with(&config_for(tmp.path()), FakeFetcher::serving(body));
        let _ = harness
            .coordinator
            .handle(CoordinatorInput::Window(WindowEvent::ReadyToShow));
        harness.coordinator.wait_for_update_check();
        assert_eq!(harness.ui.try_iter().count(), 0);
        assert!(harness.inbox.try_recv().is_err());
        assert_eq!(harness.coordinator.context().latest_version(), None);
    }
}

#[test]
fn offline_update_check_does_not_block_startup() {
    let tmp = TempDir::new().unwrap();
    let mut harness = start(tmp.path());
    let _ = harness
        .coordinator
        .handle(CoordinatorInput::Window(WindowEvent::ReadyToShow));
    harness.coordinator.wait_for_update_check();

    assert_eq!(harness.fetcher.calls(), 1);
    assert_eq!(harness.ui.try_iter().count(), 0);
    assert_eq!(harness.coordinator.window().with(|log| log.shown), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Threaded loop
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn coordinator_thread_serves_bridge_requests() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(tmp.path());
    let (inbox, inbox_rx) = channel::inbox();
    let (events, _ui_rx) = channel::ui_events();
    let mut host = FakeHost::default();
    let mut coordinator = Coordinator::start(
        &config,
        &mut host,
        Wiring {
            registrar: FakeRegistrar::default(),
            fetcher: FakeFetcher::offline(),
            events,
            inbox: inbox.clone(),
        },
    )
    .unwrap();

    let worker = thread::spawn(move || {
        coordinator.run(&inbox_rx);
        coordinator.wait_for_update_check();
    });

    assert_eq!(inbox.read_content().unwrap(), None);
    inbox.write_content("draft one").unwrap();
    inbox.write_content("draft two").unwrap();
    assert_eq!(inbox.read_content().unwrap().as_deref(), Some("draft two"));
    assert_eq!(inbox.latest_version().unwrap(), None);

    inbox.send(CoordinatorInput::Shutdown).unwrap();
    worker.join().unwrap();
    assert!(stored_state(tmp.path()).is_some());
}
