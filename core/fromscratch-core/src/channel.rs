//! Typed, bounded channels between the coordinator and everything else.
//!
//! - **Inbound** (`CoordinatorInput`): the host, the UI bridge and the update
//!   checker thread all post here. The coordinator drains it serially.
//!   Window events from the host's event loop bypass the queue: they are
//!   folded into a pending set (one geometry change, the latest focus, ready,
//!   close) and a single wake-up is queued. Posting one never blocks and never
//!   loses a focus change or a close.
//! - **Outbound** (`CoreEvent`): commands for the UI. Sends never block; a full
//!   or closed channel drops the event with a warning.

use std::sync::mpsc::{self, Receiver, RecvError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fromscratch_protocol::{CoreEvent, UiCommand};
use tracing::{debug, warn};

use crate::error::{Result, ScratchError};
use crate::window::WindowEvent;

pub const CHANNEL_CAPACITY: usize = 64;

/// Where the outcome of a UI request is delivered, if the caller wants it.
pub type Reply<T> = Option<mpsc::Sender<Result<T>>>;

/// Requests from the UI layer.
#[derive(Debug)]
pub enum UiRequest {
    WriteContent { text: String, reply: Reply<()> },
    ReadContent { reply: Reply<Option<String>> },
    SetVibrancy { light_theme: bool },
    /// Newest release found by the update check, if any.
    LatestVersion { reply: Reply<Option<String>> },
}

impl UiRequest {
    pub fn write_content(text: impl Into<String>) -> Self {
        UiRequest::WriteContent {
            text: text.into(),
            reply: None,
        }
    }

    /// Converts a bridge message; replies, if any, are attached by the caller.
    pub fn from_message(message: fromscratch_protocol::UiMessage) -> Self {
        use fromscratch_protocol::UiMessage;
        match message {
            UiMessage::WriteContent { text } => UiRequest::WriteContent { text, reply: None },
            UiMessage::ReadContent => UiRequest::ReadContent { reply: None },
            UiMessage::SetVibrancy { is_light_theme } => UiRequest::SetVibrancy {
                light_theme: is_light_theme,
            },
        }
    }
}

/// Everything the coordinator reacts to.
#[derive(Debug)]
pub enum CoordinatorInput {
    Window(WindowEvent),
    Ui(UiRequest),
    /// A registered global accelerator fired.
    Shortcut(String),
    /// The update check found a newer release.
    UpdateAvailable(String),
    /// Window events are waiting in the pending set.
    WindowPending,
    Shutdown,
}

#[derive(Debug, Default)]
struct PendingWindow {
    ready: bool,
    focused: Option<bool>,
    geometry: Option<WindowEvent>,
    close: bool,
    wake_queued: bool,
    closed: bool,
}

type SharedPending = Arc<Mutex<PendingWindow>>;

fn lock(pending: &SharedPending) -> MutexGuard<'_, PendingWindow> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates the inbound queue.
pub fn inbox() -> (InboxSender, Inbox) {
    let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);
    let pending = SharedPending::default();
    (
        InboxSender {
            tx,
            pending: Arc::clone(&pending),
        },
        Inbox { rx, pending },
    )
}

/// Receiving end of the inbound queue.
#[derive(Debug)]
pub struct Inbox {
    rx: Receiver<CoordinatorInput>,
    pending: SharedPending,
}

impl Inbox {
    pub fn recv(&self) -> std::result::Result<CoordinatorInput, RecvError> {
        self.rx.recv()
    }

    pub fn try_recv(&self) -> std::result::Result<CoordinatorInput, TryRecvError> {
        self.rx.try_recv()
    }

    /// Drains the pending window events in handling order: ready, focus,
    /// geometry, close.
    pub fn take_window_events(&self) -> Vec<WindowEvent> {
        let mut pending = lock(&self.pending);
        pending.wake_queued = false;
        let mut events = Vec::new();
        if std::mem::take(&mut pending.ready) {
            events.push(WindowEvent::ReadyToShow);
        }
        match pending.focused.take() {
            Some(true) => events.push(WindowEvent::Focused),
            Some(false) => events.push(WindowEvent::Blurred),
            None => {}
        }
        events.extend(pending.geometry.take());
        if std::mem::take(&mut pending.close) {
            events.push(WindowEvent::CloseRequested);
        }
        events
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        lock(&self.pending).closed = true;
    }
}

/// Creates the outbound event channel.
pub fn ui_events() -> (EventSender, Receiver<CoreEvent>) {
    let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);
    (EventSender { tx }, rx)
}

#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: SyncSender<CoordinatorInput>,
    pending: SharedPending,
}

impl InboxSender {
    /// Posts to the coordinator, waiting if the queue is full.
    pub fn send(&self, input: CoordinatorInput) -> Result<()> {
        self.tx
            .send(input)
            .map_err(|_| ScratchError::ChannelClosed("coordinator inbox"))
    }

    /// Posts without waiting. Drops the input with a warning when the queue is
    /// full; for callers on the host's event loop thread, which the
    /// coordinator may itself be waiting on.
    pub fn try_send(&self, input: CoordinatorInput) -> bool {
        match self.tx.try_send(input) {
            Ok(()) => true,
            Err(TrySendError::Full(input)) => {
                warn!(input = ?input, "Coordinator inbox full; dropping input");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Records a window event without waiting. Returns `false` once the
    /// coordinator is gone.
    ///
    /// Consecutive resizes and moves collapse into one; a later focus change
    /// replaces an earlier unhandled one.
    pub fn post_window(&self, event: WindowEvent) -> bool {
        let mut pending = lock(&self.pending);
        if pending.closed {
            return false;
        }
        match event {
            WindowEvent::ReadyToShow => pending.ready = true,
            WindowEvent::Focused => pending.focused = Some(true),
            WindowEvent::Blurred => pending.focused = Some(false),
            WindowEvent::Resized | WindowEvent::Moved => pending.geometry = Some(event),
            WindowEvent::CloseRequested => pending.close = true,
        }
        if pending.wake_queued {
            return true;
        }
        // A full queue means the coordinator is busy and drains the pending
        // set before its next input anyway.
        match self.tx.try_send(CoordinatorInput::WindowPending) {
            Ok(()) => pending.wake_queued = true,
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => return false,
        }
        true
    }

    /// Sends a write request and waits for the coordinator's answer.
    pub fn write_content(&self, text: impl Into<String>) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(CoordinatorInput::Ui(UiRequest::WriteContent {
            text: text.into(),
            reply: Some(reply_tx),
        }))?;
        reply_rx
            .recv()
            .map_err(|_| ScratchError::ChannelClosed("write reply"))?
    }

    pub fn read_content(&self) -> Result<Option<String>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(CoordinatorInput::Ui(UiRequest::ReadContent {
            reply: Some(reply_tx),
        }))?;
        reply_rx
            .recv()
            .map_err(|_| ScratchError::ChannelClosed("read reply"))?
    }

    pub fn latest_version(&self) -> Result<Option<String>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(CoordinatorInput::Ui(UiRequest::LatestVersion {
            reply: Some(reply_tx),
        }))?;
        reply_rx
            .recv()
            .map_err(|_| ScratchError::ChannelClosed("version reply"))?
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    tx: SyncSender<CoreEvent>,
}

impl EventSender {
    /// Fire-and-forget: returns whether the event was queued.
    pub fn emit(&self, event: CoreEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(event = ?event, "UI event channel full; dropping event");
                false
            }
            Err(TrySendError::Disconnected(event)) => {
                debug!(event = ?event, "UI event channel closed; dropping event");
                false
            }
        }
    }

    pub fn execute(&self, command: UiCommand) -> bool {
        self.emit(CoreEvent::ExecuteShortcut(command))
    }
}

/// Delivers `result` to `reply` when present, otherwise hands it back.
pub(crate) fn answer<T>(reply: Reply<T>, result: Result<T>) -> Option<Result<T>> {
    match reply {
        Some(tx) => {
            // A caller that stopped waiting is not an error for us.
            let _ = tx.send(result);
            None
        }
        None => Some(result),
    }
}
