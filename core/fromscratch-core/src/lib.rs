//! # fromscratch-core
//!
//! Lifecycle core for FromScratch, a single-document scratchpad. Owns
//! everything with state or failure handling; the window toolkit and the
//! editor UI are reached only through the ports in [`window`], [`shortcuts`]
//! and [`channel`].
//!
//! ## Design Principles
//!
//! - **One coordinating thread**: the [`Coordinator`] handles inputs serially,
//!   so the stores need no locking.
//! - **Graceful degradation**: missing or corrupt state reads as defaults; a
//!   failed update check is only logged.
//! - **Saves are never masked**: a failed content write reaches the caller.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fromscratch_core::{channel, Coordinator, HttpFetcher, LaunchConfig, Wiring};
//!
//! let (inbox, inbox_rx) = channel::inbox();
//! let (events, ui_rx) = channel::ui_events();
//! let mut coordinator = Coordinator::start(
//!     &config,
//!     &mut host,
//!     Wiring { registrar, fetcher: HttpFetcher, events, inbox },
//! )?;
//! coordinator.run(&inbox_rx);
//! ```

pub mod channel;
pub mod cli;
pub mod config;
pub mod content;
pub mod coordinator;
pub mod error;
pub mod kv;
pub mod logging;
pub mod shortcuts;
pub mod storage;
pub mod update;
pub mod version;
pub mod window;

pub use channel::{CoordinatorInput, EventSender, Inbox, InboxSender, UiRequest};
pub use cli::LaunchArgs;
pub use config::{LaunchConfig, APP_NAME, APP_VERSION};
pub use content::ContentStore;
pub use coordinator::{AppContext, Coordinator, Wiring};
pub use error::{Result, ScratchError};
pub use kv::JsonStorage;
pub use shortcuts::{
    RegistrationState, ShortcutBinding, ShortcutDispatcher, ShortcutEffect, ShortcutRegistrar,
    SHORTCUTS,
};
pub use storage::{DataLocation, PortableMode, WINDOW_STATE_KEY};
pub use update::{HttpFetcher, UpdateChecker, UpdateStatus, VersionFetcher};
pub use window::{
    Bounds, Vibrancy, WindowEvent, WindowHost, WindowOptions, WindowPort, WindowState,
    WindowStateManager,
};

pub use fromscratch_protocol as protocol;
