//! Data location resolution and path management.
//!
//! Every file the application persists lives under one directory, chosen once
//! at startup:
//!
//! - **Default**: `~/.fromscratch` (`~/.fromscratch/dev` in development mode)
//! - **Portable**: the path given to `--portable`, or `<cwd>/userdata` when the
//!   flag is given without a path
//!
//! In portable mode the same directory is handed to the host webview as its
//! profile directory, so nothing is written outside it.

use std::path::{Path, PathBuf};

use crate::error::{Result, ScratchError};

const DATA_DIR_NAME: &str = ".fromscratch";
const DEV_SUBDIR: &str = "dev";
const PORTABLE_DIR_NAME: &str = "userdata";

/// Key under which the window geometry is persisted in the key-value store.
pub const WINDOW_STATE_KEY: &str = "windowstate";

const CONTENT_FILE: &str = "content.txt";
const LOG_DIR: &str = "logs";

/// How the data directory is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortableMode {
    Off,
    /// `--portable` without a path: `<cwd>/userdata`.
    WorkingDir,
    /// `--portable=PATH`.
    Path(PathBuf),
}

impl PortableMode {
    /// Maps the raw `--portable` flag value; an empty value means "no path given".
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            None => PortableMode::Off,
            Some("") => PortableMode::WorkingDir,
            Some(path) => PortableMode::Path(PathBuf::from(path)),
        }
    }

    pub fn is_portable(&self) -> bool {
        !matches!(self, PortableMode::Off)
    }
}

/// The resolved data directory and the files inside it.
///
/// Production code uses [`DataLocation::resolve`]; tests use
/// [`DataLocation::with_root`] to point at a temp directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLocation {
    root: PathBuf,
    portable: bool,
}

impl DataLocation {
    /// Resolves the data directory from the launch mode.
    ///
    /// `home` and `cwd` are passed in rather than looked up so resolution can be
    /// exercised without touching the process environment.
    pub fn resolve(
        mode: &PortableMode,
        development: bool,
        home: Option<&Path>,
        cwd: Option<&Path>,
    ) -> Result<Self> {
        let location = match mode {
            PortableMode::Off => {
                let home = home.ok_or(ScratchError::HomeDirNotFound)?;
                let mut root = home.join(DATA_DIR_NAME);
                if development {
                    root.push(DEV_SUBDIR);
                }
                Self {
                    root,
                    portable: false,
                }
            }
            PortableMode::WorkingDir => {
                let cwd = cwd.ok_or_else(|| ScratchError::CurrentDirUnavailable {
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "working directory not available",
                    ),
                })?;
                Self {
                    root: cwd.join(PORTABLE_DIR_NAME),
                    portable: true,
                }
            }
            PortableMode::Path(path) => Self {
                root: path.clone(),
                portable: true,
            },
        };
        Ok(location)
    }

    /// Resolves against the real home and working directories.
    pub fn from_environment(mode: &PortableMode, development: bool) -> Result<Self> {
        let home = dirs::home_dir();
        let cwd = match mode {
            PortableMode::WorkingDir => Some(
                std::env::current_dir()
                    .map_err(|source| ScratchError::CurrentDirUnavailable { source })?,
            ),
            _ => None,
        };
        Self::resolve(mode, development, home.as_deref(), cwd.as_deref())
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            portable: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_portable(&self) -> bool {
        self.portable
    }

    /// Directory the host webview should use for its own profile, if it
    /// should be redirected at all.
    pub fn webview_profile_dir(&self) -> Option<&Path> {
        self.portable.then_some(self.root.as_path())
    }

    /// Path to content.txt (the document body).
    pub fn content_file(&self) -> PathBuf {
        self.root.join(CONTENT_FILE)
    }

    /// Path to the logs/ directory.
    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }
}
