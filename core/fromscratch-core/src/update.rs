//! Passive update check.
//!
//! One GET against the update host at startup. If the advertised version is
//! newer than the running one, the UI is told once via `show-update-msg`. Any
//! failure is logged and otherwise ignored: the check is best-effort and must
//! never hold up or crash startup. There is no retry and no polling.
//!
//! No timeout is set beyond what the HTTP client applies by default.

use std::io::Read;
use std::thread::{self, JoinHandle};

use fromscratch_protocol::{UiCommand, VersionDescriptor};
use tracing::{debug, info, warn};

use crate::channel::{CoordinatorInput, EventSender, InboxSender};
use crate::error::{Result, ScratchError};
use crate::version;

/// Transport for the version descriptor.
pub trait VersionFetcher: Send + 'static {
    /// Returns the full response body of a GET to `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches over HTTPS with a blocking `reqwest` client.
///
/// The client is built on the calling thread, which is the update-check
/// thread, never the UI thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl VersionFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let transport = |details: String| ScratchError::UpdateTransport {
            url: url.to_string(),
            details,
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("fromscratch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| transport(e.to_string()))?;

        let mut response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport(e.to_string()))?;

        let mut body = Vec::new();
        response
            .read_to_end(&mut body)
            .map_err(|e| transport(e.to_string()))?;
        Ok(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Available { latest: String },
    UpToDate { latest: String },
}

pub struct UpdateChecker<F> {
    fetcher: F,
    url: String,
    current: String,
}

impl<F: VersionFetcher> UpdateChecker<F> {
    pub fn new(fetcher: F, url: String, current: String) -> Self {
        Self {
            fetcher,
            url,
            current,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches and compares, without telling anyone.
    pub fn check(&self) -> Result<UpdateStatus> {
        let body = self.fetcher.fetch(&self.url)?;
        let descriptor = VersionDescriptor::parse(&body)
            .map_err(|source| ScratchError::UpdateMalformed { source })?;
        let latest = descriptor.version;

        if version::is_newer(&latest, &self.current) {
            Ok(UpdateStatus::Available { latest })
        } else {
            Ok(UpdateStatus::UpToDate { latest })
        }
    }

    /// Runs the check and notifies the UI when a newer version exists.
    ///
    /// Returns the newer version, if any. Errors are logged, never returned.
    pub fn check_and_notify(&self, events: &EventSender) -> Option<String> {
        match self.check() {
            Ok(UpdateStatus::Available { latest }) => {
                info!(current = %self.current, latest = %latest, "Newer version available");
                events.execute(UiCommand::ShowUpdateMsg);
                Some(latest)
            }
            Ok(UpdateStatus::UpToDate { latest }) => {
                debug!(current = %self.current, latest = %latest, "Up to date");
                None
            }
            Err(err) => {
                warn!(error = %err, "Update check failed");
                None
            }
        }
    }

    /// Runs the check on its own thread and reports a newer version back to
    /// the coordinator.
    pub fn spawn(self, events: EventSender, inbox: InboxSender) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("update-check".to_string())
            .spawn(move || {
                if let Some(latest) = self.check_and_notify(&events) {
                    // The coordinator may already be gone at shutdown.
                    let _ = inbox.send(CoordinatorInput::UpdateAvailable(latest));
                }
            })
            .map_err(|err| ScratchError::io("spawning update check", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ui_events;
    use fromscratch_protocol::CoreEvent;
    use std::sync::{Arc, Mutex};

    struct StaticFetcher {
        body: Result<&'static str>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StaticFetcher {
        fn ok(body: &'static str) -> Self {
            Self {
                body: Ok(body),
                calls: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                body: Err(ScratchError::UpdateTransport {
                    url: "https://example.invalid".to_string(),
                    details: "connection refused".to_string(),
                }),
                calls: Arc::default(),
            }
        }
    }

    impl VersionFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(url.to_string());
            match &self.body {
                Ok(body) => Ok(body.as_bytes().to_vec()),
                Err(err) => Err(ScratchError::UpdateTransport {
                    url: url.to_string(),
                    details: err.to_string(),
                }),
            }
        }
    }

    fn checker(fetcher: StaticFetcher, current: &str) -> UpdateChecker<StaticFetcher> {
        UpdateChecker::new(
            fetcher,
            "https://fromscratch.rocks/latest.json?current=1.3.0".to_string(),
            current.to_string(),
        )
    }

    #[test]
    fn newer_remote_emits_exactly_one_event() {
        let (events, rx) = ui_events();
        let latest = checker(StaticFetcher::ok(r#"{"version":"1.4.0"}"#), "1.3.0")
            .check_and_notify(&events);
        assert_eq!(latest.as_deref(), Some("1.4.0"));
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![CoreEvent::ExecuteShortcut(UiCommand::ShowUpdateMsg)]
        );
    }

    #[test]
    fn equal_or_older_remote_emits_nothing() {
        for body in [r#"{"version":"1.3.0"}"#, r#"{"version":"1.2.9"}"#] {
            let (events, rx) = ui_events();
            let latest = checker(StaticFetcher::ok(body), "1.3.0").check_and_notify(&events);
            assert_eq!(latest, None);
            assert_eq!(rx.try_iter().count(), 0);
        }
    }

    #[test]
    fn network_error_emits_nothing() {
        let (events, rx) = ui_events();
        let latest = checker(StaticFetcher::failing(), "1.3.0").check_and_notify(&events);
        assert_eq!(latest, None);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn malformed_body_is_reported_by_check() {
        let err = checker(StaticFetcher::ok("<!doctype html>"), "1.3.0")
            .check()
            .unwrap_err();
        assert!(matches!(err, ScratchError::UpdateMalformed { .. }));
    }

    #[test]
    fn fetches_configured_url_once() {
        let fetcher = StaticFetcher::ok(r#"{"version":"9.0.0"}"#);
        let calls = Arc::clone(&fetcher.calls);
        let (events, _rx) = ui_events();
        checker(fetcher, "1.3.0").check_and_notify(&events);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["https://fromscratch.rocks/latest.json?current=1.3.0".to_string()]
        );
    }

    #[test]
    fn spawned_check_reports_back_to_inbox() {
        let (events, ui_rx) = ui_events();
        let (inbox, inbox_rx) = crate::channel::inbox();
        let handle = checker(StaticFetcher::ok(r#"{"version":"2.0.0"}"#), "1.3.0")
            .spawn(events, inbox)
            .unwrap();
        handle.join().unwrap();

        assert_eq!(ui_rx.try_iter().count(), 1);
        match inbox_rx.try_recv().unwrap() {
            CoordinatorInput::UpdateAvailable(latest) => assert_eq!(latest, "2.0.0"),
            other => panic!("unexpected input: {other:?}"),
        }
    }
}
