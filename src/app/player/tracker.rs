use std::cell::RefCell;
use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::app::model::SourceLinkId;
use crate::http::{PostPolicy, post_form};

/// Host-supplied settings for the watch-history endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TrackingConfig {
    pub(crate) endpoint: Option<String>,
    pub(crate) csrf_token: Option<String>,
    pub(crate) authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    Anonymous,
    NoEndpoint,
    NoToken,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Anonymous => "viewer is not signed in",
            Self::NoEndpoint => "no tracking endpoint configured",
            Self::NoToken => "no anti-forgery token available",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WatchEvent {
    pub(crate) endpoint: String,
    pub(crate) csrf_token: String,
    pub(crate) link: SourceLinkId,
}

impl TrackingConfig {
    pub(crate) fn event_for(&self, link: &SourceLinkId) -> Result<WatchEvent, SkipReason> {
        if !self.authenticated {
            return Err(SkipReason::Anonymous);
        }
        let endpoint = non_blank(self.endpoint.as_deref()).ok_or(SkipReason::NoEndpoint)?;
        let csrf_token = non_blank(self.csrf_token.as_deref()).ok_or(SkipReason::NoToken)?;
        Ok(WatchEvent {
            endpoint: endpoint.to_string(),
            csrf_token: csrf_token.to_string(),
            link: link.clone(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Receiver of watch-history notifications. `record` must return immediately;
/// delivery problems are the tracker's to log.
pub(crate) trait WatchTracker {
    fn record(&self, event: WatchEvent);

    /// Waits for in-flight deliveries. Only short-lived commands need this.
    fn drain(&self) {}
}

/// Posts `link_id` to the endpoint from a detached worker thread.
pub(crate) struct HttpWatchTracker {
    policy: PostPolicy,
    in_flight: RefCell<Vec<JoinHandle<()>>>,
}

impl HttpWatchTracker {
    pub(crate) fn new() -> Self {
        Self {
            policy: PostPolicy {
                connect_timeout: Duration::from_secs(3),
                read_timeout: Duration::from_secs(5),
                attempts: 2,
                retry_delay: Duration::from_millis(500),
            },
            in_flight: RefCell::new(Vec::new()),
        }
    }
}

impl WatchTracker for HttpWatchTracker {
    fn record(&self, event: WatchEvent) {
        let policy = self.policy;

        let spawned = thread::Builder::new()
            .name("watch-history".to_string())
            .spawn(move || {
                let headers = vec![
                    ("X-CSRFToken".to_string(), event.csrf_token.clone()),
                    ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
                ];
                let form = vec![("link_id".to_string(), event.link.to_string())];
                match post_form(&event.endpoint, &headers, &form, policy) {
                    Ok(_) => debug!(link = %event.link, "watch history recorded"),
                    Err(err) => warn!(link = %event.link, "watch history update failed: {err}"),
                }
            });

        match spawned {
            Ok(handle) => {
                let mut in_flight = self.in_flight.borrow_mut();
                in_flight.retain(|handle| !handle.is_finished());
                in_flight.push(handle);
            }
            Err(err) => warn!("failed to start watch history worker: {err}"),
        }
    }

    fn drain(&self) {
        for handle in self.in_flight.borrow_mut().drain(..) {
            if handle.join().is_err() {
                warn!("watch history worker panicked");
            }
        }
    }
}
