use std::fmt;

use thiserror::Error;

use super::model::{DetailTab, SeasonId, SourceLinkId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum HostError {
    #[error("tab {0} does not exist")]
    UnknownTab(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TabTarget {
    Season(SeasonId),
    Detail(DetailTab),
}

impl fmt::Display for TabTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Season(season) => write!(f, "season:{season}"),
            Self::Detail(tab) => write!(f, "detail:{tab}"),
        }
    }
}

/// Tab framework of the host. `activate_tab` only requests the switch; the
/// host reports completion later with a `SessionEvent::TabShown`.
pub(crate) trait TabActivator {
    fn activate_tab(&mut self, tab: &TabTarget) -> Result<(), HostError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayerEmbed {
    pub(crate) link: SourceLinkId,
    pub(crate) url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Placeholder {
    /// Nothing chosen yet.
    Prompt(String),
    /// The chosen context has nothing to play.
    Empty(String),
    Error(String),
}

impl Placeholder {
    pub(crate) fn message(&self) -> &str {
        match self {
            Self::Prompt(message) | Self::Empty(message) | Self::Error(message) => message,
        }
    }
}

pub(crate) trait PlayerSurface {
    fn mount_player(&mut self, embed: &PlayerEmbed) -> Result<(), HostError>;
    fn show_placeholder(&mut self, placeholder: Placeholder);
}

/// Everything the session controller drives on the host side.
pub(crate) trait SessionHost: TabActivator + PlayerSurface {}

impl<T: TabActivator + PlayerSurface> SessionHost for T {}
