//! Page loading state machine.
//!
//! Ensures only one page fetch is outstanding at a time. Used by CityCollection.

/// Loading state of the city collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    /// A request for the given page is in flight.
    Fetching(u32),
}

impl LoadState {
    /// True if a new page fetch can be started.
    pub fn can_start_fetch(self) -> bool {
        matches!(self, LoadState::Idle)
    }

    pub fn is_fetching(self) -> bool {
        matches!(self, LoadState::Fetching(_))
    }

    /// Page currently being fetched, if any.
    pub fn in_flight(self) -> Option<u32> {
        match self {
            LoadState::Fetching(page) => Some(page),
            LoadState::Idle => None,
        }
    }

    /// State after a fetch for `page` is issued.
    pub fn on_fetch_started(self, page: u32) -> Self {
        LoadState::Fetching(page)
    }

    /// State after the fetch completes, successfully or not.
    pub fn on_fetch_done(self) -> Self {
        LoadState::Idle
    }
}
