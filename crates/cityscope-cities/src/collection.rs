//! The incremental city collection.
//!
//! Owns the append-only set of fetched cities, the page cursor, the search
//! text and the sort spec. The displayed view is rebuilt from those three on
//! every change; nothing patches it incrementally.
//!
//! The collection itself never does I/O. [`CityCollection::advance_page`]
//! hands out a [`PageRequest`] and moves to `Fetching`; whoever performs the
//! request feeds the result back through [`CityCollection::complete_page`].

use crate::load_state::LoadState;
use crate::query;
use crate::source::{PageRequest, DEFAULT_PAGE_SIZE};
use crate::types::{City, CityError, SortKey, SortSpec};

/// Why an advance request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceBlocked {
    /// A page fetch is already outstanding
    Loading,
    /// Infinite scroll is off while a search is active
    SearchActive,
    /// The owning view is gone
    TornDown,
}

/// Result of feeding a page response back into the collection.
#[derive(Debug)]
pub enum PageOutcome {
    /// Records were appended; carries how many.
    Appended(usize),
    /// The fetch failed; nothing changed.
    Failed(CityError),
    /// The response arrived after teardown or does not match the in-flight page.
    Discarded,
}

#[derive(Debug)]
pub struct CityCollection {
    full_set: Vec<City>,
    view: Vec<usize>,
    page: u32,
    page_size: u32,
    search_text: String,
    sort: Option<SortSpec>,
    load_state: LoadState,
    torn_down: bool,
}

impl Default for CityCollection {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl CityCollection {
    pub fn new(page_size: u32) -> Self {
        Self {
            full_set: Vec::new(),
            view: Vec::new(),
            page: 0,
            page_size: page_size.max(1),
            search_text: String::new(),
            sort: None,
            load_state: LoadState::Idle,
            torn_down: false,
        }
    }

    /// Every city fetched so far, in fetch order.
    pub fn full_set(&self) -> &[City] {
        &self.full_set
    }

    /// Next page the cursor will request.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state.is_fetching()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Rows of the view as indices into [`full_set`](Self::full_set).
    pub fn view_indices(&self) -> &[usize] {
        &self.view
    }

    /// Cities in display order.
    pub fn view(&self) -> impl ExactSizeIterator<Item = &City> + '_ {
        self.view.iter().map(|&i| &self.full_set[i])
    }

    pub fn view_len(&self) -> usize {
        self.view.len()
    }

    /// City at display row `row`.
    pub fn view_row(&self, row: usize) -> Option<&City> {
        self.view.get(row).map(|&i| &self.full_set[i])
    }

    /// Why [`advance_page`](Self::advance_page) would currently do nothing, if it would.
    pub fn advance_blocker(&self) -> Option<AdvanceBlocked> {
        if self.torn_down {
            Some(AdvanceBlocked::TornDown)
        } else if !self.load_state.can_start_fetch() {
            Some(AdvanceBlocked::Loading)
        } else if !self.search_text.is_empty() {
            Some(AdvanceBlocked::SearchActive)
        } else {
            None
        }
    }

    pub fn can_advance(&self) -> bool {
        self.advance_blocker().is_none()
    }

    /// Start fetching the page under the cursor and move the cursor forward.
    ///
    /// Returns `None` (and changes nothing) while a fetch is outstanding,
    /// while the search text is non-empty, or after teardown.
    pub fn advance_page(&mut self) -> Option<PageRequest> {
        if let Some(blocked) = self.advance_blocker() {
            tracing::debug!("Ignoring page advance: {:?}", blocked);
            return None;
        }

        let request = PageRequest::new(self.page, self.page_size);
        self.page += 1;
        self.load_state = self.load_state.on_fetch_started(request.page);
        tracing::debug!(
            "Fetching page {} (offset {})",
            request.page,
            request.offset()
        );
        Some(request)
    }

    /// Apply the result of the fetch started by `advance_page`.
    ///
    /// On success the records are appended in the order received and the view
    /// is rebuilt. On failure the set and view are left untouched. Either way
    /// the collection returns to idle.
    pub fn complete_page(
        &mut self,
        request: PageRequest,
        result: Result<Vec<City>, CityError>,
    ) -> PageOutcome {
        if self.torn_down {
            tracing::debug!("Discarding page {} after teardown", request.page);
            return PageOutcome::Discarded;
        }
        if self.load_state.in_flight() != Some(request.page) {
            tracing::warn!(
                "Discarding page {}: in-flight state is {:?}",
                request.page,
                self.load_state
            );
            return PageOutcome::Discarded;
        }

        self.load_state = self.load_state.on_fetch_done();

        match result {
            Ok(cities) => {
                let count = cities.len();
                self.full_set.extend(cities);
                self.rederive();
                tracing::info!(
                    "Appended {} cities from page {} ({} total)",
                    count,
                    request.page,
                    self.full_set.len()
                );
                PageOutcome::Appended(count)
            }
            Err(e) => {
                tracing::error!("Error fetching cities for page {}: {}", request.page, e);
                PageOutcome::Failed(e)
            }
        }
    }

    /// Give up on `request` without a result, e.g. when the fetch was dropped
    /// before it settled. Returns to idle; the set, view and cursor stay as
    /// they are, so the next advance asks for the following page.
    pub fn abandon_page(&mut self, request: PageRequest) {
        if self.load_state.in_flight() != Some(request.page) {
            return;
        }
        tracing::warn!("Abandoned fetch of page {}", request.page);
        self.load_state = self.load_state.on_fetch_done();
    }

    /// Replace the search text and rebuild the view.
    ///
    /// The text is stored as given; matching lowercases both sides.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.rederive();
    }

    /// Sort by `key`, toggling direction when it is already the ascending key.
    pub fn set_sort(&mut self, key: SortKey) -> SortSpec {
        let spec = SortSpec::toggle(self.sort, key);
        self.sort = Some(spec);
        self.rederive();
        spec
    }

    /// Stop accepting page results. Pending fetches become no-ops when they land.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            tracing::debug!("City collection torn down with {} cities", self.full_set.len());
        }
        self.torn_down = true;
    }

    fn rederive(&mut self) {
        self.view = query::derive_view(&self.full_set, &self.search_text, self.sort);
    }
}
