//! Async driver that pairs a [`CityCollection`] with a [`CitySource`].
//!
//! One controller belongs to one view. Dropping it (or calling
//! [`CityListController::teardown`]) cancels its token; a fetch that is still
//! running is abandoned and its records never reach the collection.

use tokio_util::sync::CancellationToken;

use crate::collection::{CityCollection, PageOutcome};
use crate::source::{CitySource, PageRequest};
use crate::types::{City, CityError, SortKey, SortSpec};

/// What a call to [`CityListController::advance_page`] did.
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// Gated: loading, searching, or torn down. No request was made.
    Skipped,
    /// A request was made and its result applied (or discarded).
    Completed(PageOutcome),
}

/// Run one page fetch unless `cancel` fires first.
///
/// Returns `None` when cancelled; the caller must then drop the request.
pub async fn fetch_unless_cancelled<S: CitySource>(
    source: &S,
    request: PageRequest,
    cancel: &CancellationToken,
) -> Option<Result<Vec<City>, CityError>> {
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!("Page {} fetch cancelled", request.page);
            None
        }
        result = source.fetch_page(request) => Some(result),
    }
}

/// Returns the collection to idle if the fetch future is dropped before it
/// settles (a timeout or a lost `select!` around `advance_page`).
struct InFlight<'a> {
    collection: &'a mut CityCollection,
    request: PageRequest,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.collection.abandon_page(self.request);
        }
    }
}

pub struct CityListController<S> {
    collection: CityCollection,
    source: S,
    cancel: CancellationToken,
}

impl<S: CitySource> CityListController<S> {
    pub fn new(source: S) -> Self {
        let collection = CityCollection::new(source.page_size());
        Self {
            collection,
            source,
            cancel: CancellationToken::new(),
        }
    }

    pub fn collection(&self) -> &CityCollection {
        &self.collection
    }

    /// Token cancelled on teardown; clone it to tear down from another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.collection.set_search_text(text);
    }

    pub fn set_sort(&mut self, key: SortKey) -> SortSpec {
        self.collection.set_sort(key)
    }

    /// Fetch the next page and merge it.
    ///
    /// Dropping the returned future mid-fetch abandons that page and leaves
    /// the controller idle.
    pub async fn advance_page(&mut self) -> AdvanceOutcome {
        if self.cancel.is_cancelled() {
            self.collection.teardown();
        }

        let Some(request) = self.collection.advance_page() else {
            return AdvanceOutcome::Skipped;
        };

        let mut in_flight = InFlight {
            collection: &mut self.collection,
            request,
            settled: false,
        };
        let fetched = fetch_unless_cancelled(&self.source, request, &self.cancel).await;
        in_flight.settled = true;

        let Some(result) = fetched else {
            in_flight.collection.teardown();
            return AdvanceOutcome::Completed(PageOutcome::Discarded);
        };

        AdvanceOutcome::Completed(in_flight.collection.complete_page(request, result))
    }

    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.collection.teardown();
    }
}

impl<S> Drop for CityListController<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
