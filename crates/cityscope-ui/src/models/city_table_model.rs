//! Table state for one mounted city list.
//!
//! Owns the [`CityCollection`], the infinite-scroll trigger and the cursor.
//! Pages are fetched by [`city_service`](crate::services::city_service) and
//! applied in [`poll_messages`](CityTableModel::poll_messages) on the UI
//! thread. Dropping the model tears it down: in-flight fetches are cancelled
//! and any result that still lands is discarded.

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use cityscope_cities::{
    City, CityCollection, CityError, CitySource, PageOutcome, PageRequest, SortKey, SortSpec,
    ViewportTrigger,
};
use cityscope_core::AppError;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::services::city_service::{self, CityServiceError, CityServiceMessage};

pub struct CityTableModel<S> {
    collection: CityCollection,
    trigger: ViewportTrigger,
    source: Arc<S>,
    runtime: Handle,
    tx: Sender<CityServiceMessage>,
    rx: Receiver<CityServiceMessage>,
    cancel: CancellationToken,
    mounted: bool,
    selected: usize,
    offset: usize,
    viewport_height: usize,
    error_message: Option<&'static str>,
}

impl<S: CitySource + 'static> CityTableModel<S> {
    pub fn new(source: Arc<S>, runtime: Handle, prefetch_margin: usize) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            collection: CityCollection::new(source.page_size()),
            trigger: ViewportTrigger::new(prefetch_margin),
            source,
            runtime,
            tx,
            rx,
            cancel: CancellationToken::new(),
            mounted: false,
            selected: 0,
            offset: 0,
            viewport_height: 0,
            error_message: None,
        }
    }

    /// Request the first page. Only the first call does anything.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.advance();
    }

    /// Ask for the next page directly, bypassing the viewport trigger.
    ///
    /// The collection's own gates still apply.
    pub fn retry(&mut self) {
        self.error_message = None;
        self.advance();
    }

    /// Apply any page results that have arrived. Returns true if state changed.
    pub fn poll_messages(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.rx.try_recv() {
            match message {
                CityServiceMessage::PageDone { request, result } => {
                    let Some(result) = result else {
                        continue;
                    };
                    self.apply_page(request, result);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Record the table height and run the viewport trigger against the
    /// rows now on screen. Call once per rendered frame.
    pub fn sync_viewport(&mut self, height: usize) {
        self.viewport_height = height;
        self.scroll_to_selection();

        let visible = self.visible_range();
        if let Some(request) = self.trigger.poll(&mut self.collection, visible) {
            self.spawn_fetch(request);
        }
    }

    fn advance(&mut self) {
        if let Some(request) = self.collection.advance_page() {
            self.spawn_fetch(request);
        }
    }

    fn spawn_fetch(&self, request: PageRequest) {
        city_service::request_page(
            &self.runtime,
            &self.tx,
            Arc::clone(&self.source),
            request,
            self.cancel.clone(),
        );
    }

    fn apply_page(
        &mut self,
        request: PageRequest,
        result: Result<Vec<City>, CityError>,
    ) {
        match self.collection.complete_page(request, result) {
            PageOutcome::Appended(_) => {
                self.error_message = None;
            }
            PageOutcome::Failed(e) => {
                let error = AppError::from(CityServiceError::from(e));
                tracing::warn!("City page {} failed: {}", request.page, error);
                self.error_message = Some(error.user_message());
            }
            PageOutcome::Discarded => {}
        }
        self.clamp_selection();
    }
}

impl<S> CityTableModel<S> {
    pub fn collection(&self) -> &CityCollection {
        &self.collection
    }

    pub fn is_loading(&self) -> bool {
        self.collection.is_loading()
    }

    /// Message for the last failed page, cleared by the next success.
    pub fn error_message(&self) -> Option<&'static str> {
        self.error_message
    }

    pub fn search_text(&self) -> &str {
        self.collection.search_text()
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.collection.sort_spec()
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.collection.set_search_text(text);
        self.selected = 0;
        self.offset = 0;
    }

    pub fn push_search_char(&mut self, c: char) {
        let mut text = self.collection.search_text().to_string();
        text.push(c);
        self.set_search_text(text);
    }

    pub fn pop_search_char(&mut self) {
        let mut text = self.collection.search_text().to_string();
        if text.pop().is_some() {
            self.set_search_text(text);
        }
    }

    /// Sort by the attribute in `column` (0-based). Unknown columns are ignored.
    pub fn sort_by_column(&mut self, column: usize) -> Option<SortSpec> {
        let key = SortKey::from_column(column)?;
        Some(self.sort_by(key))
    }

    pub fn sort_by(&mut self, key: SortKey) -> SortSpec {
        let spec = self.collection.set_sort(key);
        tracing::debug!("Sorted by {:?} {:?}", spec.key, spec.direction);
        spec
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.collection.view_row(self.selected)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// View positions currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let end = self
            .offset
            .saturating_add(self.viewport_height)
            .min(self.collection.view_len());
        self.offset.min(end)..end
    }

    /// `(position, city)` for each row on screen.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &City)> + '_ {
        self.visible_range()
            .filter_map(move |position| self.collection.view_row(position).map(|c| (position, c)))
    }

    pub fn select_next(&mut self) {
        self.move_down(1);
    }

    pub fn select_previous(&mut self) {
        self.move_up(1);
    }

    pub fn page_down(&mut self) {
        self.move_down(self.viewport_height.max(1));
    }

    pub fn page_up(&mut self) {
        self.move_up(self.viewport_height.max(1));
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_to_selection();
    }

    pub fn select_last(&mut self) {
        self.selected = self.collection.view_len().saturating_sub(1);
        self.scroll_to_selection();
    }

    fn move_down(&mut self, rows: usize) {
        let last = self.collection.view_len().saturating_sub(1);
        self.selected = self.selected.saturating_add(rows).min(last);
        self.scroll_to_selection();
    }

    fn move_up(&mut self, rows: usize) {
        self.selected = self.selected.saturating_sub(rows);
        self.scroll_to_selection();
    }

    fn clamp_selection(&mut self) {
        let last = self.collection.view_len().saturating_sub(1);
        self.selected = self.selected.min(last);
        self.scroll_to_selection();
    }

    fn scroll_to_selection(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.viewport_height > 0 && self.selected >= self.offset + self.viewport_height
        {
            self.offset = self.selected + 1 - self.viewport_height;
        }
    }

    /// Stop loading. Outstanding fetches are cancelled; late results are dropped.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.collection.teardown();
        self.trigger.detach();
    }
}

impl<S> Drop for CityTableModel<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Serves generated pages; optionally fails one page.
    #[derive(Default)]
    struct NumberedSource {
        requests: Mutex<Vec<u32>>,
        fail_page: Option<u32>,
    }

    impl NumberedSource {
        fn requests(&self) -> Vec<u32> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CitySource for NumberedSource {
        fn fetch_page(
            &self,
            request: PageRequest,
        ) -> impl Future<Output = Result<Vec<City>, CityError>> + Send {
            self.requests.lock().unwrap().push(request.page);
            let result = if self.fail_page == Some(request.page) {
                Err(CityError::Status {
                    status: 503,
                    message: "down".into(),
                })
            } else {
                Ok((0..u64::from(request.rows))
                    .map(|i| city(request.offset() + i))
                    .collect())
            };
            std::future::ready(result)
        }
    }

    struct HangingSource;

    impl CitySource for HangingSource {
        fn fetch_page(
            &self,
            _request: PageRequest,
        ) -> impl Future<Output = Result<Vec<City>, CityError>> + Send {
            std::future::pending()
        }
    }

    fn city(n: u64) -> City {
        City {
            name: format!("City {:03}", n),
            country: "Netherlands".to_string(),
            timezone: "Europe/Amsterdam".to_string(),
            population: n * 1000,
            latitude: 52.0,
            longitude: 5.0,
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    /// Poll until nothing is in flight.
    fn settle<S: CitySource + 'static>(model: &mut CityTableModel<S>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            model.poll_messages();
            if !model.is_loading() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("fetch did not settle");
    }

    #[test]
    fn test_mount_requests_first_page() {
        let rt = runtime();
        let source = Arc::new(NumberedSource::default());
        let mut model = CityTableModel::new(Arc::clone(&source), rt.handle().clone(), 0);

        model.mount();
        model.mount();
        settle(&mut model);

        assert_eq!(source.requests(), vec![0]);
        assert_eq!(model.collection().view_len(), 20);
        assert_eq!(model.selected_city().unwrap().name, "City 000");
    }

    #[test]
    fn test_scrolling_to_last_row_loads_next_page() {
        let rt = runtime();
        let source = Arc::new(NumberedSource::default());
        let mut model = CityTableModel::new(Arc::clone(&source), rt.handle().clone(), 0);
        model.mount();
        settle(&mut model);

        // Last row is below the fold
        model.sync_viewport(10);
        assert!(!model.is_loading());

        model.select_last();
        model.sync_viewport(10);
        assert_eq!(model.visible_range(), 10..20);
        assert!(model.is_loading());
        settle(&mut model);

        assert_eq!(source.requests(), vec![0, 1]);
        assert_eq!(model.collection().view_len(), 40);
        // Selection stays on the row the user was looking at
        assert_eq!(model.selected(), 19);
    }

    #[test]
    fn test_short_page_fills_viewport() {
        let rt = runtime();
        let source = Arc::new(NumberedSource::default());
        let mut model = CityTableModel::new(Arc::clone(&source), rt.handle().clone(), 0);
        model.mount();
        settle(&mut model);

        // 45 rows of space: each new last row is visible on arrival
        for _ in 0..3 {
            model.sync_viewport(45);
            settle(&mut model);
        }
        model.sync_viewport(45);

        assert_eq!(source.requests(), vec![0, 1, 2]);
        assert_eq!(model.collection().view_len(), 60);
        assert!(!model.is_loading());
    }

    #[test]
    fn test_failed_page_sets_error_and_keeps_rows() {
        let rt = runtime();
        let source = Arc::new(NumberedSource {
            fail_page: Some(1),
            ..Default::default()
        });
        let mut model = CityTableModel::new(Arc::clone(&source), rt.handle().clone(), 0);
        model.mount();
        settle(&mut model);

        model.select_last();
        model.sync_viewport(5);
        settle(&mut model);

        assert_eq!(model.collection().view_len(), 20);
        assert!(model.error_message().is_some());

        // Retry moves on to the next page and clears the message
        model.retry();
        settle(&mut model);
        assert_eq!(source.requests(), vec![0, 1, 2]);
        assert_eq!(model.collection().view_len(), 40);
        assert!(model.error_message().is_none());
    }

    #[test]
    fn test_search_suppresses_trigger() {
        let rt = runtime();
        let source = Arc::new(NumberedSource::default());
        let mut model = CityTableModel::new(Arc::clone(&source), rt.handle().clone(), 0);
        model.mount();
        settle(&mut model);

        model.push_search_char('0');
        model.push_search_char('1');
        assert_eq!(model.search_text(), "01");
        // "City 001", "City 010" .. "City 019"
        assert_eq!(model.collection().view_len(), 11);

        model.sync_viewport(20);
        assert!(!model.is_loading());
        assert_eq!(source.requests(), vec![0]);

        model.pop_search_char();
        model.pop_search_char();
        assert_eq!(model.search_text(), "");
        assert_eq!(model.collection().view_len(), 20);
    }

    #[test]
    fn test_sort_by_column_toggles() {
        let rt = runtime();
        let source = Arc::new(NumberedSource::default());
        let mut model = CityTableModel::new(source, rt.handle().clone(), 0);
        model.mount();
        settle(&mut model);

        model.sort_by_column(3).unwrap();
        let spec = model.sort_by_column(3).unwrap();
        assert_eq!(spec.direction, cityscope_cities::SortDirection::Descending);
        assert_eq!(model.selected_city().unwrap().name, "City 019");
        assert!(model.sort_by_column(9).is_none());
    }

    #[test]
    fn test_navigation_clamps() {
        let rt = runtime();
        let source = Arc::new(NumberedSource::default());
        let mut model = CityTableModel::new(source, rt.handle().clone(), 0);
        model.mount();
        settle(&mut model);
        model.sync_viewport(8);

        model.select_previous();
        assert_eq!(model.selected(), 0);
        model.page_down();
        assert_eq!(model.selected(), 8);
        assert_eq!(model.offset(), 1);
        model.page_down();
        model.page_down();
        assert_eq!(model.selected(), 19);
        model.select_first();
        assert_eq!(model.offset(), 0);
        model.select_next();
        assert_eq!(model.selected(), 1);
    }

    #[test]
    fn test_teardown_cancels_in_flight_fetch() {
        let rt = runtime();
        let mut model = CityTableModel::new(Arc::new(HangingSource), rt.handle().clone(), 0);
        model.mount();
        assert!(model.is_loading());

        model.teardown();
        assert!(model.collection().is_torn_down());

        // The cancelled task reports back without a result
        std::thread::sleep(Duration::from_millis(50));
        assert!(!model.poll_messages());
        assert_eq!(model.collection().view_len(), 0);
    }
}
