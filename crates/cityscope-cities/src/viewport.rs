//! Infinite-scroll trigger.
//!
//! Watches the last row of the current view. Each time that row enters the
//! visible range the trigger asks the collection to advance a page. After
//! every render the trigger is re-pointed at whatever row is now last; the
//! previous observation is dropped first, so there is never more than one.

use std::ops::Range;

use crate::collection::CityCollection;
use crate::source::PageRequest;

/// The row being watched: its display position and which record it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedRow {
    pub position: usize,
    pub record: usize,
}

#[derive(Debug)]
struct Observation {
    row: ObservedRow,
    visible: bool,
}

#[derive(Debug, Default)]
pub struct ViewportTrigger {
    observation: Option<Observation>,
    margin: usize,
}

impl ViewportTrigger {
    /// `margin` widens the visible range downward, so the last row counts as
    /// visible that many rows before it is actually on screen.
    pub fn new(margin: usize) -> Self {
        Self {
            observation: None,
            margin,
        }
    }

    /// Row currently observed, if any.
    pub fn observed(&self) -> Option<ObservedRow> {
        self.observation.as_ref().map(|o| o.row)
    }

    /// Point the trigger at `row`.
    ///
    /// Re-observing the same row keeps its visibility state. A different row
    /// (or `None`) releases the old observation.
    pub fn observe(&mut self, row: Option<ObservedRow>) {
        if self.observed() == row {
            return;
        }
        if let Some(old) = self.observation.take() {
            tracing::trace!("Released observation of row {}", old.row.position);
        }
        self.observation = row.map(|row| Observation {
            row,
            visible: false,
        });
    }

    /// Report the rows currently on screen.
    ///
    /// Returns true only when the observed row goes from hidden to visible.
    pub fn report_visible(&mut self, visible: Range<usize>) -> bool {
        let margin = self.margin;
        let Some(observation) = self.observation.as_mut() else {
            return false;
        };

        let end = visible.end.saturating_add(margin);
        let now_visible =
            visible.start < visible.end && (visible.start..end).contains(&observation.row.position);
        let entered = now_visible && !observation.visible;
        observation.visible = now_visible;
        entered
    }

    /// Re-attach to the collection's last row, then advance a page if it
    /// just came into view.
    ///
    /// The collection still applies its own gates (loading, active search).
    pub fn poll(
        &mut self,
        collection: &mut CityCollection,
        visible: Range<usize>,
    ) -> Option<PageRequest> {
        let last = collection.view_len().checked_sub(1).map(|position| ObservedRow {
            position,
            record: collection.view_indices()[position],
        });
        self.observe(last);

        if !self.report_visible(visible) {
            return None;
        }

        tracing::debug!("Last row entered viewport");
        collection.advance_page()
    }

    /// Drop the observation, e.g. when the view goes away.
    pub fn detach(&mut self) {
        self.observe(None);
    }
}
