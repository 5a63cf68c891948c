//! Incrementally loaded, searchable, sortable city list.
//!
//! [`CityCollection`] is the state machine the UI binds to. It is fed by a
//! [`CitySource`] (normally [`OpenDataSoftSource`]) and advanced by a
//! [`ViewportTrigger`] as the user scrolls.

pub mod collection;
pub mod controller;
pub mod load_state;
pub mod query;
pub mod source;
pub mod types;
pub mod viewport;

pub use collection::{AdvanceBlocked, CityCollection, PageOutcome};
pub use controller::{fetch_unless_cancelled, AdvanceOutcome, CityListController};
pub use load_state::LoadState;
pub use source::{CitySource, OpenDataSoftSource, PageRequest, DEFAULT_PAGE_SIZE};
pub use types::*;
pub use viewport::{ObservedRow, ViewportTrigger};
