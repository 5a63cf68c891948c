//! Filter and sort derivation over the fetched city set.
//!
//! The displayed view is always rebuilt from scratch as
//! `sort(filter(full_set, search_text), sort_spec)`. Views are expressed as
//! row indices into the full set so rebuilding never clones city records.

use crate::types::{City, SortSpec};

/// True if `city` matches the search text.
///
/// Matching is a case-insensitive substring test on the city name; an empty
/// query matches everything.
pub fn matches_search(city: &City, query: &str) -> bool {
    query.is_empty() || city.name.to_lowercase().contains(&query.to_lowercase())
}

/// Indices of the cities whose name contains `query`, in fetch order.
pub fn apply_filter(full_set: &[City], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..full_set.len()).collect();
    }

    let needle = query.to_lowercase();
    full_set
        .iter()
        .enumerate()
        .filter(|(_, city)| city.name.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}

/// Reorder `indices` by `spec`. Stable: equal keys keep their relative order.
///
/// With no spec the indices are left as they are.
pub fn apply_sort(full_set: &[City], indices: &mut [usize], spec: Option<SortSpec>) {
    if let Some(spec) = spec {
        indices.sort_by(|&a, &b| spec.compare(&full_set[a], &full_set[b]));
    }
}

/// Build the view for the given state.
pub fn derive_view(full_set: &[City], query: &str, spec: Option<SortSpec>) -> Vec<usize> {
    let mut indices = apply_filter(full_set, query);
    apply_sort(full_set, &mut indices, spec);
    indices
}
