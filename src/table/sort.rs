use crate::models::{SortDirection, SortState};

/// Sort state after a click on `field`.
///
/// Clicking the sorted column flips its direction; any other column starts
/// descending (newest or largest first).
pub fn toggle_sort(current: &SortState, field: &str) -> SortState {
    if current.is_sorted() && current.field == field {
        SortState::new(field, current.direction.toggled())
    } else {
        SortState::new(field, SortDirection::Desc)
    }
}
