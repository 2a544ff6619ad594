//! Paginator math: page-shortcut window and visible item range

use crate::models::Pagination;

/// Number of page shortcuts shown at once
pub const WINDOW_SIZE: u32 = 4;

/// Pages offered as direct links.
///
/// Up to four pages are listed as-is; otherwise the window starts at the
/// current page, sliding back so it never runs past the last page.
pub fn page_window(current_page: u32, total_pages: u32) -> Vec<u32> {
    if total_pages <= WINDOW_SIZE {
        return (1..=total_pages).collect();
    }

    let start = if total_pages.saturating_sub(current_page) >= WINDOW_SIZE - 1 {
        current_page.max(1)
    } else {
        total_pages - (WINDOW_SIZE - 1)
    };

    (start..=start.saturating_add(WINDOW_SIZE - 1)).collect()
}

/// 1-based index of the first item on the current page, 0 when the list is empty
pub fn starting_item(current_page: u32, per_page: u32, total_items: u64) -> u64 {
    if total_items == 0 {
        return 0;
    }
    (u64::from(current_page) * u64::from(per_page)).saturating_sub(u64::from(per_page)) + 1
}

pub fn ending_item(current_page: u32, per_page: u32, total_items: u64) -> u64 {
    (u64::from(current_page) * u64::from(per_page)).min(total_items)
}

/// "Showing X-Y of Z" summary for a pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ItemRange {
    pub fn of(pagination: &Pagination) -> Self {
        Self {
            start: starting_item(pagination.page, pagination.per_page, pagination.total_items),
            end: ending_item(pagination.page, pagination.per_page, pagination.total_items),
            total: pagination.total_items,
        }
    }
}

impl std::fmt::Display for ItemRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Showing {}-{} of {}", self.start, self.end, self.total)
    }
}
