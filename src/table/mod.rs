//! Remote list/table controller and its pagination, sort, action and selection helpers

pub mod actions;
pub mod controller;
pub mod paginator;
pub mod selection;
pub mod sort;

pub use actions::{Predicate, ResolvedAction, RowAction};
pub use controller::{FetchOutcome, ListConfig, ListController, ListPhase, ListView};
pub use paginator::{ending_item, page_window, starting_item, ItemRange};
pub use selection::Selection;
pub use sort::toggle_sort;
