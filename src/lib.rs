//! Request and list controllers for remote, server-paginated collections.
//!
//! Leaves first: [`http`] issues single calls with cancellation and a
//! stale-completion guard, [`table`] keeps page/sort/filter state for a remote
//! collection on top of it. [`loader`] and [`flash`] are the shared services
//! both report through.

pub mod config;
pub mod error;
pub mod flash;
pub mod http;
pub mod loader;
pub mod models;
pub mod render;
pub mod table;

pub use error::RequestError;
