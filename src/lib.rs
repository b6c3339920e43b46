//! Reading progress tracking for a novel site: per-novel chapter progress,
//! per-chapter scroll positions, reader preferences and the catalog they are
//! joined against.

pub mod catalog;
pub mod db;
pub mod debounce;
pub mod prefs;
pub mod progress;
pub mod reader;
pub mod store;
