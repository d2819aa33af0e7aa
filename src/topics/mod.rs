//! Topics module - Bookmarked line ranges and their persistence
//!
//! Provides:
//! - topic: the Topic record and persisted schema
//! - store: bounded ordered collection with atomic saves and observers
//! - settings: persisted user settings
//! - actions: register/unregister/toggle/list/jump/reorder/clear
//! - api: command entry points

pub mod actions;
pub mod api;
pub mod settings;
pub mod store;
pub mod topic;
