//! Library crate for user-dashboard.
//!
//! This crate exposes the building blocks of the TUI:
//! - Domain types (`model`) and field validation (`validate`)
//! - The record store and the search/filter/sort pipeline (`store`, `query`)
//! - Pagination (`pager`)
//! - The user API capability, an in-memory backend and a worker thread (`api`)
//! - Session state, config, keymap, mutations and the event loop (`app`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `user-dashboard` binary and by tests.
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod error;
pub mod model;
pub mod pager;
pub mod query;
pub mod store;
pub mod ui;
pub mod validate;

pub use error::{ApiError, ApiResult, ValidationErrors};
