//! # W3C Community Activity Library
//!
//! `w3c_activity` collects community activity for a set of W3C working groups
//! from the GitHub REST API and the W3C mailing-list archive, and condenses it
//! into a display-ready view model.
//!
//! ## Features
//!
//! - Static or dynamic (most active repositories) group resolution
//! - Concurrent per-group fetching with per-request timeouts
//! - Contributor merging and regional diversity breakdown
//! - Atom feed parsing and monthly archive message counts
//! - Session-scoped caching of the view model under a versioned key
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use w3c_activity::analysis::{Aggregator, CacheManager, HttpSource, MemoryStore, StaticGroups};
//! use w3c_activity::app::{App, PageState};
//! use w3c_activity::config::Config;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let source = Arc::new(HttpSource::new(&config)?);
//! let app = App::new(
//!     Box::new(StaticGroups),
//!     Aggregator::new(source, config),
//!     CacheManager::new(MemoryStore::new()),
//! );
//!
//! if let PageState::Ready { view, .. } = app.load().await {
//!     println!("{} groups", view.activity.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use error::{ActivityError, CacheError};
pub use types::{CacheKey, ViewModel};
