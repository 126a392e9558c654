//! # Entity Library
//!
//! Normalized client-side cache of the site API's records and the fetch
//! layer that fills it.
//!
//! ## Overview
//!
//! - [`schema`] declares which fields of each [`EntityType`] hold nested
//!   entities.
//! - [`normalize`] flattens nested server records; [`graph`] holds one table
//!   per type and rebuilds nesting on read.
//! - [`cache`] is the shared store: atomic writes, denormalized reads,
//!   placeholders on a miss and the hot-media list.
//! - [`fetcher`] talks to the API and reports failures as notifications.
//! - [`dispatcher`] turns cache misses into background fetches, one per
//!   `(type, id)` at a time.
//!
//! ## Example
//!
//! ```ignore
//! use core_library::{EntityCache, EntityFetcher, EntityType, QueuedFetchDispatcher, Schema};
//!
//! let cache = Arc::new(EntityCache::new(Arc::new(Schema::site())).with_events(events.clone()));
//! let fetcher = Arc::new(EntityFetcher::new(&config, cache.clone(), events));
//! let (dispatcher, queue) = QueuedFetchDispatcher::channel(fetcher.clone());
//! cache.set_dispatcher(Arc::new(dispatcher));
//! let worker = queue.spawn();
//!
//! // Placeholder now, the record once the background fetch lands.
//! let medium = cache.read_one(EntityType::Medium, "ukoqSStmSlSn1eGbah1aHw");
//! ```

pub mod cache;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod fetcher;
pub mod graph;
pub mod merge;
pub mod normalize;
pub mod pagination;
pub mod schema;

pub use cache::{EntityCache, HotMedium, Lookup};
pub use dispatcher::{
    FetchDispatcher, FetchQueue, FetchRequest, FetchWorker, QueuedFetchDispatcher,
};
pub use entity::EntityType;
pub use error::{LibraryError, Result};
pub use fetcher::{CsrfToken, EntityFetcher};
pub use graph::EntityGraph;
pub use pagination::{PageQuery, RestPage};
pub use schema::{Relation, Schema};
