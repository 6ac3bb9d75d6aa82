pub mod cache;
pub mod fake_source;
pub mod feed;
pub mod github;
pub mod groups;
pub mod pipeline;
pub mod region;
pub mod source;

pub use cache::{cache_key, CacheManager, FileStore, MemoryStore, SessionStore};
pub use github::HttpSource;
pub use groups::{DynamicGroups, GroupResolver, StaticGroups};
pub use pipeline::Aggregator;
pub use source::ActivitySource;
