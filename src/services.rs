pub mod cache;
pub mod github;
pub mod query;
pub mod search;
pub mod storage;

pub use cache::{get_cache_path, CachedEntry, QueryCache, SqliteStore};
pub use github::{parse_issues, with_retries, GitHubClient, RetryPolicy};
pub use query::{compute_stats, filter_issues, run_query, QueryResult};
pub use search::filter_labels;
pub use storage::{KeyValueStore, MemoryStore};
