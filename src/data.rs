pub mod models;
pub mod types;

pub use models::{
    parse_timestamp, Comment, EventLabel, Issue, IssueDetail, Label, TimelineEvent, User,
    DEFAULT_LABEL_COLOR,
};
pub use types::{
    CacheMeta, FilterSpec, IssueState, KeyValueTable, QueryCacheTable, SortMode, StateFilter,
    Stats, CACHE_VERSION,
};

pub use crate::icons::SPINNER_FRAMES;
