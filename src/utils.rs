pub mod format;
pub mod repo;

pub use format::{contrast_color, format_relative_time, hex_to_color, sanitize, truncate_string};
pub use repo::{new_issue_url, open_url, parse_repo_spec};
