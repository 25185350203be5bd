pub mod detail;
pub mod markdown;
pub mod popups;
pub mod search;
pub mod table;
pub mod tabs;
pub mod tutorial;

pub use detail::render_detail_view;
pub use markdown::markdown_to_lines;
pub use popups::{
    centered_rect, render_error_popup, render_help_popup, render_labels_popup, render_url_popup,
};
pub use search::{filter_bar_visible, render_filter_bar};
pub use table::{label_spans, render_table};
pub use tabs::render_tabs;
pub use tutorial::render_tutorial_overlay;
