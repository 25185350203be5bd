pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod icons;
pub mod logging;
pub mod services;
pub mod tutorial;
pub mod utils;
pub mod view;

pub use app::{initial_fetch, update, App, Command, FetchRequest, FetchResult, Message};
pub use config::{Config, Overrides};
pub use data::{FilterSpec, Issue, Label, SortMode, StateFilter, Stats};
pub use services::cache::get_cache_path;
pub use tutorial::{Launch, Tutorial, TutorialAction, TutorialState, TutorialStore};
pub use view::ui;
