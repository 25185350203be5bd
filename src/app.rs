pub mod message;
pub mod model;
pub mod update;

pub use message::{Command, FetchRequest, FetchResult, Message};
pub use model::{App, InputMode};
pub use update::{initial_fetch, update};
