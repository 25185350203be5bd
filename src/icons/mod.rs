//! Icons and glyph constants used throughout the UI.

// Spinner animation frames (braille characters)
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// Issue state icons
pub const ISSUE_OPEN: &str = "◉";
pub const ISSUE_CLOSED: &str = "✓";

// Issue state display strings (icon + text)
pub const ISSUE_OPEN_DISPLAY: &str = "◉ Open";
pub const ISSUE_CLOSED_DISPLAY: &str = "✓ Closed";

// Selection/Navigation indicators
pub const SELECTOR: &str = "▶ ";
pub const MARKED: &str = "[x] ";
pub const UNMARKED: &str = "[ ] ";

// Cursor
pub const CURSOR: &str = "█";

// Tutorial progress
pub const STEP_DONE: &str = "●";
pub const STEP_CURRENT: &str = "◆";
pub const STEP_TODO: &str = "○";

// Detail view
pub const COMMENT: &str = "💬";
pub const EVENT: &str = "•";

// List/UI elements
pub const BULLET: &str = "•";
pub const SEPARATOR_CHAR: &str = "─";
pub const SWATCH: &str = "●";
