//! Detection domain.
//!
//! Pure logic that turns a process snapshot plus the configured tables into a
//! detected game and a channel title. Nothing here performs I/O.

pub mod diagnostics;
pub mod exclusion;
pub mod mapping;
pub mod matcher;
pub mod title;

pub use diagnostics::{DiagnosticEntry, DiagnosticReport, diagnose};
pub use exclusion::ExclusionFilter;
pub use mapping::{CategoryMapping, GameMapping, OrderedMap};
pub use matcher::{GameMatch, detect_game, detect_match};
pub use title::{DEFAULT_TITLE_TEMPLATE, format_title};

/// Label used when no configured game is running, and the category used when
/// a requested category does not exist on the platform.
pub const JUST_CHATTING: &str = "Just Chatting";
