pub mod path;
pub mod pattern;
pub mod table;

pub use path::{DEFAULT_VIEW, normalize_path};
pub use pattern::{MatchKind, PathPattern, PatternError, Token};
pub use table::{BlockList, ContentKind, RuleTable, TypeMapping, TypeTable};
