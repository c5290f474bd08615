pub mod classify;
pub mod matching;
pub mod name_match;

pub use classify::{classify, Classification};
pub use matching::{
    is_manual, match_responses, AmbiguousName, MatchKind, MatchOutcome, MatchResult,
    ProjectedContact, RosterIndex,
};
pub use name_match::{find_by_name, NameMatch};
