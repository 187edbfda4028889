pub mod id;
pub mod listing;
pub mod match_record;

pub use id::{MatchId, SessionId};
pub use listing::{render_listing, MatchCard, WatchRoute};
pub use match_record::{MatchRecord, MatchStatus, NewMatch};
