//! Client-side orchestration over the MoodFlix API
//!
//! The recommendation session and the optimistic stores keep in-memory state
//! for a UI to render. Every outcome is reported through the `ClientContext`
//! notice sink rather than returned as an error.

pub mod analytics;
pub mod collections;
pub mod context;
pub mod follows;
pub mod notice;
pub mod optimistic;
pub mod profile;
pub mod remote;
pub mod reviews;
pub mod session;
pub mod storage;
pub mod watch_history;
pub mod watchlist;

pub use analytics::AnalyticsView;
pub use collections::CollectionStore;
pub use context::ClientContext;
pub use follows::FollowStore;
pub use notice::{ErrorKind, Notice, NoticeLevel, NoticeLog, NoticeSink, TracingSink};
pub use optimistic::{attempt, Outcome};
pub use profile::ProfileStore;
pub use remote::{
    AnalyticsApi, AuthApi, FollowApi, HttpRemote, RecommendationSource, ReviewApi, WatchlistApi,
};
pub use reviews::ReviewStore;
pub use session::{RecommendationSession, SessionStatus};
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use watch_history::WatchHistoryStore;
pub use watchlist::WatchlistStore;
