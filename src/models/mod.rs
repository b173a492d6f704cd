pub mod account;
pub mod analytics;
pub mod catalog;
pub mod guest;
pub mod movie;
pub mod tmdb;
pub mod user_data;

pub use account::{AuthSession, AuthenticatedUser, Credentials, User};
pub use analytics::{AdminAnalytics, DailyCount, MoodCount};
pub use catalog::{
    Actor, ActorPage, CastMember, MovieDetails, MoviePage, MovieSummary, PersonCredit,
    PersonDetails, TrendingCategory,
};
pub use guest::{Collection, CollectionMovie, GuestProfile, ProfileUpdate, WatchHistoryItem};
pub use movie::{DurationPreference, Movie, RecommendationRequest, RecommendationResponse};
pub use tmdb::{
    TmdbCredits, TmdbMovie, TmdbMovieDetails, TmdbPage, TmdbPerson, TmdbPersonCredits,
    TmdbPersonDetails, TmdbVideos,
};
pub use user_data::{
    Follow, NewReview, NewWatchlistItem, Review, ReviewUpdate, UserSummary, WatchlistItem,
};
