pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod llm;
pub mod providers;
pub mod recommendations;
pub mod user_data;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use catalog::CatalogService;
pub use llm::{ChatCompletionsClient, LlmClient};
pub use providers::{MovieProvider, TmdbProvider};
pub use recommendations::RecommendationService;
pub use user_data::{UserDataAction, UserDataRequest, UserDataResponse, UserDataService};
