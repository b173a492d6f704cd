//! Mood recommendation session
//!
//! Tracks the visible movies, the titles already shown in this mood session
//! and whether more pages exist. Load-more requests send the shown titles as
//! an exclusion list so the model does not repeat itself. Titles, not ids,
//! identify movies: ids are regenerated on every response.
//!
//! Methods take `&self`; the state lock is never held across a backend call,
//! so a second `load_more` while one is outstanding observes the busy flag
//! and returns without calling out.
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{context::ClientContext, notice::Notice, remote::RecommendationSource};
use crate::models::{Movie, RecommendationRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    LoadingMore,
    Exhausted,
}

#[derive(Debug)]
struct SessionState {
    movies: Vec<Movie>,
    shown_titles: Vec<String>,
    has_more: bool,
    last_request: Option<RecommendationRequest>,
    loading: bool,
    loading_more: bool,
    /// Bumped by fresh requests and resets; responses from an older
    /// generation are dropped
    generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            movies: Vec::new(),
            shown_titles: Vec::new(),
            has_more: true,
            last_request: None,
            loading: false,
            loading_more: false,
            generation: 0,
        }
    }
}

impl SessionState {
    fn remember(&mut self, movies: &[Movie]) {
        for movie in movies {
            if !self.shown_titles.contains(&movie.title) {
                self.shown_titles.push(movie.title.clone());
            }
        }
    }
}

pub struct RecommendationSession {
    source: Arc<dyn RecommendationSource>,
    ctx: ClientContext,
    state: Mutex<SessionState>,
}

impl RecommendationSession {
    pub fn new(source: Arc<dyn RecommendationSource>, ctx: ClientContext) -> Self {
        Self {
            source,
            ctx,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Requests a page for `request`
    ///
    /// A fresh request replaces the visible movies and restarts the shown
    /// titles; an append request excludes every title shown so far and adds
    /// to the list. Returns whether the call succeeded. A failed call leaves
    /// movies, shown titles and paging untouched.
    pub async fn get_recommendations(&self, request: RecommendationRequest, append: bool) -> bool {
        let (outgoing, generation) = {
            let mut state = self.state.lock().await;
            if append {
                state.loading_more = true;
                (request.excluding(state.shown_titles.clone()), state.generation)
            } else {
                state.generation += 1;
                state.loading = true;
                (request.excluding(Vec::new()), state.generation)
            }
        };

        self.fetch_page(request, outgoing, generation, append).await
    }

    /// Fetches the next page for the last request
    ///
    /// Returns whether a request was issued; nothing is sent while a
    /// load-more is in flight, after the end was reached or before any
    /// fresh request.
    pub async fn load_more(&self) -> bool {
        let (request, outgoing, generation) = {
            let mut state = self.state.lock().await;
            if state.loading_more || !state.has_more {
                return false;
            }
            let Some(request) = state.last_request.clone() else {
                return false;
            };
            // claimed under the same lock as the check
            state.loading_more = true;
            let outgoing = request.excluding(state.shown_titles.clone());
            (request, outgoing, state.generation)
        };

        self.fetch_page(request, outgoing, generation, true).await;
        true
    }

    /// Sends `outgoing` and applies the response; the busy flag for
    /// `append` must already be set
    async fn fetch_page(
        &self,
        request: RecommendationRequest,
        outgoing: RecommendationRequest,
        generation: u64,
        append: bool,
    ) -> bool {
        tracing::debug!(
            mood = %outgoing.mood,
            append,
            excluded = outgoing.previously_recommended.len(),
            "Requesting recommendations"
        );

        let result = self.source.recommend(&outgoing).await;

        let mut state = self.state.lock().await;
        if append {
            state.loading_more = false;
        } else if state.generation == generation {
            state.loading = false;
        }

        if state.generation != generation {
            tracing::debug!(append, "Dropping response from a superseded request");
            return false;
        }

        let movies = match result {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!(error = %e, append, "Recommendation request failed");
                drop(state);
                self.ctx
                    .notify(Notice::from_error("Couldn't get recommendations", &e));
                return false;
            }
        };

        if append {
            let movies: Vec<Movie> = movies
                .into_iter()
                .filter(|m| !state.shown_titles.contains(&m.title))
                .collect();

            if movies.is_empty() {
                state.has_more = false;
                drop(state);
                self.ctx.notify(Notice::info(
                    "You've reached the end",
                    "No more movies for this mood. Clear your history to see earlier picks again.",
                ));
                return true;
            }

            state.remember(&movies);
            state.movies.extend(movies);
            return true;
        }

        let count = movies.len();
        state.shown_titles.clear();
        state.remember(&movies);
        state.has_more = count > 0;
        state.movies = movies;
        state.last_request = Some(request);
        drop(state);

        if count > 0 {
            self.ctx.notify(Notice::success(
                "Recommendations ready",
                format!("Found {} movies for your mood.", count),
            ));
        }
        true
    }

    /// Forgets shown titles so they may come back; keeps the visible movies
    pub async fn clear_history(&self) {
        let mut state = self.state.lock().await;
        state.shown_titles.clear();
        state.has_more = true;
    }

    /// Back to a blank session, e.g. after the mood changed
    pub async fn reset_all(&self) {
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            loading_more: state.loading_more,
            ..SessionState::default()
        };
    }

    pub async fn movies(&self) -> Vec<Movie> {
        self.state.lock().await.movies.clone()
    }

    /// Titles shown in this session, in the order they arrived
    pub async fn shown_titles(&self) -> Vec<String> {
        self.state.lock().await.shown_titles.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.has_more
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn is_loading_more(&self) -> bool {
        self.state.lock().await.loading_more
    }

    pub async fn last_request(&self) -> Option<RecommendationRequest> {
        self.state.lock().await.last_request.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        if state.loading {
            SessionStatus::Loading
        } else if state.loading_more {
            SessionStatus::LoadingMore
        } else if state.last_request.is_none() {
            SessionStatus::Idle
        } else if !state.has_more {
            SessionStatus::Exhausted
        } else {
            SessionStatus::Ready
        }
    }
}
