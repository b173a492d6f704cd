use std::sync::Arc;

use chrono::Utc;

use super::{
    context::ClientContext,
    notice::Notice,
    optimistic::{attempt, restore, temporary_id, Outcome},
    remote::WatchlistApi,
};
use crate::{
    error::AppResult,
    models::{NewWatchlistItem, WatchlistItem},
};

/// Signed-in user's watchlist, newest first
pub struct WatchlistStore {
    ctx: ClientContext,
    remote: Arc<dyn WatchlistApi>,
    items: Vec<WatchlistItem>,
}

impl WatchlistStore {
    pub fn new(ctx: ClientContext, remote: Arc<dyn WatchlistApi>) -> Self {
        Self {
            ctx,
            remote,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    pub fn contains(&self, movie_id: i64) -> bool {
        self.items.iter().any(|i| i.movie_id == movie_id)
    }

    /// Reloads from the server; signed-out users have an empty list
    pub async fn fetch(&mut self) -> Outcome {
        match self.reload().await {
            Ok(()) => Outcome::Done,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load watchlist");
                self.ctx
                    .notify(Notice::from_error("Couldn't load your watchlist", &e));
                Outcome::Failed
            }
        }
    }

    async fn reload(&mut self) -> AppResult<()> {
        self.items = match self.ctx.session().await {
            Some(session) => self.remote.watchlist(&session.token).await?,
            None => Vec::new(),
        };
        Ok(())
    }

    pub async fn add(&mut self, movie: NewWatchlistItem) -> Outcome {
        let Some(session) = self.ctx.require_session("save movies to your watchlist").await
        else {
            return Outcome::SignedOut;
        };

        if self.contains(movie.movie_id) {
            self.ctx.notify(Notice::info(
                "Already in watchlist",
                format!("{} is already in your watchlist.", movie.title),
            ));
            return Outcome::Duplicate;
        }

        let placeholder = WatchlistItem {
            id: temporary_id(),
            user_id: session.user_id,
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            poster_url: movie.poster_url.clone(),
            rating: movie.rating,
            year: movie.year,
            added_at: Utc::now(),
        };
        let title = movie.title.clone();
        let remote = &self.remote;

        let result = attempt(
            &mut self.items,
            |items| {
                let snapshot = items.clone();
                items.insert(0, placeholder);
                snapshot
            },
            |_| remote.add_to_watchlist(&session.token, movie),
            restore,
        )
        .await;

        match result {
            Ok(_) => {
                self.ctx.notify(Notice::success(
                    "Added to watchlist",
                    format!("{} was added to your watchlist.", title),
                ));
                // the placeholder stays until the server list replaces it
                if let Err(e) = self.reload().await {
                    tracing::warn!(error = %e, "Watchlist refresh after add failed");
                }
                Outcome::Done
            }
            Err(e) => {
                self.ctx
                    .notify(Notice::from_error("Couldn't add to watchlist", &e));
                Outcome::RolledBack
            }
        }
    }

    pub async fn remove(&mut self, movie_id: i64) -> Outcome {
        let Some(session) = self
            .ctx
            .require_session("manage your watchlist")
            .await
        else {
            return Outcome::SignedOut;
        };

        let Some(index) = self.items.iter().position(|i| i.movie_id == movie_id) else {
            self.ctx.notify(Notice::info(
                "Not in watchlist",
                "This movie is not in your watchlist.",
            ));
            return Outcome::Missing;
        };
        let remote = &self.remote;

        let result = attempt(
            &mut self.items,
            |items| (index, items.remove(index)),
            |_| remote.remove_from_watchlist(&session.token, movie_id),
            |items, (index, item)| items.insert(index, item),
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx.notify(Notice::success(
                    "Removed from watchlist",
                    "The movie was removed from your watchlist.",
                ));
                Outcome::Done
            }
            Err(e) => {
                self.ctx
                    .notify(Notice::from_error("Couldn't remove from watchlist", &e));
                Outcome::RolledBack
            }
        }
    }
}
