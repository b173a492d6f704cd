use std::sync::Arc;

use chrono::Utc;

use super::{
    context::ClientContext,
    notice::Notice,
    optimistic::{attempt, local_id, restore, Outcome},
    storage::{load_or_default, save_json, LocalStore, WATCH_HISTORY_KEY},
};
use crate::models::WatchHistoryItem;

/// Entries kept; older ones fall off the end
pub const MAX_HISTORY: usize = 100;

/// Guest watch history, most recent first
pub struct WatchHistoryStore {
    ctx: ClientContext,
    storage: Arc<dyn LocalStore>,
    items: Vec<WatchHistoryItem>,
}

impl WatchHistoryStore {
    pub fn new(ctx: ClientContext, storage: Arc<dyn LocalStore>) -> Self {
        Self {
            ctx,
            storage,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[WatchHistoryItem] {
        &self.items
    }

    pub fn has_watched(&self, movie_id: i64) -> bool {
        self.items.iter().any(|i| i.movie_id == movie_id)
    }

    pub async fn load(&mut self) {
        self.items = load_or_default(self.storage.as_ref(), WATCH_HISTORY_KEY).await;
    }

    async fn save(
        &mut self,
        edit: impl FnOnce(&mut Vec<WatchHistoryItem>),
        success: Notice,
        failure: &str,
    ) -> Outcome {
        let storage = self.storage.clone();
        let result = attempt(
            &mut self.items,
            |items| {
                let snapshot = items.clone();
                edit(items);
                snapshot
            },
            |items| save_json(storage, WATCH_HISTORY_KEY, items),
            restore,
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx.notify(success);
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error(failure, &e));
                Outcome::RolledBack
            }
        }
    }

    /// Marks a movie as watched; watching it again moves it to the front
    pub async fn record(
        &mut self,
        movie_id: i64,
        title: &str,
        poster_url: Option<String>,
        mood: Option<String>,
    ) -> Outcome {
        let entry = WatchHistoryItem {
            id: local_id(),
            movie_id,
            title: title.to_string(),
            poster_url,
            mood,
            watched_at: Utc::now(),
        };

        self.save(
            |items| {
                items.retain(|i| i.movie_id != movie_id);
                items.insert(0, entry);
                items.truncate(MAX_HISTORY);
            },
            Notice::success("Marked as watched", format!("{} was added to your history.", title)),
            "Couldn't update watch history",
        )
        .await
    }

    pub async fn remove(&mut self, movie_id: i64) -> Outcome {
        if !self.has_watched(movie_id) {
            self.ctx.notify(Notice::info(
                "Not in history",
                "That movie is not in your watch history.",
            ));
            return Outcome::Missing;
        }

        self.save(
            |items| items.retain(|i| i.movie_id != movie_id),
            Notice::success("Removed from history", "The movie was removed from your history."),
            "Couldn't update watch history",
        )
        .await
    }

    pub async fn clear(&mut self) -> Outcome {
        self.save(
            Vec::clear,
            Notice::success("History cleared", "Your watch history is empty."),
            "Couldn't clear watch history",
        )
        .await
    }
}
