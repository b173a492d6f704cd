//! Guest collections
//!
//! Named movie lists kept in local storage. The storage write is the commit
//! step; ids are minted locally and never replaced.
use std::sync::Arc;

use chrono::Utc;

use super::{
    context::ClientContext,
    notice::Notice,
    optimistic::{attempt, local_id, restore, Outcome},
    storage::{load_or_default, save_json, LocalStore, COLLECTIONS_KEY},
};
use crate::models::{Collection, CollectionMovie};

pub struct CollectionStore {
    ctx: ClientContext,
    storage: Arc<dyn LocalStore>,
    collections: Vec<Collection>,
}

impl CollectionStore {
    pub fn new(ctx: ClientContext, storage: Arc<dyn LocalStore>) -> Self {
        Self {
            ctx,
            storage,
            collections: Vec::new(),
        }
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn get(&self, collection_id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == collection_id)
    }

    pub async fn load(&mut self) {
        self.collections = load_or_default(self.storage.as_ref(), COLLECTIONS_KEY).await;
        tracing::debug!(count = self.collections.len(), "Collections loaded");
    }

    /// Runs one edit through apply, storage write and rollback, then reports
    /// it with `success` or an error notice titled `failure`
    async fn commit_edit(
        &mut self,
        edit: impl FnOnce(&mut Vec<Collection>),
        success: Notice,
        failure: &str,
    ) -> Outcome {
        let storage = self.storage.clone();
        let result = attempt(
            &mut self.collections,
            |collections| {
                let snapshot = collections.clone();
                edit(collections);
                snapshot
            },
            |collections| save_json(storage, COLLECTIONS_KEY, collections),
            restore,
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx.notify(success);
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save collections");
                self.ctx.notify(Notice::from_error(failure, &e));
                Outcome::RolledBack
            }
        }
    }

    fn name_taken(&self, name: &str, except: Option<&str>) -> bool {
        self.collections
            .iter()
            .any(|c| Some(c.id.as_str()) != except && c.name.eq_ignore_ascii_case(name))
    }

    fn missing(&self) -> Outcome {
        self.ctx
            .notify(Notice::error("Collection not found", "That collection no longer exists."));
        Outcome::Missing
    }

    pub async fn create_collection(&mut self, name: &str, description: Option<String>) -> Outcome {
        let name = name.trim();
        if name.is_empty() {
            self.ctx
                .notify(Notice::error("Name required", "Give your collection a name."));
            return Outcome::Invalid;
        }
        if self.name_taken(name, None) {
            self.ctx.notify(Notice::info(
                "Collection exists",
                format!("You already have a collection called {}.", name),
            ));
            return Outcome::Duplicate;
        }

        let now = Utc::now();
        let collection = Collection {
            id: local_id(),
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            movies: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.commit_edit(
            |collections| collections.push(collection),
            Notice::success("Collection created", format!("{} is ready.", name)),
            "Couldn't create collection",
        )
        .await
    }

    pub async fn rename_collection(&mut self, collection_id: &str, name: &str) -> Outcome {
        let name = name.trim();
        if self.get(collection_id).is_none() {
            return self.missing();
        }
        if name.is_empty() {
            self.ctx
                .notify(Notice::error("Name required", "Give your collection a name."));
            return Outcome::Invalid;
        }
        if self.name_taken(name, Some(collection_id)) {
            self.ctx.notify(Notice::info(
                "Collection exists",
                format!("You already have a collection called {}.", name),
            ));
            return Outcome::Duplicate;
        }

        let new_name = name.to_string();
        self.commit_edit(
            |collections| {
                if let Some(c) = collections.iter_mut().find(|c| c.id == collection_id) {
                    c.name = new_name;
                    c.updated_at = Utc::now();
                }
            },
            Notice::success("Collection renamed", format!("Renamed to {}.", name)),
            "Couldn't rename collection",
        )
        .await
    }

    pub async fn delete_collection(&mut self, collection_id: &str) -> Outcome {
        let Some(name) = self.get(collection_id).map(|c| c.name.clone()) else {
            return self.missing();
        };

        self.commit_edit(
            |collections| collections.retain(|c| c.id != collection_id),
            Notice::success("Collection deleted", format!("{} was deleted.", name)),
            "Couldn't delete collection",
        )
        .await
    }

    pub async fn add_movie_to_collection(
        &mut self,
        collection_id: &str,
        movie: CollectionMovie,
    ) -> Outcome {
        let Some(collection) = self.get(collection_id) else {
            return self.missing();
        };
        if collection.contains(movie.movie_id) {
            self.ctx.notify(Notice::info(
                "Already in collection",
                format!("{} is already in {}.", movie.title, collection.name),
            ));
            return Outcome::Duplicate;
        }

        let notice = Notice::success(
            "Added to collection",
            format!("{} was added to {}.", movie.title, collection.name),
        );
        self.commit_edit(
            |collections| {
                if let Some(c) = collections.iter_mut().find(|c| c.id == collection_id) {
                    c.movies.insert(0, movie);
                    c.updated_at = Utc::now();
                }
            },
            notice,
            "Couldn't add to collection",
        )
        .await
    }

    pub async fn remove_movie_from_collection(
        &mut self,
        collection_id: &str,
        movie_id: i64,
    ) -> Outcome {
        let Some(collection) = self.get(collection_id) else {
            return self.missing();
        };
        if !collection.contains(movie_id) {
            self.ctx.notify(Notice::info(
                "Not in collection",
                format!("That movie is not in {}.", collection.name),
            ));
            return Outcome::Missing;
        }

        let notice = Notice::success(
            "Removed from collection",
            format!("The movie was removed from {}.", collection.name),
        );
        self.commit_edit(
            |collections| {
                if let Some(c) = collections.iter_mut().find(|c| c.id == collection_id) {
                    c.movies.retain(|m| m.movie_id != movie_id);
                    c.updated_at = Utc::now();
                }
            },
            notice,
            "Couldn't remove from collection",
        )
        .await
    }
}
