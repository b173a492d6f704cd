use std::sync::Arc;

use chrono::Utc;

use super::{
    context::ClientContext,
    notice::Notice,
    optimistic::{attempt, restore, Outcome},
    storage::{load_or_default, save_json, LocalStore, PROFILE_KEY},
};
use crate::models::{GuestProfile, ProfileUpdate};

/// Guest profile kept in local storage
pub struct ProfileStore {
    ctx: ClientContext,
    storage: Arc<dyn LocalStore>,
    profile: GuestProfile,
}

impl ProfileStore {
    pub fn new(ctx: ClientContext, storage: Arc<dyn LocalStore>) -> Self {
        Self {
            ctx,
            storage,
            profile: GuestProfile::default(),
        }
    }

    pub fn profile(&self) -> &GuestProfile {
        &self.profile
    }

    pub async fn load(&mut self) {
        self.profile = load_or_default(self.storage.as_ref(), PROFILE_KEY).await;
    }

    /// Applies the fields present in `update`
    pub async fn update(&mut self, update: ProfileUpdate) -> Outcome {
        if let Some(name) = &update.display_name {
            if name.trim().is_empty() {
                self.ctx.notify(Notice::error(
                    "Name required",
                    "Your display name can't be empty.",
                ));
                return Outcome::Invalid;
            }
        }

        let storage = self.storage.clone();
        let result = attempt(
            &mut self.profile,
            |profile| {
                let snapshot = profile.clone();
                if let Some(name) = update.display_name {
                    profile.display_name = name.trim().to_string();
                }
                if let Some(bio) = update.bio {
                    profile.bio = Some(bio).filter(|b| !b.trim().is_empty());
                }
                if let Some(avatar_url) = update.avatar_url {
                    profile.avatar_url = Some(avatar_url).filter(|u| !u.trim().is_empty());
                }
                if let Some(genres) = update.favorite_genres {
                    profile.favorite_genres = genres;
                }
                if let Some(moods) = update.favorite_moods {
                    profile.favorite_moods = moods;
                }
                profile.updated_at = Utc::now();
                snapshot
            },
            |profile| save_json(storage, PROFILE_KEY, profile),
            restore,
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx
                    .notify(Notice::success("Profile updated", "Your changes were saved."));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't save profile", &e));
                Outcome::RolledBack
            }
        }
    }

    /// Back to the default profile and drops the stored copy
    pub async fn reset(&mut self) -> Outcome {
        let storage = self.storage.clone();
        let result = attempt(
            &mut self.profile,
            |profile| std::mem::take(profile),
            |_| async move { storage.remove(PROFILE_KEY).await },
            restore,
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx
                    .notify(Notice::success("Profile reset", "Your profile is back to defaults."));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't reset profile", &e));
                Outcome::RolledBack
            }
        }
    }
}
