use std::sync::Arc;

use uuid::Uuid;

use super::{
    context::ClientContext,
    notice::Notice,
    optimistic::{attempt, Outcome},
    remote::FollowApi,
};
use crate::models::UserSummary;

/// Users the signed-in user follows
pub struct FollowStore {
    ctx: ClientContext,
    remote: Arc<dyn FollowApi>,
    following: Vec<UserSummary>,
}

impl FollowStore {
    pub fn new(ctx: ClientContext, remote: Arc<dyn FollowApi>) -> Self {
        Self {
            ctx,
            remote,
            following: Vec::new(),
        }
    }

    pub fn following(&self) -> &[UserSummary] {
        &self.following
    }

    pub fn is_following(&self, user_id: Uuid) -> bool {
        self.following.iter().any(|u| u.id == user_id)
    }

    pub async fn fetch_following(&mut self) -> Outcome {
        let Some(session) = self.ctx.session().await else {
            self.following.clear();
            return Outcome::Done;
        };

        match self.remote.following(&session.token).await {
            Ok(users) => {
                self.following = users;
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load followed users");
                self.ctx
                    .notify(Notice::from_error("Couldn't load who you follow", &e));
                Outcome::Failed
            }
        }
    }

    pub async fn follow(&mut self, user: UserSummary) -> Outcome {
        let Some(session) = self.ctx.require_session("follow other users").await else {
            return Outcome::SignedOut;
        };

        if user.id == session.user_id {
            self.ctx
                .notify(Notice::error("Can't follow yourself", "Pick someone else to follow."));
            return Outcome::Invalid;
        }

        if self.is_following(user.id) {
            self.ctx.notify(Notice::info(
                "Already following",
                format!("You already follow {}.", user.username),
            ));
            return Outcome::Duplicate;
        }

        let (user_id, username) = (user.id, user.username.clone());
        let remote = &self.remote;

        let result = attempt(
            &mut self.following,
            |following| following.insert(0, user),
            |_| remote.follow(&session.token, user_id),
            |following, ()| following.retain(|u| u.id != user_id),
        )
        .await;

        match result {
            Ok(_) => {
                self.ctx.notify(Notice::success(
                    "Following",
                    format!("You now follow {}.", username),
                ));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't follow user", &e));
                Outcome::RolledBack
            }
        }
    }

    pub async fn unfollow(&mut self, user_id: Uuid) -> Outcome {
        let Some(session) = self.ctx.require_session("manage who you follow").await else {
            return Outcome::SignedOut;
        };

        let Some(index) = self.following.iter().position(|u| u.id == user_id) else {
            self.ctx
                .notify(Notice::info("Not following", "You don't follow this user."));
            return Outcome::Missing;
        };
        let remote = &self.remote;

        let result = attempt(
            &mut self.following,
            |following| (index, following.remove(index)),
            |_| remote.unfollow(&session.token, user_id),
            |following, (index, user)| following.insert(index, user),
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx
                    .notify(Notice::success("Unfollowed", "You no longer follow this user."));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't unfollow user", &e));
                Outcome::RolledBack
            }
        }
    }
}
