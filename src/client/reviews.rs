use std::sync::Arc;

use chrono::Utc;

use super::{
    context::ClientContext,
    notice::Notice,
    optimistic::{attempt, temporary_id, Outcome},
    remote::ReviewApi,
};
use crate::models::{NewReview, Review, ReviewUpdate};

/// Reviews of the movie currently on screen, newest first
pub struct ReviewStore {
    ctx: ClientContext,
    remote: Arc<dyn ReviewApi>,
    movie_id: Option<i64>,
    reviews: Vec<Review>,
}

impl ReviewStore {
    pub fn new(ctx: ClientContext, remote: Arc<dyn ReviewApi>) -> Self {
        Self {
            ctx,
            remote,
            movie_id: None,
            reviews: Vec::new(),
        }
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn movie_id(&self) -> Option<i64> {
        self.movie_id
    }

    pub async fn fetch_for_movie(&mut self, movie_id: i64) -> Outcome {
        match self.remote.reviews_for_movie(movie_id).await {
            Ok(reviews) => {
                self.movie_id = Some(movie_id);
                self.reviews = reviews;
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, movie_id, "Failed to load reviews");
                self.ctx.notify(Notice::from_error("Couldn't load reviews", &e));
                Outcome::Failed
            }
        }
    }

    /// The signed-in user's review of `movie_id`, if loaded
    pub async fn user_review_for(&self, movie_id: i64) -> Option<Review> {
        let session = self.ctx.session().await?;
        self.reviews
            .iter()
            .find(|r| r.user_id == session.user_id && r.movie_id == movie_id)
            .cloned()
    }

    pub async fn add(&mut self, review: NewReview) -> Outcome {
        let Some(session) = self.ctx.require_session("write reviews").await else {
            return Outcome::SignedOut;
        };

        if let Err(e) = review.validate() {
            self.ctx.notify(Notice::from_error("Invalid review", &e));
            return Outcome::Invalid;
        }

        if self.user_review_for(review.movie_id).await.is_some() {
            self.ctx.notify(Notice::info(
                "Already reviewed",
                format!(
                    "You have already reviewed {}. Edit your review instead.",
                    review.movie_title
                ),
            ));
            return Outcome::Duplicate;
        }

        let now = Utc::now();
        let temp_id = temporary_id();
        let placeholder = Review {
            id: temp_id.clone(),
            user_id: session.user_id,
            username: session.username.clone(),
            movie_id: review.movie_id,
            movie_title: review.movie_title.clone(),
            rating: review.rating,
            content: review.content.clone(),
            created_at: now,
            updated_at: now,
        };
        let remote = &self.remote;

        let result = attempt(
            &mut self.reviews,
            |reviews| reviews.insert(0, placeholder),
            |_| remote.add_review(&session.token, review),
            |reviews, ()| reviews.retain(|r| r.id != temp_id),
        )
        .await;

        match result {
            Ok(saved) => {
                if let Some(slot) = self.reviews.iter_mut().find(|r| r.id == temp_id) {
                    *slot = saved;
                }
                self.ctx
                    .notify(Notice::success("Review posted", "Thanks for sharing your thoughts."));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't post review", &e));
                Outcome::RolledBack
            }
        }
    }

    pub async fn update(&mut self, update: ReviewUpdate) -> Outcome {
        let Some(session) = self.ctx.require_session("edit reviews").await else {
            return Outcome::SignedOut;
        };

        if let Err(e) = update.validate() {
            self.ctx.notify(Notice::from_error("Invalid review", &e));
            return Outcome::Invalid;
        }

        let Some(index) = self
            .reviews
            .iter()
            .position(|r| r.id == update.review_id && r.user_id == session.user_id)
        else {
            self.ctx
                .notify(Notice::error("Review not found", "You can only edit your own reviews."));
            return Outcome::Missing;
        };
        let remote = &self.remote;
        let (rating, content) = (update.rating, update.content.clone());

        let result = attempt(
            &mut self.reviews,
            |reviews| {
                let previous = reviews[index].clone();
                let edited = &mut reviews[index];
                edited.rating = rating;
                edited.content = content;
                edited.updated_at = Utc::now();
                previous
            },
            |_| remote.update_review(&session.token, update),
            |reviews, previous| reviews[index] = previous,
        )
        .await;

        match result {
            Ok(saved) => {
                self.reviews[index] = saved;
                self.ctx
                    .notify(Notice::success("Review updated", "Your changes were saved."));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't update review", &e));
                Outcome::RolledBack
            }
        }
    }

    pub async fn delete(&mut self, review_id: &str) -> Outcome {
        let Some(session) = self.ctx.require_session("delete reviews").await else {
            return Outcome::SignedOut;
        };

        let Some(index) = self
            .reviews
            .iter()
            .position(|r| r.id == review_id && r.user_id == session.user_id)
        else {
            self.ctx.notify(Notice::error(
                "Review not found",
                "You can only delete your own reviews.",
            ));
            return Outcome::Missing;
        };
        let remote = &self.remote;

        let result = attempt(
            &mut self.reviews,
            |reviews| (index, reviews.remove(index)),
            |_| remote.delete_review(&session.token, review_id),
            |reviews, (index, review)| reviews.insert(index, review),
        )
        .await;

        match result {
            Ok(()) => {
                self.ctx
                    .notify(Notice::success("Review deleted", "Your review was removed."));
                Outcome::Done
            }
            Err(e) => {
                self.ctx.notify(Notice::from_error("Couldn't delete review", &e));
                Outcome::RolledBack
            }
        }
    }
}
