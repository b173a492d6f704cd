use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::image_url, tmdb::release_year, Actor, ActorPage, CastMember, MovieDetails,
        MoviePage, MovieSummary, PersonCredit, PersonDetails, TmdbCredits, TmdbMovieDetails,
        TmdbVideos, TrendingCategory,
    },
    services::providers::MovieProvider,
};

/// Cast members shown on a detail panel
const CAST_LIMIT: usize = 10;

/// Catalog lookups behind the homepage rails and detail panels
pub struct CatalogService {
    provider: Arc<dyn MovieProvider>,
}

impl CatalogService {
    pub fn new(provider: Arc<dyn MovieProvider>) -> Self {
        Self { provider }
    }

    pub async fn trending(&self, category: TrendingCategory) -> AppResult<Vec<MovieSummary>> {
        let movies = self.provider.movie_list(category).await?;
        let base = self.provider.image_base();
        Ok(movies
            .into_iter()
            .map(|m| MovieSummary::from_tmdb(m, &base))
            .collect())
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("Search query is required".to_string()));
        }

        let movies = self.provider.search_movies(query).await?;
        let base = self.provider.image_base();
        Ok(movies
            .into_iter()
            .map(|m| MovieSummary::from_tmdb(m, &base))
            .collect())
    }

    pub async fn similar(&self, movie_id: i64, page: u32) -> AppResult<MoviePage> {
        check_id(movie_id)?;
        if page == 0 {
            return Err(AppError::InvalidInput("Pages start at 1".to_string()));
        }

        let result = self.provider.similar_movies(movie_id, page).await?;
        let has_more = result.has_more();
        let base = self.provider.image_base();

        tracing::debug!(
            movie_id,
            page,
            results = result.results.len(),
            has_more,
            "Similar movies fetched"
        );

        Ok(MoviePage {
            movies: result
                .results
                .into_iter()
                .map(|m| MovieSummary::from_tmdb(m, &base))
                .collect(),
            has_more,
        })
    }

    /// Details, credits and videos are fetched in parallel; any failure fails
    /// the whole panel
    pub async fn movie_details(&self, movie_id: i64) -> AppResult<MovieDetails> {
        check_id(movie_id)?;
        let (details, credits, videos) = tokio::try_join!(
            self.provider.movie_details(movie_id),
            self.provider.movie_credits(movie_id),
            self.provider.movie_videos(movie_id),
        )?;

        Ok(flatten_details(
            details,
            credits,
            videos,
            &self.provider.image_base(),
        ))
    }

    pub async fn person_details(&self, person_id: i64) -> AppResult<PersonDetails> {
        check_id(person_id)?;
        let (person, credits) = tokio::try_join!(
            self.provider.person_details(person_id),
            self.provider.person_credits(person_id),
        )?;

        let base = self.provider.image_base();
        let mut cast = credits.cast;
        cast.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));

        Ok(PersonDetails {
            id: person.id,
            name: person.name,
            biography: person.biography.filter(|b| !b.is_empty()),
            birthday: person.birthday,
            place_of_birth: person.place_of_birth,
            known_for: person.known_for_department,
            profile_url: image_url(&base, "h632", person.profile_path.as_deref()),
            credits: cast
                .into_iter()
                .map(|c| PersonCredit::from_tmdb(c, &base))
                .collect(),
        })
    }

    pub async fn popular_actors(&self, page: u32) -> AppResult<ActorPage> {
        if page == 0 {
            return Err(AppError::InvalidInput("Pages start at 1".to_string()));
        }

        let result = self.provider.popular_people(page).await?;
        let has_more = result.has_more();
        let base = self.provider.image_base();

        Ok(ActorPage {
            actors: result
                .results
                .into_iter()
                .map(|p| Actor::from_tmdb(p, &base))
                .collect(),
            has_more,
        })
    }
}

fn flatten_details(
    details: TmdbMovieDetails,
    credits: TmdbCredits,
    videos: TmdbVideos,
    image_base: &str,
) -> MovieDetails {
    let director = credits
        .crew
        .iter()
        .find(|c| c.job == "Director")
        .map(|c| c.name.clone());

    let mut cast = credits.cast;
    cast.sort_by_key(|c| c.order);
    let cast = cast
        .into_iter()
        .take(CAST_LIMIT)
        .map(|c| CastMember {
            id: c.id,
            profile_url: image_url(image_base, "w185", c.profile_path.as_deref()),
            name: c.name,
            character: c.character,
        })
        .collect();

    let trailers = videos
        .results
        .iter()
        .filter(|v| v.site == "YouTube" && v.video_type == "Trailer");
    let trailer_key = trailers
        .clone()
        .find(|v| v.official)
        .or_else(|| trailers.clone().next())
        .map(|v| v.key.clone());

    MovieDetails {
        id: details.id,
        year: release_year(details.release_date.as_deref()),
        poster_url: image_url(image_base, "w500", details.poster_path.as_deref()),
        backdrop_url: image_url(image_base, "w1280", details.backdrop_path.as_deref()),
        title: details.title,
        overview: details.overview,
        tagline: details.tagline.filter(|t| !t.is_empty()),
        release_date: details.release_date,
        runtime: details.runtime,
        rating: details.vote_average,
        genres: details.genres.into_iter().map(|g| g.name).collect(),
        language: details.original_language,
        director,
        cast,
        trailer_key,
    }
}

/// TMDB ids are positive
fn check_id(id: i64) -> AppResult<()> {
    if id <= 0 {
        return Err(AppError::InvalidInput(format!("Invalid id: {id}")));
    }
    Ok(())
}
