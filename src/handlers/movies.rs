use axum::{
    extract::{Query, State},
    http::header,
};
use serde::Deserialize;
use std::collections::HashMap;

use super::utils::{read_csv, read_int, read_string, ExpectedVersion, JsonBody, RecordId};
use crate::app::AppState;
use crate::database::models::{Movie, MovieFilter, Runtime};
use crate::database::{update_versioned, MovieStore, VersionedStore};
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validator::Validator;

/// Columns a movie list may be sorted by (each also accepts a `-` prefix)
pub const SORT_SAFELIST: &[&str] = &["id", "title", "year", "runtime"];

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateMovieInput {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateMovieInput {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateMovieInput {
    fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

/// GET /v1/movies?title=&genres=&page=&page_size=&sort=
pub async fn list(State(state): State<AppState>, Query(qs): Query<HashMap<String, String>>) -> ApiResult {
    let mut v = Validator::new();

    let filter = MovieFilter {
        title: read_string(&qs, "title", ""),
        genres: read_csv(&qs, "genres"),
    };

    let defaults = ListParams::default();
    let params = ListParams {
        page: read_int(&qs, "page", defaults.page, &mut v),
        page_size: read_int(&qs, "page_size", defaults.page_size, &mut v),
        sort: read_string(&qs, "sort", &defaults.sort),
    };
    let page = params.validate(v, SORT_SAFELIST)?;

    let (movies, metadata) = state.models.movies.list(&filter, &page).await?;

    ApiResponse::success("movies", movies)?.and("metadata", metadata)
}

/// POST /v1/movies
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<CreateMovieInput>) -> ApiResult {
    let mut movie = Movie::new(input.title, input.year, input.runtime, input.genres);

    let mut v = Validator::new();
    movie.validate(&mut v);
    v.finish()?;

    state.models.movies.insert(&mut movie).await?;

    let location = format!("/v1/movies/{}", movie.id);
    ApiResponse::created("movie", &movie)?.header(header::LOCATION, &location)
}

/// GET /v1/movies/:id
pub async fn show(State(state): State<AppState>, RecordId(id): RecordId) -> ApiResult {
    let movie = state.models.movies.get(id).await?;
    ApiResponse::success("movie", movie)
}

/// PATCH /v1/movies/:id
///
/// The stored version must still match when the write lands, and also the
/// `X-Expected-Version` header when one is sent; otherwise 409.
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ExpectedVersion(expected): ExpectedVersion,
    JsonBody(input): JsonBody<UpdateMovieInput>,
) -> ApiResult {
    let movie = update_versioned(state.models.movies.as_ref(), id, expected, |movie: &mut Movie| {
        input.apply(movie);

        let mut v = Validator::new();
        movie.validate(&mut v);
        v.finish()
    })
    .await?;

    ApiResponse::success("movie", movie)
}

/// DELETE /v1/movies/:id
pub async fn delete(State(state): State<AppState>, RecordId(id): RecordId) -> ApiResult {
    state.models.movies.delete(id).await?;
    ApiResponse::success("message", "movie successfully deleted")
}
