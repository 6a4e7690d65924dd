use crate::repository_from_request;
use crate::state::AppState;
use axum::routing::{get, post};
use cinelog_dal::movie::MovieRepository;

repository_from_request!(MovieRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(
    crud_api::create,
    crud_api::list,
    crud_api::get,
    crud_api::update,
    crud_api::delete
))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

pub mod crud_api {
    use axum::{response::IntoResponse, Json};
    use cinelog_dal::movie::{CreateMovie, Movie, MovieFilter, MovieRepository, UpdateMovie};
    use http::StatusCode;
    use tracing::{debug, info};

    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use crate::error::ErrorResponse;
    use crate::{
        error::{ApiError, ApiResult},
        rest_api::{QueryParams, RecordId},
        validate::Strict,
    };

    /// Existence check before any write, so missing records give 404 uniformly
    async fn existing(repository: &MovieRepository, id: i64) -> ApiResult<Movie> {
        repository.find(id).await?.ok_or_else(|| {
            debug!("Movie {id} does not exist");
            ApiError::NotFound("Movie".to_string())
        })
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "movies", operation_id = "createMovie",
        summary = "Create a new movie", request_body = CreateMovie,
        responses((status = StatusCode::CREATED, description = "The movie has been successfully created", body = Movie),
            (status = StatusCode::BAD_REQUEST, description = "Invalid data provided", body = ErrorResponse))))]
    pub async fn create(
        repository: MovieRepository,
        Strict(payload): Strict<CreateMovie>,
    ) -> ApiResult<impl IntoResponse> {
        let record = repository.create(payload).await?;
        info!("Created movie {} ({})", record.id, record.title);

        Ok((StatusCode::CREATED, Json(record)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "movies", operation_id = "listMovies",
        summary = "Get all movies with optional filters", params(MovieFilter),
        responses((status = StatusCode::OK, description = "List of movies", body = Vec<Movie>),
            (status = StatusCode::BAD_REQUEST, description = "Malformed query string", body = ErrorResponse),
            (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal server error", body = ErrorResponse))))]
    pub async fn list(
        repository: MovieRepository,
        QueryParams(filter): QueryParams<MovieFilter>,
    ) -> ApiResult<impl IntoResponse> {
        let filter = filter.normalized();
        let movies = if filter.is_empty() {
            repository.list_all().await?
        } else {
            debug!("Filtering movies by {filter:?}");
            repository.filter(filter).await?
        };

        Ok((StatusCode::OK, Json(movies)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = "movies", operation_id = "getMovie",
        summary = "Get a movie by ID", params(("id" = i64, Path, description = "Movie ID")),
        responses((status = StatusCode::OK, description = "Movie found", body = Movie),
            (status = StatusCode::NOT_FOUND, description = "Movie not found", body = ErrorResponse))))]
    pub async fn get(
        RecordId(id): RecordId,
        repository: MovieRepository,
    ) -> ApiResult<impl IntoResponse> {
        let record = existing(&repository, id).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = "movies", operation_id = "updateMovie",
        summary = "Update a movie", params(("id" = i64, Path, description = "Movie ID")), request_body = UpdateMovie,
        responses((status = StatusCode::OK, description = "Movie updated successfully", body = Movie),
            (status = StatusCode::NOT_FOUND, description = "Movie not found", body = ErrorResponse),
            (status = StatusCode::BAD_REQUEST, description = "Invalid data provided", body = ErrorResponse))))]
    pub async fn update(
        RecordId(id): RecordId,
        repository: MovieRepository,
        Strict(payload): Strict<UpdateMovie>,
    ) -> ApiResult<impl IntoResponse> {
        existing(&repository, id).await?;
        let record = repository.update(id, payload).await?;
        info!("Updated movie {id}");

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = "movies", operation_id = "deleteMovie",
        summary = "Delete a movie", params(("id" = i64, Path, description = "Movie ID")),
        responses((status = StatusCode::OK, description = "Movie deleted successfully, returns deleted movie", body = Movie),
            (status = StatusCode::NOT_FOUND, description = "Movie not found", body = ErrorResponse))))]
    pub async fn delete(
        RecordId(id): RecordId,
        repository: MovieRepository,
    ) -> ApiResult<impl IntoResponse> {
        let record = existing(&repository, id).await?;
        repository.delete(id).await?;
        info!("Deleted movie {id}");

        Ok((StatusCode::OK, Json(record)))
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(crud_api::create).get(crud_api::list))
        .route(
            "/{id}",
            get(crud_api::get)
                .put(crud_api::update)
                .delete(crud_api::delete),
        )
}
