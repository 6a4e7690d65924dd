use crate::{ChosenDB, Error, error::Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, QueryBuilder};
use tracing::debug;

const SELECT_MOVIE: &str = "SELECT id, title, description, release_year, director, genre, rating, duration, poster_url FROM movie";

pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

fn not_in_future(year: &i32, _ctx: &()) -> garde::Result {
    let max = current_year();
    if *year > max {
        Err(garde::Error::new(format!("greater than {max}")))
    } else {
        Ok(())
    }
}

fn valid_poster_url(value: &str, _ctx: &()) -> garde::Result {
    let url = url::Url::parse(value).map_err(|e| garde::Error::new(format!("not a valid url: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(()),
        "http" | "https" => Err(garde::Error::new("url has no host")),
        scheme => Err(garde::Error::new(format!(
            "unsupported url scheme {scheme}, expected http or https"
        ))),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub director: String,
    pub genre: String,
    pub rating: f64,
    pub duration: i32,
    pub poster_url: Option<String>,
}

/// Complete new record, the text length rules count characters
#[derive(Debug, Clone, PartialEq, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(rename_all = "camelCase"))]
pub struct CreateMovie {
    #[garde(length(chars, min = 1, max = 255))]
    pub title: String,
    #[garde(length(chars, min = 10, max = 1000))]
    pub description: String,
    #[garde(range(min = 1888), custom(not_in_future))]
    pub release_year: i32,
    #[garde(length(chars, min = 2, max = 100))]
    pub director: String,
    #[garde(length(chars, min = 2, max = 50))]
    pub genre: String,
    #[garde(range(min = 0.0, max = 10.0))]
    pub rating: f64,
    /// Duration in minutes
    #[garde(range(min = 1, max = 1000))]
    pub duration: i32,
    #[garde(inner(custom(valid_poster_url)))]
    pub poster_url: Option<String>,
}

/// Partial update, `None` leaves the column untouched.
///
/// `poster_url` is doubly optional: `Some(None)` clears the poster.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(rename_all = "camelCase"))]
pub struct UpdateMovie {
    #[garde(length(chars, min = 1, max = 255))]
    pub title: Option<String>,
    #[garde(length(chars, min = 10, max = 1000))]
    pub description: Option<String>,
    #[garde(range(min = 1888), inner(custom(not_in_future)))]
    pub release_year: Option<i32>,
    #[garde(length(chars, min = 2, max = 100))]
    pub director: Option<String>,
    #[garde(length(chars, min = 2, max = 50))]
    pub genre: Option<String>,
    #[garde(range(min = 0.0, max = 10.0))]
    pub rating: Option<f64>,
    #[garde(range(min = 1, max = 1000))]
    pub duration: Option<i32>,
    #[garde(inner(inner(custom(valid_poster_url))))]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub poster_url: Option<Option<String>>,
}

impl UpdateMovie {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.release_year.is_none()
            && self.director.is_none()
            && self.genre.is_none()
            && self.rating.is_none()
            && self.duration.is_none()
            && self.poster_url.is_none()
    }
}

impl TryFrom<UpdateMovie> for CreateMovie {
    /// Names of the mandatory fields that were not supplied
    type Error = Vec<&'static str>;

    fn try_from(value: UpdateMovie) -> std::result::Result<Self, Self::Error> {
        let mut missing = Vec::new();
        macro_rules! required {
            ($field:ident) => {
                match value.$field {
                    Some(v) => Some(v),
                    None => {
                        missing.push(stringify!($field));
                        None
                    }
                }
            };
        }
        let title = required!(title);
        let description = required!(description);
        let release_year = required!(release_year);
        let director = required!(director);
        let genre = required!(genre);
        let rating = required!(rating);
        let duration = required!(duration);

        match (title, description, release_year, director, genre, rating, duration) {
            (
                Some(title),
                Some(description),
                Some(release_year),
                Some(director),
                Some(genre),
                Some(rating),
                Some(duration),
            ) => Ok(CreateMovie {
                title,
                description,
                release_year,
                director,
                genre,
                rating,
                duration,
                poster_url: value.poster_url.flatten(),
            }),
            _ => Err(missing),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct MovieFilter {
    /// Exact genre, case insensitive
    pub genre: Option<String>,
    /// Part of the title, case insensitive
    pub title: Option<String>,
    /// Part of the director's name, case insensitive
    pub director: Option<String>,
}

impl MovieFilter {
    /// Drops empty criteria, they do not restrict anything
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
        MovieFilter {
            genre: keep(self.genre),
            title: keep(self.title),
            director: keep(self.director),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genre.is_none() && self.title.is_none() && self.director.is_none()
    }
}

/// Lowercased form kept in the `*_key` columns, SQLite itself only folds ASCII
pub fn search_key(value: &str) -> String {
    value.to_lowercase()
}

pub type MovieRepository = MovieRepositoryImpl<Pool<ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateMovie) -> Result<Movie> {
        let result = sqlx::query(
            "INSERT INTO movie (title, description, release_year, director, genre, rating, duration, poster_url, \
            title_key, director_key, genre_key) \
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.release_year)
        .bind(&payload.director)
        .bind(&payload.genre)
        .bind(payload.rating)
        .bind(payload.duration)
        .bind(&payload.poster_url)
        .bind(search_key(&payload.title))
        .bind(search_key(&payload.director))
        .bind(search_key(&payload.genre))
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created movie {id}");
        self.get(id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Movie>> {
        let records = sqlx::query_as::<_, Movie>(&format!("{SELECT_MOVIE} ORDER BY id"))
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn filter(&self, filter: MovieFilter) -> Result<Vec<Movie>> {
        let mut query = QueryBuilder::<ChosenDB>::new(SELECT_MOVIE);
        query.push(" WHERE 1 = 1");
        if let Some(genre) = filter.genre {
            query.push(" AND genre_key = ").push_bind(search_key(&genre));
        }
        // instr keeps % and _ literal, unlike LIKE
        if let Some(title) = filter.title {
            query
                .push(" AND instr(title_key, ")
                .push_bind(search_key(&title))
                .push(") > 0");
        }
        if let Some(director) = filter.director {
            query
                .push(" AND instr(director_key, ")
                .push_bind(search_key(&director))
                .push(") > 0");
        }
        query.push(" ORDER BY id");

        let records = query
            .build_query_as::<Movie>()
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Movie>> {
        let record = sqlx::query_as::<_, Movie>(&format!("{SELECT_MOVIE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        Ok(record)
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        self.find(id)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Movie {id}")))
    }

    pub async fn update(&self, id: i64, payload: UpdateMovie) -> Result<Movie> {
        if payload.is_empty() {
            debug!("Nothing to update for movie {id}");
            return self.get(id).await;
        }

        let mut query = QueryBuilder::<ChosenDB>::new("UPDATE movie SET ");
        let mut columns = query.separated(", ");
        if let Some(title) = payload.title {
            columns
                .push("title_key = ")
                .push_bind_unseparated(search_key(&title));
            columns.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = payload.description {
            columns.push("description = ").push_bind_unseparated(description);
        }
        if let Some(release_year) = payload.release_year {
            columns
                .push("release_year = ")
                .push_bind_unseparated(release_year);
        }
        if let Some(director) = payload.director {
            columns
                .push("director_key = ")
                .push_bind_unseparated(search_key(&director));
            columns.push("director = ").push_bind_unseparated(director);
        }
        if let Some(genre) = payload.genre {
            columns
                .push("genre_key = ")
                .push_bind_unseparated(search_key(&genre));
            columns.push("genre = ").push_bind_unseparated(genre);
        }
        if let Some(rating) = payload.rating {
            columns.push("rating = ").push_bind_unseparated(rating);
        }
        if let Some(duration) = payload.duration {
            columns.push("duration = ").push_bind_unseparated(duration);
        }
        if let Some(poster_url) = payload.poster_url {
            columns.push("poster_url = ").push_bind_unseparated(poster_url);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&self.executor).await?;
        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Movie {id}")))
        } else {
            self.get(id).await
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM movie WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Movie {id}")))
        } else {
            Ok(())
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM movie")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }
}
