use anyhow::Result;
use cinelog_dal::movie::Movie;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::info;

pub fn inception() -> Value {
    json!({
        "title": "Inception",
        "description": "A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O.",
        "releaseYear": 2010,
        "director": "Christopher Nolan",
        "genre": "Sci-Fi",
        "rating": 8.8,
        "duration": 148
    })
}

pub fn movie(title: &str, genre: &str, director: &str) -> Value {
    json!({
        "title": title,
        "description": format!("Description of the movie {title}"),
        "releaseYear": 1999,
        "director": director,
        "genre": genre,
        "rating": 7.5,
        "duration": 120
    })
}

pub fn movies_url(base_url: &Url) -> Url {
    base_url.join("movies").unwrap()
}

pub async fn create_movie(client: &reqwest::Client, base_url: &Url, payload: &Value) -> Result<Movie> {
    let response = client
        .post(movies_url(base_url))
        .json(payload)
        .send()
        .await?;
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    assert_eq!(response.status().as_u16(), 201);

    let new_movie: Movie = response.json().await?;
    Ok(new_movie)
}
