use cinelog_dal::movie::Movie;
use cinelog_e2e_tests::{
    extend_url, launch_env, prepare_env,
    rest::{create_movie, inception, movie, movies_url},
};
use serde_json::{Value, json};
use tracing::info;
use tracing_test::traced_test;

fn titles(movies: &[Movie]) -> Vec<&str> {
    movies.iter().map(|m| m.title.as_str()).collect()
}

#[tokio::test]
#[traced_test]
async fn test_movie_lifecycle() {
    let (args, mut guard) = prepare_env("test_movie_lifecycle").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();

    let payload = inception();
    let created = create_movie(&client, &base_url, &payload).await.unwrap();
    assert_eq!(1, created.id);
    assert_eq!("Inception", created.title);
    assert_eq!(2010, created.release_year);
    assert_eq!(8.8, created.rating);
    assert!(created.poster_url.is_none());

    let record_url = extend_url(&movies_url(&base_url), created.id);
    let response = client.get(record_url.clone()).send().await.unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 200);
    let stored: Movie = response.json().await.unwrap();
    assert_eq!(created, stored);

    let response = client.delete(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let deleted: Movie = response.json().await.unwrap();
    assert_eq!(created, deleted);

    let response = client.get(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!("Movie not found", body["error"]);
}

#[tokio::test]
#[traced_test]
async fn test_partial_update() {
    let (args, mut guard) = prepare_env("test_partial_update").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();

    let created = create_movie(&client, &base_url, &inception()).await.unwrap();
    let record_url = extend_url(&movies_url(&base_url), created.id);

    let response = client
        .put(record_url.clone())
        .json(&json!({"rating": 9.5}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 200);
    let updated: Movie = response.json().await.unwrap();
    assert_eq!(
        Movie {
            rating: 9.5,
            ..created.clone()
        },
        updated
    );

    let response = client
        .put(record_url.clone())
        .json(&json!({"posterUrl": "https://example.com/inception-poster.jpg", "duration": "150"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Movie = response.json().await.unwrap();
    assert_eq!(
        Some("https://example.com/inception-poster.jpg"),
        updated.poster_url.as_deref()
    );
    assert_eq!(150, updated.duration);
    assert_eq!(9.5, updated.rating);

    let response = client
        .put(record_url.clone())
        .json(&json!({"rating": 10.5, "title": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client.get(record_url.clone()).send().await.unwrap();
    let stored: Movie = response.json().await.unwrap();
    assert_eq!(updated, stored);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_input() {
    let (args, mut guard) = prepare_env("test_invalid_input").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();
    let api_url = movies_url(&base_url);

    let mut payload = inception();
    payload["releaseYear"] = json!(1800);
    payload["rating"] = json!(11);
    payload["title"] = json!("");
    payload["studio"] = json!("Warner Bros.");
    let response = client
        .post(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!("Invalid input", body["error"]);
    let mut fields: Vec<&str> = body["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    fields.sort();
    assert_eq!(vec!["rating", "releaseYear", "studio", "title"], fields);

    let response = client
        .post(api_url.clone())
        .header("content-type", "application/json")
        .body("[1, 2, 3]")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(api_url.clone())
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client.get(api_url.clone()).send().await.unwrap();
    let movies: Vec<Movie> = response.json().await.unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_missing_and_bad_ids() {
    let (args, mut guard) = prepare_env("test_missing_ids").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();
    let api_url = movies_url(&base_url);

    let missing_url = extend_url(&api_url, 42);
    let response = client.get(missing_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let response = client
        .put(missing_url.clone())
        .json(&json!({"rating": 9.5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let response = client.delete(missing_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let bad_url = extend_url(&api_url, "abc");
    let response = client.get(bad_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let response = client.delete(bad_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[traced_test]
async fn test_filters() {
    let (args, mut guard) = prepare_env("test_filters").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();
    let api_url = movies_url(&base_url);

    let movies = [
        movie("Inception", "Sci-Fi", "Christopher Nolan"),
        movie("Alien", "sci-fi", "Ridley Scott"),
        movie("Gladiator", "Action", "Ridley Scott"),
        movie("Blade Runner", "SCI-FI", "Ridley Scott"),
        movie("The Prince of Egypt", "Animation", "Brenda Chapman"),
        movie("Cidade de Deus", "Ficção", "Fernando Meirelles"),
    ];
    for payload in movies.iter() {
        create_movie(&client, &base_url, payload).await.unwrap();
    }

    let list = async |query: Option<&str>| {
        let mut url = api_url.clone();
        url.set_query(query);
        let response = client.get(url).send().await.unwrap();
        info! {"Response: {:#?}", response};
        assert_eq!(response.status().as_u16(), 200);
        let movies: Vec<Movie> = response.json().await.unwrap();
        movies
    };

    let all = list(None).await;
    assert_eq!(movies.len(), all.len());

    let sci_fi = list(Some("genre=Sci-Fi")).await;
    assert_eq!(vec!["Inception", "Alien", "Blade Runner"], titles(&sci_fi));

    let ince = list(Some("title=ince")).await;
    assert_eq!(vec!["Inception", "The Prince of Egypt"], titles(&ince));

    let both = list(Some("genre=SCI-FI&title=ince")).await;
    assert_eq!(vec!["Inception"], titles(&both));

    let scott = list(Some("director=scott&genre=action")).await;
    assert_eq!(vec!["Gladiator"], titles(&scott));

    let empty_filter = list(Some("genre=&title=")).await;
    assert_eq!(movies.len(), empty_filter.len());

    let none = list(Some("genre=Western")).await;
    assert!(none.is_empty());

    let ficcao = list(Some("genre=FICÇÃO")).await;
    assert_eq!(vec!["Cidade de Deus"], titles(&ficcao));

    let cidade = list(Some("title=CIDADE DE&genre=ficção")).await;
    assert_eq!(vec!["Cidade de Deus"], titles(&cidade));
}

#[tokio::test]
#[traced_test]
async fn test_malformed_query() {
    let (args, mut guard) = prepare_env("test_malformed_query").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();

    let mut url = movies_url(&base_url);
    url.set_query(Some("genre=a&genre=b"));
    let response = client.get(url).send().await.unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    let response = client.get(movies_url(&base_url)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_multibyte_lengths() {
    let (args, mut guard) = prepare_env("test_multibyte_lengths").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();
    let api_url = movies_url(&base_url);

    let title = "é".repeat(255);
    let created = create_movie(&client, &base_url, &movie(&title, "Ação", "Fernando Meirelles"))
        .await
        .unwrap();
    assert_eq!(title, created.title);

    let response = client
        .post(api_url.clone())
        .json(&movie("Cidade de Deus", "é", "Fernando Meirelles"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!("genre", body["violations"][0]["field"]);
}

#[tokio::test]
#[traced_test]
async fn test_api_docs() {
    let (args, mut guard) = prepare_env("test_api_docs").await.unwrap();
    let (client, base_url) = launch_env(args, &mut guard).await.unwrap();

    let response = client
        .get(base_url.join("api-docs/openapi.json").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let docs: Value = response.json().await.unwrap();
    assert_eq!("Movies API", docs["info"]["title"]);
    assert!(docs["paths"]["/movies"].is_object());
    assert!(docs["paths"]["/movies/{id}"].is_object());
}
