#![allow(dead_code)]

use cinelite::api::{Api, ApiRequest};
use cinelite::entity::catalogue;
use cinelite::store::MemoryStore;
use serde_json::{Value, json};
use std::sync::Arc;

pub fn fresh() -> (Arc<MemoryStore>, Api) {
    let store = Arc::new(MemoryStore::with_tables(catalogue()));
    let api = Api::new(store.clone());
    (store, api)
}

pub fn movie(id: i64, title: &str, rating: f64, genres: &str) -> Value {
    json!({ "id": id, "title": title, "rating": rating, "vote_count": id * 10, "genres": genres })
}

pub fn seed(api: &Api, rows: &[(&str, Value)]) {
    for (route, body) in rows {
        let resp = api.dispatch(&ApiRequest::post(format!("/{route}"), body.clone()));
        assert!(resp.is_success(), "seeding {route} failed: {:?}", resp.body);
    }
}

/// A small movie catalogue with a couple of ratings and tags.
pub fn catalogue_api() -> (Arc<MemoryStore>, Api) {
    let (store, api) = fresh();
    seed(
        &api,
        &[
            ("movies", movie(1, "The Matrix", 8.7, "Action|Sci-Fi")),
            ("movies", movie(2, "Matrix Reloaded", 7.2, "Action|Sci-Fi")),
            ("movies", movie(3, "Amelie", 8.3, "Comedy|Romance")),
            ("movies", movie(4, "Heat", 8.3, "Action|Crime|Drama")),
            ("movies", movie(5, "Drama Queen", 5.1, "Comedy")),
            ("ratings", json!({ "user": 1, "movie": 1, "rating": 5.0 })),
            ("ratings", json!({ "user": 1, "movie": 3, "rating": 4.5 })),
            ("ratings", json!({ "user": 2, "movie": 1, "rating": 3.5 })),
            ("tags", json!({ "user": 1, "movie": 1, "name": "cyberpunk" })),
            ("tags", json!({ "user": 1, "movie": 1, "name": "keanu" })),
        ],
    );
    (store, api)
}

pub fn list(api: &Api, route: &str, query: &[(&str, &str)]) -> (u16, Value) {
    let mut req = ApiRequest::get(format!("/{route}"));
    for (k, v) in query {
        req = req.with_query(k, v);
    }
    let resp = api.dispatch(&req);
    (resp.status, resp.body)
}

pub fn ids(page: &Value) -> Vec<i64> {
    page["items"].as_array().map(|items| items.iter().filter_map(|m| m["id"].as_i64()).collect()).unwrap_or_default()
}
