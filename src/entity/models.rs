use super::Entity;
use crate::store::Column;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
}

impl Entity for User {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const KEY: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [Column] = &[Column::integer("id")];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub imdb_id: Option<i64>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub genres: String,
}

impl Entity for Movie {
    const NAME: &'static str = "Movie";
    const TABLE: &'static str = "movie";
    const KEY: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [Column] = &[
        Column::integer("id"),
        Column::text("title"),
        Column::integer("imdb_id").nullable(),
        Column::integer("tmdb_id").nullable(),
        Column::text("poster_path").nullable(),
        Column::date("release_date").nullable(),
        Column::integer("budget").nullable(),
        Column::real("rating"),
        Column::integer("vote_count"),
        Column::text("genres"),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["imdb_id"], &["tmdb_id"]];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user: i64,
    pub movie: i64,
    pub rating: f64,
    #[serde(default = "now_ts")]
    pub timestamp: i64,
}

impl Entity for Rating {
    const NAME: &'static str = "Rating";
    const TABLE: &'static str = "rating";
    const KEY: &'static [&'static str] = &["user", "movie"];
    const COLUMNS: &'static [Column] = &[
        Column::integer("user"),
        Column::integer("movie"),
        Column::real("rating"),
        Column::integer("timestamp"),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub user: i64,
    pub movie: i64,
    pub name: String,
    #[serde(default = "now_ts")]
    pub timestamp: i64,
}

impl Entity for Tag {
    const NAME: &'static str = "Tag";
    const TABLE: &'static str = "tag";
    const KEY: &'static [&'static str] = &["user", "movie", "name"];
    const COLUMNS: &'static [Column] = &[
        Column::integer("user"),
        Column::integer("movie"),
        Column::text("name"),
        Column::integer("timestamp"),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub user: i64,
    pub movie: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
    #[serde(default = "now_ts")]
    pub timestamp: i64,
}

impl Entity for Review {
    const NAME: &'static str = "Review";
    const TABLE: &'static str = "review";
    const KEY: &'static [&'static str] = &["user", "movie"];
    const COLUMNS: &'static [Column] = &[
        Column::integer("user"),
        Column::integer("movie"),
        Column::text("title").nullable(),
        Column::text("body"),
        Column::integer("timestamp"),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    pub user: i64,
    pub movie: i64,
    #[serde(default = "now_ts")]
    pub added_at: i64,
}

impl Entity for Watchlist {
    const NAME: &'static str = "Watchlist";
    const TABLE: &'static str = "watchlist";
    const KEY: &'static [&'static str] = &["user", "movie"];
    const COLUMNS: &'static [Column] =
        &[Column::integer("user"), Column::integer("movie"), Column::integer("added_at")];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
}

impl Entity for Genre {
    const NAME: &'static str = "Genre";
    const TABLE: &'static str = "genre";
    const KEY: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [Column] = &[Column::text("id")];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: i64,
    /// Stored filter tokens, `;`-separated, applied when the section is browsed.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl Entity for Section {
    const NAME: &'static str = "Section";
    const TABLE: &'static str = "section";
    const KEY: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [Column] = &[
        Column::integer("id"),
        Column::text("name"),
        Column::text("description").nullable(),
        Column::integer("position"),
        Column::text("filter").nullable(),
        Column::text("sort").nullable(),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["name"]];
}

/// One dispatched API request, recorded by the request logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    pub path: String,
    pub verb: String,
    #[serde(default)]
    pub response_status_code: Option<String>,
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub with_token: bool,
}

impl Entity for Request {
    const NAME: &'static str = "Request";
    const TABLE: &'static str = "request";
    const KEY: &'static [&'static str] = &["id"];
    const COLUMNS: &'static [Column] = &[
        Column::integer("id"),
        Column::text("path"),
        Column::text("verb"),
        Column::text("response_status_code").nullable(),
        Column::real("start_time"),
        Column::real("end_time").nullable(),
        Column::boolean("with_token"),
    ];
}
