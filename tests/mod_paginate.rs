mod common;

use cinelite::api::Api;
use cinelite::query::{Query, paginate, total_pages};
use cinelite::resource::PageLimits;
use common::{fresh, ids, list, movie, seed};

fn matrix_catalogue() -> Api {
    let (_, api) = fresh();
    let rows: Vec<(&str, serde_json::Value)> = (1..=25)
        .map(|i| ("movies", movie(i, &format!("Matrix {i}"), (i * 7 % 25) as f64 / 2.5, "Sci-Fi")))
        .collect();
    seed(&api, &rows);
    api
}

#[test]
fn exact_title_pages_only_the_matching_rows() {
    let (_, api) = fresh();
    let mut rows: Vec<(&str, serde_json::Value)> = (1..=25)
        .map(|i| ("movies", movie(i, "Matrix", (i * 11 % 25) as f64 / 2.5, "Sci-Fi")))
        .collect();
    for (id, title) in [(26, "Matrix Reloaded"), (27, "matrix"), (28, "The Matrix")] {
        rows.push(("movies", movie(id, title, 9.9, "Sci-Fi")));
    }
    seed(&api, &rows);

    let mut all = Vec::new();
    for page in ["1", "2", "3"] {
        let (status, body) = list(
            &api,
            "movies",
            &[("filter", "exact(title, Matrix)"), ("sort", "rating.desc"), ("page", page), ("limit", "10")],
        );
        assert_eq!(status, 200);
        assert_eq!(body["total_pages"], 3);
        assert_eq!(body["total_items"], 25);
        for item in body["items"].as_array().unwrap() {
            assert_eq!(item["title"], "Matrix");
            all.push(item["rating"].as_f64().unwrap());
        }
    }
    assert_eq!(all.len(), 25);
    assert!(all.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn twenty_five_rows_in_pages_of_ten() {
    let api = matrix_catalogue();
    let mut seen = Vec::new();
    let mut last_rating = f64::INFINITY;
    for page in 1..=3 {
        let p = page.to_string();
        let (status, body) = list(
            &api,
            "movies",
            &[("filter", "partial(title, Matrix)"), ("sort", "rating.desc"), ("page", &p), ("limit", "10")],
        );
        assert_eq!(status, 200);
        assert_eq!(body["total_items"], 25);
        assert_eq!(body["total_pages"], 3);
        assert_eq!(body["items_per_page"], 10);
        assert_eq!(body["has_prev"], page > 1);
        assert_eq!(body["has_next"], page < 3);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), if page == 3 { 5 } else { 10 });
        for item in items {
            let r = item["rating"].as_f64().unwrap();
            assert!(r <= last_rating);
            last_rating = r;
        }
        seen.extend(ids(&body));
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=25).collect::<Vec<_>>());
}

#[test]
fn page_outside_range_is_rejected() {
    let api = matrix_catalogue();
    for page in ["0", "-1", "4"] {
        let (status, body) = list(&api, "movies", &[("page", page), ("limit", "10")]);
        assert_eq!(status, 400, "page {page}");
        assert_eq!(body["detail"], "page number exceeds limits");
    }
}

#[test]
fn empty_result_still_has_one_page() {
    let api = matrix_catalogue();
    let (status, body) = list(&api, "movies", &[("filter", "exact(title, Heat)")]);
    assert_eq!(status, 200);
    assert_eq!(body["total_items"], 0);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["has_next"], false);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    let (status, _) = list(&api, "movies", &[("filter", "exact(title, Heat)"), ("page", "2")]);
    assert_eq!(status, 400);
}

#[test]
fn limit_bounds_follow_configured_maximum() {
    let (_, api) = fresh();
    let api = api.with_limits(PageLimits { default_page_size: 5, max_page_size: 20 });
    seed(&api, &(1..=12).map(|i| ("movies", movie(i, "x", 1.0, ""))).collect::<Vec<_>>());
    let (_, body) = list(&api, "movies", &[]);
    assert_eq!(body["items_per_page"], 5);
    assert_eq!(body["total_pages"], 3);
    for limit in ["0", "21", "ten"] {
        let (status, _) = list(&api, "movies", &[("limit", limit)]);
        assert_eq!(status, 400, "limit {limit}");
    }
    let (status, body) = list(&api, "movies", &[("limit", "20")]);
    assert_eq!(status, 200);
    assert_eq!(body["total_pages"], 1);
}

#[test]
fn identical_requests_return_identical_pages() {
    let api = matrix_catalogue();
    let query = [("sort", "genres.asc"), ("page", "2"), ("limit", "7")];
    let first = list(&api, "movies", &query);
    let second = list(&api, "movies", &query);
    assert_eq!(first, second);
}

#[test]
fn paginator_works_on_raw_queries() {
    let (store, api) = fresh();
    seed(&api, &(1..=4).map(|i| ("genres", serde_json::json!({ "id": format!("g{i}") }))).collect::<Vec<_>>());
    let page = paginate(&*store, &Query::new("genre"), 2, 3).unwrap();
    assert_eq!(page.total_items, 4);
    assert_eq!(page.total_pages, total_pages(4, 3));
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].get_str("id").unwrap(), "g4");
}
