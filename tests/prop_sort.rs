use cinelite::entity::catalogue;
use cinelite::query::{Query, SortExpression, parse_sort};
use cinelite::store::{Change, MemoryStore, Store};
use proptest::prelude::*;

fn store_with(ratings: &[(i64, i64)]) -> MemoryStore {
    let store = MemoryStore::with_tables(catalogue());
    let changes = ratings
        .iter()
        .enumerate()
        .map(|(i, (a, b))| {
            let id = i64::try_from(i).unwrap();
            Change::Insert(bson::doc! {
                "id": id, "title": format!("m{a}"), "rating": *a as f64, "vote_count": *b, "genres": "",
            })
        })
        .collect();
    store.commit("movie", changes).unwrap();
    store
}

fn sorted(store: &MemoryStore, tokens: &[&str]) -> Vec<bson::Document> {
    let query = tokens
        .iter()
        .map(|t| parse_sort(t).unwrap())
        .fold(Query::new("movie"), |q, s: SortExpression| q.order_by(s));
    store.fetch(&query, 0, None).unwrap()
}

proptest! {
    #[test]
    fn prop_multi_key_sort_non_decreasing(v in proptest::collection::vec((-50i64..50, -50i64..50), 0..60)) {
        let store = store_with(&v);
        let rows = sorted(&store, &["rating.asc", "vote_count.desc"]);
        prop_assert_eq!(rows.len(), v.len());
        for w in rows.windows(2) {
            let (r0, r1) = (w[0].get_f64("rating").unwrap(), w[1].get_f64("rating").unwrap());
            prop_assert!(r0 <= r1);
            if r0 == r1 {
                let (c0, c1) = (w[0].get_i64("vote_count").unwrap(), w[1].get_i64("vote_count").unwrap());
                prop_assert!(c0 >= c1);
                if c0 == c1 {
                    // insertion order breaks full ties
                    prop_assert!(w[0].get_i64("id").unwrap() < w[1].get_i64("id").unwrap());
                }
            }
        }
    }

    #[test]
    fn prop_desc_reverses_asc_without_ties(v in proptest::collection::hash_set(-1000i64..1000, 0..40)) {
        let pairs: Vec<(i64, i64)> = v.into_iter().map(|a| (a, 0)).collect();
        let store = store_with(&pairs);
        let asc: Vec<f64> = sorted(&store, &["rating.asc"]).iter().map(|d| d.get_f64("rating").unwrap()).collect();
        let mut desc: Vec<f64> = sorted(&store, &["rating.desc"]).iter().map(|d| d.get_f64("rating").unwrap()).collect();
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }
}
