use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::schema::TableSpec;
use crate::query::{Direction, Predicate, SortExpression};

/// True when `row` satisfies every predicate (logical AND).
pub fn matches(spec: &TableSpec, row: &BsonDocument, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| eval_predicate(spec, row, p))
}

pub fn eval_predicate(spec: &TableSpec, row: &BsonDocument, predicate: &Predicate) -> bool {
    let Some(column) = spec.column(predicate.field()) else {
        return false;
    };
    let value = row.get(column.name).unwrap_or(&Bson::Null);
    if matches!(value, Bson::Null) {
        return false;
    }
    match predicate {
        Predicate::Eq { literal, .. } => column
            .kind
            .parse_literal(literal)
            .is_some_and(|lit| compare_bson(value, &lit) == Ordering::Equal),
        Predicate::Like { pattern, .. } => {
            column.kind.render(value).is_some_and(|text| pattern.matches(&text))
        }
        Predicate::In { literals, .. } => literals
            .iter()
            .filter_map(|l| column.kind.parse_literal(l))
            .any(|lit| compare_bson(value, &lit) == Ordering::Equal),
    }
}

/// Chained ORDER BY: later terms only break ties left by earlier ones.
pub fn compare_rows(a: &BsonDocument, b: &BsonDocument, order: &[SortExpression]) -> Ordering {
    for s in order {
        let va = a.get(&s.field).unwrap_or(&Bson::Null);
        let vb = b.get(&s.field).unwrap_or(&Bson::Null);
        let ord = compare_bson(va, vb);
        if ord != Ordering::Equal {
            return match s.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    #[allow(clippy::cast_precision_loss)]
    fn as_f64_num(x: &T) -> Option<f64> {
        match x {
            T::Int32(i) => Some(f64::from(*i)),
            T::Int64(i) => Some(*i as f64),
            T::Double(f) => Some(*f),
            _ => None,
        }
    }
    match (a, b) {
        (T::Int64(x), T::Int64(y)) => x.cmp(y),
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        _ => match (as_f64_num(a), as_f64_num(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

// NULL sorts before everything, so ascending order puts missing values first.
fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::Null => 0,
        T::Boolean(_) => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) => 2,
        T::String(_) => 3,
        _ => 4,
    }
}
