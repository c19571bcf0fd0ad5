use crate::errors::ApiError;

use super::types::{Direction, FilterExpression, SortExpression};

/// Parses one `operator(field, value)` token.
///
/// Only the trailing `)` is stripped, so operands may themselves contain
/// parentheses: `exact(title, Alien (1979))` yields the operand `Alien (1979)`.
///
/// # Errors
/// `MalformedFilterExpression` when the `(`, the `, ` separator or the closing
/// `)` is missing, or when the operator or field is empty.
pub fn parse_filter(token: &str) -> Result<FilterExpression, ApiError> {
    let malformed = || ApiError::MalformedFilterExpression(token.to_string());
    let (operator, rest) = token.split_once('(').ok_or_else(malformed)?;
    let (field, rest) = rest.split_once(", ").ok_or_else(malformed)?;
    let operand = rest.strip_suffix(')').ok_or_else(malformed)?;
    if operator.is_empty() || field.is_empty() {
        return Err(malformed());
    }
    Ok(FilterExpression {
        operator: operator.to_string(),
        field: field.to_string(),
        operand: operand.to_string(),
    })
}

/// Parses one `field.direction` token, `direction` being `asc` or `desc`.
///
/// # Errors
/// `MalformedSortExpression` unless the token splits on `.` into exactly a
/// non-empty field and a valid direction.
pub fn parse_sort(token: &str) -> Result<SortExpression, ApiError> {
    let malformed = || ApiError::MalformedSortExpression(token.to_string());
    let mut parts = token.split('.');
    let (Some(field), Some(direction), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let direction = match direction {
        "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        _ => return Err(malformed()),
    };
    if field.is_empty() {
        return Err(malformed());
    }
    Ok(SortExpression { field: field.to_string(), direction })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_token_splits_into_parts() {
        let f = parse_filter("exact(title, Matrix)").unwrap();
        assert_eq!(f.operator, "exact");
        assert_eq!(f.field, "title");
        assert_eq!(f.operand, "Matrix");
    }

    #[test]
    fn filter_operand_keeps_inner_parentheses_and_separators() {
        let f = parse_filter("partial(title, Alien (1979), director's cut)").unwrap();
        assert_eq!(f.field, "title");
        assert_eq!(f.operand, "Alien (1979), director's cut");
    }

    #[test]
    fn filter_operand_may_be_empty() {
        let f = parse_filter("exact(poster_path, )").unwrap();
        assert_eq!(f.operand, "");
    }

    #[test]
    fn malformed_filters_are_rejected() {
        for token in [
            "exact",
            "exact title, Matrix)",
            "exact(title,Matrix)",
            "exact(title, Matrix",
            "exact(title, Matrix) ",
            "(title, Matrix)",
            "exact(, Matrix)",
        ] {
            let err = parse_filter(token).unwrap_err();
            assert!(
                matches!(err, ApiError::MalformedFilterExpression(ref t) if t == token),
                "token {token:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn sort_tokens_parse_both_directions() {
        let s = parse_sort("rating.desc").unwrap();
        assert_eq!(s.field, "rating");
        assert_eq!(s.direction, Direction::Desc);
        assert_eq!(s.to_order_clause(), "rating desc");
        assert_eq!(parse_sort("title.asc").unwrap().direction, Direction::Asc);
    }

    #[test]
    fn malformed_sorts_are_rejected() {
        for token in ["title", "title.up", "title.ASC", "a.b.asc", ".asc", "title."] {
            assert!(
                matches!(parse_sort(token), Err(ApiError::MalformedSortExpression(_))),
                "token {token:?}"
            );
        }
    }
}
