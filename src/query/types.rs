use serde::{Deserialize, Serialize};
use std::fmt;

// Safety limits to keep a single request bounded
pub(crate) const MAX_FILTERS: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;

/// One parsed `operator(field, value)` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression {
    pub operator: String,
    pub field: String,
    pub operand: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One parsed `field.direction` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortExpression {
    pub field: String,
    pub direction: Direction,
}

impl SortExpression {
    /// Ordering clause in the form the storage layer expects (`field asc`).
    #[must_use]
    pub fn to_order_clause(&self) -> String {
        format!("{} {}", self.field, self.direction.as_str())
    }
}

/// Where a LIKE needle is allowed to sit inside the field text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Contains,
    Prefix,
    Suffix,
    WordPrefix,
}

/// A LIKE-style pattern whose needle is always literal: `%` and `_` in the
/// operand carry no wildcard meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern {
    pub anchor: Anchor,
    pub needle: String,
}

impl LikePattern {
    #[must_use]
    pub fn new(anchor: Anchor, needle: impl Into<String>) -> Self {
        Self { anchor, needle: needle.into() }
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let needle = self.needle.as_str();
        match self.anchor {
            Anchor::Contains => text.contains(needle),
            Anchor::Prefix => text.starts_with(needle),
            Anchor::Suffix => text.ends_with(needle),
            Anchor::WordPrefix => text.match_indices(needle).any(|(at, _)| {
                at == 0 || text[..at].chars().next_back().is_some_and(char::is_whitespace)
            }),
        }
    }
}

impl fmt::Display for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let needle = escape_like(&self.needle);
        match self.anchor {
            Anchor::Contains => write!(f, "'%{needle}%'"),
            Anchor::Prefix => write!(f, "'{needle}%'"),
            Anchor::Suffix => write!(f, "'%{needle}'"),
            Anchor::WordPrefix => write!(f, "'% {needle}%'"),
        }
    }
}

/// A boolean condition over one field. Literals stay strings; the storage
/// layer binds them against the column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq { field: String, literal: String },
    Like { field: String, pattern: LikePattern },
    In { field: String, literals: Vec<String> },
}

impl Predicate {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. } | Self::Like { field, .. } | Self::In { field, .. } => field,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { field, literal } => write!(f, "{field} = {}", quote(literal)),
            Self::Like { field, pattern } => write!(f, "{field} LIKE {pattern}"),
            Self::In { field, literals } => {
                let list: Vec<String> = literals.iter().map(|l| quote(l)).collect();
                write!(f, "{field} IN ({})", list.join(", "))
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_").replace('\'', "''")
}

/// A deferred query: nothing touches storage until a store is asked to
/// count or fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub predicates: Vec<Predicate>,
    pub order: Vec<SortExpression>,
}

impl Query {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), predicates: Vec::new(), order: Vec::new() }
    }

    /// ANDs another predicate onto the query.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Appends an ORDER BY term; earlier terms take precedence.
    #[must_use]
    pub fn order_by(mut self, sort: SortExpression) -> Self {
        self.order.push(sort);
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {}", self.table)?;
        if !self.predicates.is_empty() {
            let conds: Vec<String> = self.predicates.iter().map(ToString::to_string).collect();
            write!(f, " WHERE {}", conds.join(" AND "))?;
        }
        if !self.order.is_empty() {
            let terms: Vec<String> = self.order.iter().map(SortExpression::to_order_clause).collect();
            write!(f, " ORDER BY {}", terms.join(", "))?;
        }
        Ok(())
    }
}
