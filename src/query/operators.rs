//! Filter operator registry.
//!
//! A fixed dispatch table from operator name to a tagged predicate builder and
//! the description used in API docs. Built once on first use, never mutated.

use crate::errors::ApiError;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::types::{Anchor, LikePattern, MAX_IN_SET, Predicate};

/// Predicate constructor selected by an operator name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Exact,
    Like(Anchor),
    AnyOf,
}

impl OperatorKind {
    /// Applies the builder to a field, then to an operand.
    ///
    /// # Errors
    /// `MalformedFilterExpression` when an `anyOf` operand is not a `[a|b|...]` list.
    pub fn build(self, field: &str, operand: &str) -> Result<Predicate, ApiError> {
        let field = field.to_string();
        Ok(match self {
            Self::Exact => Predicate::Eq { field, literal: operand.to_string() },
            Self::Like(anchor) => Predicate::Like { field, pattern: LikePattern::new(anchor, operand) },
            Self::AnyOf => {
                let inner = operand
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .ok_or_else(|| ApiError::MalformedFilterExpression(operand.to_string()))?;
                let literals: Vec<String> = inner.split('|').map(str::to_string).collect();
                if literals.len() > MAX_IN_SET {
                    return Err(ApiError::invalid_parameter(format!(
                        "anyOf accepts at most {MAX_IN_SET} values"
                    )));
                }
                Predicate::In { field, literals }
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct OperatorDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OperatorKind,
}

#[derive(Debug)]
pub struct OperatorRegistry {
    ordered: Vec<OperatorDescriptor>,
    by_name: HashMap<&'static str, usize>,
}

impl OperatorRegistry {
    fn with_defaults() -> Self {
        let ordered = vec![
            OperatorDescriptor {
                name: "exact",
                description: "Matches the exact value. Equivalent to <field = 'value'>",
                kind: OperatorKind::Exact,
            },
            OperatorDescriptor {
                name: "partial",
                description: "Matches the value as contained in the field. Equivalent to <field LIKE '%value%'>",
                kind: OperatorKind::Like(Anchor::Contains),
            },
            OperatorDescriptor {
                name: "start",
                description: "Matches the value as start of field. Equivalent to <field LIKE 'value%'>",
                kind: OperatorKind::Like(Anchor::Prefix),
            },
            OperatorDescriptor {
                name: "end",
                description: "Matches the value as end of field. Equivalent to <field LIKE '%value'>",
                kind: OperatorKind::Like(Anchor::Suffix),
            },
            OperatorDescriptor {
                name: "word_start",
                description: "Matches the start of any word in the field. Equivalent to <field LIKE '% value%'>",
                kind: OperatorKind::Like(Anchor::WordPrefix),
            },
            OperatorDescriptor {
                name: "anyOf",
                description: "Matches any field whose value is in the given set. Equivalent to \
                              <field IN (value1, value2, ...)>.<br>Value format should be a list of \
                              values separated by pipe symbol (e.g. anyOf(genre, [drama|romantic|action]))",
                kind: OperatorKind::AnyOf,
            },
            OperatorDescriptor {
                name: "in",
                description: "Same as anyOf (e.g. in(genre, [drama|romantic|action]))",
                kind: OperatorKind::AnyOf,
            },
        ];
        let by_name = ordered.iter().enumerate().map(|(i, d)| (d.name, i)).collect();
        Self { ordered, by_name }
    }

    /// # Errors
    /// `UnknownOperator` when `name` is not registered.
    pub fn get(&self, name: &str) -> Result<&OperatorDescriptor, ApiError> {
        self.by_name
            .get(name)
            .map(|&i| &self.ordered[i])
            .ok_or_else(|| ApiError::UnknownOperator(name.to_string()))
    }

    /// Descriptors in documentation order.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorDescriptor> {
        self.ordered.iter()
    }

    /// `(operator, description)` pairs in documentation order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<(&'static str, &'static str)> {
        self.ordered.iter().map(|d| (d.name, d.description)).collect()
    }

    /// Help text for the `filter` query parameter.
    #[must_use]
    pub fn docs(&self) -> String {
        let body: Vec<String> =
            self.ordered.iter().map(|d| format!("<br>**-{}**: {}", d.name, d.description)).collect();
        format!(
            "Filter data. Input format: operation(field, value). Available operations: <br>{}",
            body.join("\n")
        )
    }
}

static OPERATORS: LazyLock<OperatorRegistry> = LazyLock::new(OperatorRegistry::with_defaults);

/// The process-wide operator table.
pub fn registry() -> &'static OperatorRegistry {
    &OPERATORS
}
