use crate::errors::ApiError;
use crate::query::Predicate;

/// A resource identifier resolved against an id-field spec.
///
/// `3_7` against `["user", "movie"]` becomes `[("user", "3"), ("movie", "7")]`.
/// A single-field spec takes the whole id verbatim; otherwise the id is split
/// into at most as many parts as there are fields, so only the last component
/// may contain `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundKey {
    parts: Vec<(&'static str, String)>,
}

impl CompoundKey {
    /// # Errors
    /// `InvalidParameter` when the number of components does not match `fields`.
    pub fn parse(fields: &'static [&'static str], id: &str) -> Result<Self, ApiError> {
        let parts: Vec<(&'static str, String)> = match fields {
            [single] => vec![(*single, id.to_string())],
            _ => {
                let values: Vec<&str> = id.splitn(fields.len(), '_').collect();
                if values.len() != fields.len() {
                    return Err(ApiError::invalid_parameter(format!(
                        "identifier '{id}' does not match '{}'",
                        fields.join("_")
                    )));
                }
                fields.iter().copied().zip(values.into_iter().map(str::to_string)).collect()
            }
        };
        Ok(Self { parts })
    }

    #[must_use]
    pub fn parts(&self) -> &[(&'static str, String)] {
        &self.parts
    }

    /// Equality predicates selecting the identified row.
    #[must_use]
    pub fn predicates(&self) -> Vec<Predicate> {
        self.parts
            .iter()
            .map(|(field, literal)| Predicate::Eq { field: (*field).to_string(), literal: literal.clone() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_field_takes_whole_id() {
        let k = CompoundKey::parse(&["id"], "Science_Fiction").unwrap();
        assert_eq!(k.parts(), &[("id", "Science_Fiction".to_string())]);
    }

    #[test]
    fn compound_id_zips_components() {
        let k = CompoundKey::parse(&["user", "movie"], "3_7").unwrap();
        assert_eq!(k.parts(), &[("user", "3".to_string()), ("movie", "7".to_string())]);
        assert_eq!(k.predicates().len(), 2);
    }

    #[test]
    fn last_component_keeps_underscores() {
        let k = CompoundKey::parse(&["user", "movie", "name"], "1_2_based_on_book").unwrap();
        assert_eq!(k.parts()[2], ("name", "based_on_book".to_string()));
    }

    #[test]
    fn too_few_components_is_invalid() {
        let err = CompoundKey::parse(&["user", "movie"], "3").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { .. }));
    }
}
