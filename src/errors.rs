use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed filter expression: {0}")]
    MalformedFilterExpression(String),

    #[error("Malformed sort expression: {0}")]
    MalformedSortExpression(String),

    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("{entity} has no field '{field}'")]
    UnknownField { entity: &'static str, field: String },

    #[error("{0} not found")]
    ResourceNotFound(&'static str),

    #[error("{0} already exists")]
    ResourceAlreadyExists(&'static str),

    #[error("{message}")]
    InvalidParameter {
        message: String,
        #[source]
        source: Option<Box<ApiError>>,
    },

    #[error("Internal storage failure")]
    Internal(#[source] StoreError),
}

impl ApiError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter { message: message.into(), source: None }
    }

    /// Wraps a token-level failure so the whole request is rejected as a bad parameter.
    pub fn invalid_token(param: &str, token: &str, cause: ApiError) -> Self {
        Self::InvalidParameter {
            message: format!("invalid {param} parameter '{token}': {cause}"),
            source: Some(Box::new(cause)),
        }
    }

    /// Maps a storage failure for `entity`. Uniqueness violations, rows that
    /// vanished before the commit and rejected values are client-visible.
    pub fn from_store(entity: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => Self::ResourceAlreadyExists(entity),
            StoreError::RowNotFound(_) => Self::ResourceNotFound(entity),
            StoreError::InvalidValue { column, reason, .. } => {
                Self::invalid_parameter(format!("invalid value for '{column}': {reason}"))
            }
            other => Self::Internal(other),
        }
    }

    /// The wrapped token error of an `InvalidParameter`, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&ApiError> {
        match self {
            Self::InvalidParameter { source, .. } => source.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedFilterExpression(_) => ErrorKind::MalformedFilterExpression,
            Self::MalformedSortExpression(_) => ErrorKind::MalformedSortExpression,
            Self::UnknownOperator(_) => ErrorKind::UnknownOperator,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            Self::ResourceAlreadyExists(_) => ErrorKind::ResourceAlreadyExists,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.kind().status()
    }

    /// Message safe to hand back to a client. Storage details never leave the process.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => ErrorKind::Internal.description("").to_string(),
            other => other.to_string(),
        }
    }
}

/// Error classes as listed in endpoint documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    MalformedFilterExpression,
    MalformedSortExpression,
    UnknownOperator,
    UnknownField,
    ResourceNotFound,
    ResourceAlreadyExists,
    InvalidParameter,
    Internal,
}

impl ErrorKind {
    pub const ALL: [Self; 8] = [
        Self::MalformedFilterExpression,
        Self::MalformedSortExpression,
        Self::UnknownOperator,
        Self::UnknownField,
        Self::ResourceNotFound,
        Self::ResourceAlreadyExists,
        Self::InvalidParameter,
        Self::Internal,
    ];

    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::ResourceNotFound => 404,
            Self::Internal => 500,
            _ => 400,
        }
    }

    #[must_use]
    pub fn description(self, entity: &str) -> String {
        match self {
            Self::MalformedFilterExpression => {
                "Filter is not of the form operation(field, value)".to_string()
            }
            Self::MalformedSortExpression => "Sort is not of the form field.{asc|desc}".to_string(),
            Self::UnknownOperator => "Filter operation is not supported".to_string(),
            Self::UnknownField => format!("{entity} has no such field"),
            Self::ResourceNotFound => format!("{entity} not found"),
            Self::ResourceAlreadyExists => format!("{entity} already exists"),
            Self::InvalidParameter => "Invalid parameter".to_string(),
            Self::Internal => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_keeps_cause() {
        let err = ApiError::invalid_token(
            "sort",
            "title.up",
            ApiError::MalformedSortExpression("title.up".into()),
        );
        assert_eq!(err.status(), 400);
        assert!(matches!(err.cause(), Some(ApiError::MalformedSortExpression(_))));
        assert!(err.to_string().contains("title.up"));
    }

    #[test]
    fn unique_violation_maps_to_already_exists() {
        let err = ApiError::from_store(
            "Movie",
            StoreError::UniqueViolation { table: "movie".into(), columns: vec!["id".into()] },
        );
        assert!(matches!(err, ApiError::ResourceAlreadyExists("Movie")));
        assert_eq!(err.to_string(), "Movie already exists");
    }

    #[test]
    fn row_gone_at_commit_maps_to_not_found() {
        let err = ApiError::from_store("Movie", StoreError::RowNotFound("movie".into()));
        assert!(matches!(err, ApiError::ResourceNotFound("Movie")));
        assert_eq!(err.status(), 404);
        assert_eq!(err.client_message(), "Movie not found");
    }

    #[test]
    fn internal_errors_hide_storage_details() {
        let err = ApiError::from_store("Movie", StoreError::Io("disk on fire at /var/x".into()));
        assert_eq!(err.status(), 500);
        assert!(!err.client_message().contains("/var/x"));
    }
}
