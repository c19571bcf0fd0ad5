use std::path::PathBuf;

pub enum Command {
    // Resource operations, dispatched through the api layer
    List {
        resource: String,
        page: Option<i64>,
        limit: Option<i64>,
        sort: Vec<String>,
        filter: Vec<String>,
    },
    Get {
        resource: String,
        id: String,
    },
    Create {
        resource: String,
        json: String,
    },
    Update {
        resource: String,
        id: String,
        json: String,
    },
    Delete {
        resource: String,
        id: String,
    },
    BrowseSection {
        id: String,
        page: Option<i64>,
        limit: Option<i64>,
        /// Replaces the section's stored sort when non-empty.
        sort: Vec<String>,
        /// Added to the section's stored filters.
        filter: Vec<String>,
    },
    // Introspection
    Operators,
    Docs,
    Metrics,
    // Data file management
    Init {
        data_path: PathBuf,
    },
}

impl Command {
    /// Whether the command may change stored data.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Create { .. } | Self::Update { .. } | Self::Delete { .. })
    }
}
