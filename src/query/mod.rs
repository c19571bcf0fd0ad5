// Telemetry is a submodule of query
pub mod telemetry;

// Submodules for separation of concerns
mod builder;
mod operators;
mod paginate;
mod parse;
mod types;

pub use builder::{build_query, resolve_filter, resolve_sort};
pub use operators::{OperatorDescriptor, OperatorKind, OperatorRegistry, registry};
pub use paginate::{Page, paginate, total_pages};
pub use parse::{parse_filter, parse_sort};
pub use types::{Anchor, Direction, FilterExpression, LikePattern, Predicate, Query, SortExpression};
