pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod matcher;
pub mod scope;
pub mod error;

pub use types::*;
pub use error::FilterError;
pub use filter::Filter;
pub use matcher::FilterMatcher;
pub use scope::{scope, EntityKind};
