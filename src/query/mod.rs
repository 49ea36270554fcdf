//! Generic query and grouping engine.
//!
//! Templates filter and regroup collections of records with string key-paths,
//! without the engine knowing the records' concrete shape:
//!
//! - [`value`]: key-path resolution over any [`Record`]
//! - [`collection`]: normalizing template inputs into indexable views
//! - [`group`]: `groupBy` and its variants
//! - [`filter`]: `where` and its variants
//! - [`labels`]: label predicates for records that are [`Labeled`]
//!
//! All operations are pure; they borrow from the source collection and never
//! modify it.

pub mod collection;
pub mod error;
pub mod filter;
pub mod group;
pub mod labels;
pub mod value;

pub use collection::*;
pub use error::{QueryError, Result};
pub use filter::*;
pub use group::*;
pub use labels::*;
pub use value::*;
