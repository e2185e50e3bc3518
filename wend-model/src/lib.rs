//! The grammar side of the validator: compiled RELAX NG patterns, name
//! classes, namespace resolution, datatype libraries, and the reader for
//! the compiled-schema JSON format.
//!
//! A [`model::Schema`] is produced once by [`loader`] and is immutable
//! afterwards; any number of validation sessions can walk it
//! concurrently.

pub mod datatype;
pub mod loader;
pub mod model;
pub mod regexp;
pub mod resolver;

pub use loader::{LoadedSchema, LoaderOptions, SchemaError, load_str, schema_from_str};
pub use model::{ExpandedName, NameClass, PatId, Pattern, Schema};
pub use resolver::{Resolver, ResolverError};
