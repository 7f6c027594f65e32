//! Citation metadata lookup against the OpenAlex works endpoint.
//!
//! [`CitationResolver`] does single lookups with a shared cache; the
//! [`worker`] module runs batches on a background thread for the viewer.

pub mod cache;
pub mod query;
pub mod resolver;
pub mod source;
pub mod worker;

pub use cache::CitationCache;
pub use query::{QueryForm, OPENALEX_BASE};
pub use resolver::{CitationResolver, DEFAULT_CONCURRENCY};
pub use source::{FetchError, HttpWorkSource, WorkSource};
pub use worker::{spawn_resolver, ResolverHandle};
