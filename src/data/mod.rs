//! Where model artifacts and reference inputs come from.
//!
//! - `source`: the `ArtifactSource` trait plus local and cached sources
//! - `remote`: HTTP download with timeout and bounded retries
//! - `sample`: a reference sensor record

pub mod remote;
pub mod sample;
pub mod source;

pub use remote::RemoteSource;
pub use sample::sample_record;
pub use source::{ArtifactSource, CachedSource, FetchError, LocalDir};
