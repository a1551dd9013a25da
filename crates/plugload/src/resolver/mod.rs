//! Candidate name resolution.
//!
//! A [`NameResolver`] lists the names a source declares for a capability
//! without mapping any code. An empty set is a valid answer and means the
//! loader never opens a boundary for the source.

mod attribute;
mod descriptor;

use std::collections::BTreeSet;

use crate::error::LoadError;
use crate::scope::Source;

pub use self::attribute::ManifestAttributeResolver;
pub use self::descriptor::{OriginFilter, ServiceDescriptorResolver};

/// Lists the candidate names a source declares for a capability.
#[cfg_attr(test, mockall::automock)]
pub trait NameResolver {
    /// Returns the candidate names `source` declares for `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when the source cannot be
    /// read.
    fn resolve(&self, source: &Source, capability: &str) -> Result<BTreeSet<String>, LoadError>;
}
