//! Load results.
//!
//! A [`LoadResult`] is an ordered list of records, one per candidate (and,
//! for folder scans, one per unreadable archive), plus the boundaries the
//! instances were created through. Dropping the result releases those
//! boundaries; [`LoadResult::into_parts`] hands them to the caller instead.

use crate::boundary::Boundary;
use crate::error::PluginFailure;
use crate::plugin::Plugin;

/// Outcome for one candidate.
#[derive(Debug)]
pub enum PluginRecord<T> {
    /// The candidate produced an instance.
    Instance(Plugin<T>),
    /// The candidate failed.
    Failure(PluginFailure),
}

impl<T> PluginRecord<T> {
    /// Returns the instance, if any.
    #[must_use]
    pub const fn instance(&self) -> Option<&Plugin<T>> {
        match self {
            Self::Instance(plugin) => Some(plugin),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&PluginFailure> {
        match self {
            Self::Instance(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Records and boundaries produced by one load or scan.
#[derive(Debug)]
pub struct LoadResult<T> {
    records: Vec<PluginRecord<T>>,
    boundaries: Vec<Boundary>,
}

impl<T> Default for LoadResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            boundaries: Vec::new(),
        }
    }
}

impl<T> LoadResult<T> {
    /// Creates an empty result owning no boundary.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_boundary(records: Vec<PluginRecord<T>>, boundary: Boundary) -> Self {
        Self {
            records,
            boundaries: vec![boundary],
        }
    }

    /// All records, in candidate order.
    #[must_use]
    pub fn records(&self) -> &[PluginRecord<T>] {
        &self.records
    }

    /// Successfully created instances.
    pub fn instances(&self) -> impl Iterator<Item = &Plugin<T>> {
        self.records.iter().filter_map(PluginRecord::instance)
    }

    /// Successfully created instances, mutably.
    pub fn instances_mut(&mut self) -> impl Iterator<Item = &mut Plugin<T>> {
        self.records.iter_mut().filter_map(|record| match record {
            PluginRecord::Instance(plugin) => Some(plugin),
            PluginRecord::Failure(_) => None,
        })
    }

    /// Recorded failures.
    pub fn failures(&self) -> impl Iterator<Item = &PluginFailure> {
        self.records.iter().filter_map(PluginRecord::failure)
    }

    /// Number of instances.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.instances().count()
    }

    /// Number of failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Returns `true` when there are no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Boundaries owned by this result.
    #[must_use]
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Appends a host-provided instance that belongs to no boundary.
    pub fn add_instance(&mut self, name: impl Into<String>, instance: T) {
        self.records
            .push(PluginRecord::Instance(Plugin::unbound(name, instance)));
    }

    pub(crate) fn push_failure(&mut self, failure: PluginFailure) {
        self.records.push(PluginRecord::Failure(failure));
    }

    /// Moves the records and boundaries of `other` into this result.
    pub fn merge(&mut self, other: Self) {
        let (records, boundaries) = other.into_parts();
        self.records.extend(records);
        self.boundaries.extend(boundaries);
    }

    /// Splits the result into its records and boundaries.
    ///
    /// The caller becomes responsible for releasing the boundaries.
    #[must_use]
    pub fn into_parts(self) -> (Vec<PluginRecord<T>>, Vec<Boundary>) {
        (self.records, self.boundaries)
    }

    /// Releases every owned boundary.
    ///
    /// Instances created through them report [`StaleHandle`] afterwards;
    /// host-provided instances stay usable.
    ///
    /// [`StaleHandle`]: crate::StaleHandle
    pub fn release(&mut self) {
        for boundary in &mut self.boundaries {
            boundary.release();
        }
    }
}
