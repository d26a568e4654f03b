//! Ordered collections of data sources and their query API.
//!
//! A [`DataSourceCollection`] is built once per run from everything the
//! resolver produced. Duplicate names may coexist; only the exact lookup
//! [`get`](DataSourceCollection::get) insists on uniqueness. Members are
//! shared, so sub-collections returned by [`find`](DataSourceCollection::find),
//! [`filter`](DataSourceCollection::filter) and
//! [`group_by`](DataSourceCollection::group_by) refer to the same data sources
//! as the collection they came from.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{DataSource, METADATA_KEYS};
use crate::core::{DataSourceError, Result};
use crate::pattern::WildcardFilter;

/// An ordered sequence of data sources.
#[derive(Debug, Default, Clone)]
pub struct DataSourceCollection {
    data_sources: Vec<Arc<DataSource>>,
}

impl DataSourceCollection {
    pub fn new(data_sources: Vec<Arc<DataSource>>) -> Self {
        Self {
            data_sources,
        }
    }

    pub fn len(&self) -> usize {
        self.data_sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DataSource>> {
        self.data_sources.iter()
    }

    /// Appends a data source, keeping insertion order.
    pub fn push(&mut self, data_source: impl Into<Arc<DataSource>>) {
        self.data_sources.push(data_source.into());
    }

    /// Names in collection order, duplicates included.
    pub fn names(&self) -> Vec<&str> {
        self.data_sources.iter().map(|ds| ds.name()).collect()
    }

    /// Distinct groups, sorted.
    pub fn groups(&self) -> Vec<&str> {
        self.data_sources
            .iter()
            .map(|ds| ds.group())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The single data source called exactly `name`.
    ///
    /// # Errors
    ///
    /// - [`DataSourceError::NotFound`] if no data source has that name
    /// - [`DataSourceError::AmbiguousName`] if more than one does
    pub fn get(&self, name: &str) -> Result<Arc<DataSource>> {
        let mut matches = self.data_sources.iter().filter(|ds| ds.name() == name);
        let first = matches.next().ok_or_else(|| DataSourceError::NotFound {
            name: name.to_string(),
        })?;

        let others = matches.count();
        if others > 0 {
            return Err(DataSourceError::AmbiguousName {
                name: name.to_string(),
                count: others + 1,
            });
        }

        Ok(Arc::clone(first))
    }

    /// Returns true if at least one data source is called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.data_sources.iter().any(|ds| ds.name() == name)
    }

    /// Data sources whose name matches `pattern`; a leading `!` inverts it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tmplgen_cli::datasource::{DataSource, DataSourceCollection};
    ///
    /// let mut collection = DataSourceCollection::default();
    /// collection.push(DataSource::from_string("pom.xml", "<project/>"));
    /// collection.push(DataSource::from_string("README.md", "# readme"));
    /// collection.push(DataSource::from_string("notes.txt", "notes"));
    ///
    /// let others = collection.find("!pom.xml")?;
    /// assert_eq!(others.names(), vec!["README.md", "notes.txt"]);
    /// # Ok::<(), tmplgen_cli::core::DataSourceError>(())
    /// ```
    pub fn find(&self, pattern: &str) -> Result<Self> {
        let filter = WildcardFilter::new(pattern)?;
        Ok(self.select(|ds| filter.accepts(ds.name())))
    }

    /// Data sources whose metadata `key` matches `pattern`; a leading `!`
    /// inverts it.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::UnknownMetadataKey`] if `key` is not a
    /// metadata key.
    pub fn filter(&self, key: &str, pattern: &str) -> Result<Self> {
        check_metadata_key(key)?;
        let filter = WildcardFilter::new(pattern)?;
        Ok(self.select(|ds| ds.metadata(key).is_some_and(|value| filter.accepts(&value))))
    }

    /// Data sources in `group`.
    pub fn by_group(&self, group: &str) -> Self {
        self.select(|ds| ds.group() == group)
    }

    /// Partitions the collection by the value of metadata `key`.
    ///
    /// Keys of the map are sorted; within each partition the collection order
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::UnknownMetadataKey`] if `key` is not a
    /// metadata key.
    pub fn group_by(&self, key: &str) -> Result<BTreeMap<String, Self>> {
        check_metadata_key(key)?;
        let mut partitions: BTreeMap<String, Self> = BTreeMap::new();
        for data_source in &self.data_sources {
            let value = data_source.metadata(key).unwrap_or_default();
            partitions.entry(value).or_default().data_sources.push(Arc::clone(data_source));
        }
        Ok(partitions)
    }

    fn select(&self, predicate: impl Fn(&DataSource) -> bool) -> Self {
        Self {
            data_sources: self.data_sources.iter().filter(|ds| predicate(ds)).cloned().collect(),
        }
    }

    /// Closes every member.
    ///
    /// A member that fails to close does not stop the others from closing;
    /// the first failure is returned once all members have been visited.
    pub fn close(&self) -> Result<()> {
        debug!("Closing {} data source(s)", self.data_sources.len());
        let mut first_error = None;
        for data_source in &self.data_sources {
            if let Err(e) = data_source.close() {
                warn!("Failed to close data source '{}': {}", data_source.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl FromIterator<DataSource> for DataSourceCollection {
    fn from_iter<I: IntoIterator<Item = DataSource>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Arc::new).collect())
    }
}

impl FromIterator<Arc<DataSource>> for DataSourceCollection {
    fn from_iter<I: IntoIterator<Item = Arc<DataSource>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DataSourceCollection {
    type Item = &'a Arc<DataSource>;
    type IntoIter = std::slice::Iter<'a, Arc<DataSource>>;

    fn into_iter(self) -> Self::IntoIter {
        self.data_sources.iter()
    }
}

fn check_metadata_key(key: &str) -> Result<()> {
    if METADATA_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(DataSourceError::UnknownMetadataKey {
            key: key.to_string(),
        })
    }
}
