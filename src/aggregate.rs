//! Tag vocabulary and frequency aggregation.
//!
//! Everything here is a pure function of a slice of records. Nothing is
//! maintained incrementally: callers rebuild the vocabulary and the
//! frequency table whenever the result set changes.

use std::collections::{HashMap, HashSet};

use crate::models::Record;

/// Returns the distinct tags across `records`.
///
/// Order is first occurrence: records in result-set order, then each
/// record's own tag order.
///
/// # Examples
///
/// ```
/// use tagscope::{Record, aggregate::vocabulary};
///
/// let records = vec![Record::new("A", ["x"]), Record::new("B", ["x", "y"])];
/// assert_eq!(vocabulary(&records), vec!["x", "y"]);
/// ```
pub fn vocabulary(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for tag in records.iter().flat_map(Record::predicted_tags) {
        if seen.insert(tag.as_str()) {
            tags.push(tag.clone());
        }
    }

    tags
}

/// Counts the records whose predicted tags contain `tag`.
///
/// A record that lists the same tag twice is counted once.
pub fn frequency(records: &[Record], tag: &str) -> usize {
    records.iter().filter(|record| record.has_tag(tag)).count()
}

/// Tag to record-count mapping, kept in vocabulary order.
///
/// The counts do not have to add up to the number of records: a record with
/// several tags contributes to several entries and an untagged record to none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    /// Builds the table from scratch for the given records.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagscope::{Record, aggregate::FrequencyTable};
    ///
    /// let records = vec![Record::new("A", ["x"]), Record::new("B", ["x", "y"])];
    /// let table = FrequencyTable::from_records(&records);
    ///
    /// assert_eq!(table.get("x"), Some(2));
    /// assert_eq!(table.get("y"), Some(1));
    /// assert_eq!(table.get("z"), None);
    /// ```
    pub fn from_records(records: &[Record]) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            // Each tag counts once per record even if listed twice
            let mut counted_here = HashSet::new();
            for tag in record.predicted_tags() {
                if !counted_here.insert(tag.as_str()) {
                    continue;
                }
                match index.get(tag) {
                    Some(&pos) => entries[pos].1 += 1,
                    None => {
                        index.insert(tag.clone(), entries.len());
                        entries.push((tag.clone(), 1));
                    }
                }
            }
        }

        Self { entries, index }
    }

    /// Returns the count for `tag`, or `None` if no record carries it.
    pub fn get(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).map(|&pos| self.entries[pos].1)
    }

    /// Iterates `(tag, count)` pairs in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(tag, count)| (tag.as_str(), *count))
    }

    /// Tags in vocabulary order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(tag, _)| tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest count in the table, zero when empty.
    pub fn max_count(&self) -> usize {
        self.entries.iter().map(|(_, count)| *count).max().unwrap_or(0)
    }
}
