//! Record view filtered by the selected tag.

use crate::models::{Record, TagFilter};

/// Returns the records visible under `filter`, in result-set order.
///
/// `TagFilter::All` returns every record. A tag returns only the records
/// carrying it; a tag that is not in the vocabulary (for example a selection
/// left over from a previous upload) yields an empty view.
///
/// # Examples
///
/// ```
/// use tagscope::{Record, TagFilter, filter::filter_records};
///
/// let records = vec![Record::new("A", ["x"]), Record::new("B", ["x", "y"])];
///
/// let only_y = filter_records(&records, &TagFilter::from_label("y"));
/// assert_eq!(only_y.len(), 1);
/// assert_eq!(only_y[0].abstract_text(), "B");
///
/// assert_eq!(filter_records(&records, &TagFilter::All).len(), 2);
/// ```
pub fn filter_records<'a>(records: &'a [Record], filter: &TagFilter) -> Vec<&'a Record> {
    match filter.tag() {
        None => records.iter().collect(),
        Some(tag) => records.iter().filter(|record| record.has_tag(tag)).collect(),
    }
}

/// Owned variant of [`filter_records`].
pub fn filtered_copy(records: &[Record], filter: &TagFilter) -> Vec<Record> {
    filter_records(records, filter).into_iter().cloned().collect()
}
