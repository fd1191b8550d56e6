use std::fmt;

/// Label of the catch-all filter entry.
pub const ALL_TAGS: &str = "All";

/// The tag selection applied to the record view.
///
/// Either the `All` sentinel or a single tag. A selection is never reset
/// automatically; if a new result set no longer contains the tag, the
/// filtered view is simply empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagFilter {
    /// Show every record.
    #[default]
    All,
    /// Show only records carrying this tag.
    Tag(String),
}

impl TagFilter {
    /// Builds a filter from a user-facing label.
    ///
    /// The literal `All` always maps to the sentinel, mirroring the filter
    /// dropdown where `All` is the first option.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagscope::TagFilter;
    ///
    /// assert_eq!(TagFilter::from_label("All"), TagFilter::All);
    /// assert_eq!(TagFilter::from_label("nlp"), TagFilter::Tag("nlp".to_string()));
    /// ```
    pub fn from_label(label: &str) -> Self {
        if label == ALL_TAGS {
            Self::All
        } else {
            Self::Tag(label.to_string())
        }
    }

    /// Returns the selected tag, or `None` for `All`.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Tag(tag) => Some(tag),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{ALL_TAGS}"),
            Self::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

impl From<&str> for TagFilter {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_all() {
        assert_eq!(TagFilter::default(), TagFilter::All);
        assert!(TagFilter::default().is_all());
    }

    #[test]
    fn tag_returns_selected_tag() {
        assert_eq!(TagFilter::All.tag(), None);
        assert_eq!(TagFilter::Tag("cs".into()).tag(), Some("cs"));
    }

    #[test]
    fn display_round_trips_through_from_label() {
        for filter in [TagFilter::All, TagFilter::Tag("Statistics".into())] {
            assert_eq!(TagFilter::from_label(&filter.to_string()), filter);
        }
    }

    #[test]
    fn from_label_does_not_trim_or_fold_case() {
        assert_eq!(TagFilter::from("all"), TagFilter::Tag("all".into()));
        assert_eq!(TagFilter::from(" All"), TagFilter::Tag(" All".into()));
    }
}
