use serde::{Deserialize, Serialize};

/// One uploaded abstract together with the tags the service predicted for it.
///
/// Field names on the wire are `ABSTRACT` and `Predicted_Tags`; the serde
/// renames keep the JSON contract with the prediction service intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ABSTRACT")]
    abstract_text: String,
    #[serde(rename = "Predicted_Tags")]
    predicted_tags: Vec<String>,
}

impl Record {
    /// Creates a record from an abstract and its predicted tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagscope::Record;
    ///
    /// let record = Record::new("Deep nets", ["ml", "cv"]);
    /// assert_eq!(record.abstract_text(), "Deep nets");
    /// assert_eq!(record.predicted_tags(), &["ml", "cv"]);
    /// ```
    pub fn new<I, S>(abstract_text: impl Into<String>, predicted_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            abstract_text: abstract_text.into(),
            predicted_tags: predicted_tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the abstract text exactly as the service echoed it back.
    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    /// Returns the predicted tags in the order the service listed them.
    pub fn predicted_tags(&self) -> &[String] {
        &self.predicted_tags
    }

    /// Returns true if `tag` is one of this record's predicted tags.
    ///
    /// Matching is exact: case-sensitive and without trimming.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.predicted_tags.iter().any(|t| t == tag)
    }

    /// Tags joined the way the record table and CSV export display them.
    pub fn joined_tags(&self) -> String {
        self.predicted_tags.join(", ")
    }
}

/// The full ordered collection of records for the current session.
///
/// Deserializes directly from the JSON array returned by the prediction
/// service. A result set is never edited; a new upload replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records in upload order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct tags in first-occurrence order.
    pub fn vocabulary(&self) -> Vec<String> {
        crate::aggregate::vocabulary(&self.records)
    }

    /// Per-tag record counts, rebuilt from the current records.
    pub fn frequency_table(&self) -> crate::aggregate::FrequencyTable {
        crate::aggregate::FrequencyTable::from_records(&self.records)
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for ResultSet {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_from_wire_field_names() {
        let json = r#"{"ABSTRACT": "Graph methods", "Predicted_Tags": ["cs", "math"]}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.abstract_text(), "Graph methods");
        assert_eq!(record.predicted_tags(), &["cs", "math"]);
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let record = Record::new("A", ["x"]);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["ABSTRACT"], "A");
        assert_eq!(json["Predicted_Tags"][0], "x");
    }

    #[test]
    fn record_missing_tags_field_is_rejected() {
        let json = r#"{"ABSTRACT": "no tags field"}"#;
        let result: Result<Record, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }

    #[test]
    fn has_tag_is_exact_and_case_sensitive() {
        let record = Record::new("A", ["Physics", "math "]);

        assert!(record.has_tag("Physics"));
        assert!(!record.has_tag("physics"));
        assert!(!record.has_tag("math"));
        assert!(record.has_tag("math "));
    }

    #[test]
    fn joined_tags_uses_comma_space() {
        let record = Record::new("A", ["ml", "nlp", "cv"]);
        assert_eq!(record.joined_tags(), "ml, nlp, cv");

        let untagged = Record::new("B", Vec::<String>::new());
        assert_eq!(untagged.joined_tags(), "");
    }

    #[test]
    fn result_set_deserializes_from_json_array() {
        let json = r#"[
            {"ABSTRACT": "A", "Predicted_Tags": ["x"]},
            {"ABSTRACT": "B", "Predicted_Tags": ["x", "y"]}
        ]"#;
        let results: ResultSet = serde_json::from_str(json).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.records()[1].abstract_text(), "B");
        assert_eq!(results.vocabulary(), vec!["x", "y"]);
    }

    #[test]
    fn result_set_rejects_non_array_payload() {
        let json = r#"{"error": "CSV must contain an 'ABSTRACT' column"}"#;
        let result: Result<ResultSet, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }
}
