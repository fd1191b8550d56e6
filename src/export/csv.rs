use crate::models::Record;

/// Header line of the exported CSV.
pub const HEADER: &str = "Abstract,Predicted Tags";

/// Serializes records into CSV text.
///
/// The first line is [`HEADER`]; each record becomes
/// `"<abstract>","<tags joined by ", ">"` with embedded double quotes doubled.
/// Lines are joined with `\n` and there is no trailing newline.
///
/// # Examples
///
/// ```
/// use tagscope::{Record, export::csv::serialize};
///
/// let records = vec![Record::new(r#"He said "hi""#, ["ml", "nlp"])];
/// assert_eq!(
///     serialize(&records),
///     "Abstract,Predicted Tags\n\"He said \"\"hi\"\"\",\"ml, nlp\""
/// );
/// ```
pub fn serialize(records: &[Record]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(HEADER.to_string());

    for record in records {
        lines.push(format!(
            "{},{}",
            quote(record.abstract_text()),
            quote(&record.joined_tags())
        ));
    }

    lines.join("\n")
}

/// Wraps a field in double quotes, doubling any quote inside it.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
