use crate::error::Error;
use serde::{de::DeserializeOwned, Serialize};

pub const DOCUMENT_SEPARATOR: &str = "---";

/// Joins the objects into one multi-document YAML stream.
pub fn resources_to_string<T: Serialize>(resources: &[T]) -> Result<String, Error> {
    let docs = resources
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs.join(&format!("{}\n", DOCUMENT_SEPARATOR)))
}

/// Splits a multi-document YAML stream on separator lines and parses every
/// non-empty document. Content following the separator on the same line
/// starts the next document.
pub fn string_to_resources<T: DeserializeOwned>(manifest: &str) -> Result<Vec<T>, Error> {
    let mut docs: Vec<String> = vec![String::new()];
    for line in manifest.lines() {
        if let Some(rest) = separator_rest(line) {
            let mut doc = String::new();
            if !rest.is_empty() {
                doc.push_str(rest);
                doc.push('\n');
            }
            docs.push(doc);
        } else if let Some(doc) = docs.last_mut() {
            doc.push_str(line);
            doc.push('\n');
        }
    }
    docs.iter()
        .filter(|doc| !is_blank_document(doc))
        .map(|doc| serde_yaml::from_str(doc).map_err(Error::from))
        .collect()
}

/// A separator is `---`, optionally followed by more dashes or by whitespace
/// and inline content. Returns that inline content.
fn separator_rest(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(DOCUMENT_SEPARATOR)?;
    if rest.chars().all(|c| c == '-') {
        Some("")
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn is_blank_document(doc: &str) -> bool {
    doc.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}
