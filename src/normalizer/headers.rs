//! Header block normalization

use super::parser;
use crate::errors::Result;
use crate::http::{is_list_valued, Headers};

/// Add one wire header to `headers`
///
/// List-valued headers keep every occurrence in wire order; any other
/// repeated name keeps its last value.
pub fn fold(headers: &mut Headers, name: &str, value: &str) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let value = value.trim();
    if is_list_valued(name) {
        headers.append(name, value);
    } else {
        headers.insert(name, value);
    }
}

/// Build the header mapping of the final group of a raw header block
pub fn normalize(head: &str) -> Result<Headers> {
    let (_, lines) = parser::final_group(head)?;
    let mut headers = Headers::new();

    for line in lines {
        // Lines without a colon are not headers; skip them
        if let Some((name, value)) = line.split_once(':') {
            fold(&mut headers, name, value);
        }
    }

    Ok(headers)
}
