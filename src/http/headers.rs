//! Case-insensitive, insertion-ordered header map
//!
//! Lookup ignores ASCII case while iteration yields names with the casing they
//! were last written with. A name never appears twice with different casing.

use indexmap::IndexMap;

/// Headers whose repeated occurrences are kept as separate ordered values
/// rather than folded to the last one.
pub const LIST_VALUED_HEADERS: &[&str] = &["set-cookie", "www-authenticate", "proxy-authenticate"];

/// Whether repeated occurrences of `name` must be preserved
pub fn is_list_valued(name: &str) -> bool {
    LIST_VALUED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Header mapping used by requests and responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, HeaderEntry>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to a single value, replacing any existing values
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        let entry = HeaderEntry {
            name,
            values: vec![value.into()],
        };
        self.entries.insert(key, entry);
    }

    /// Add a value to `name`, keeping existing ones
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.name = name;
                entry.values.push(value.into());
            }
            None => {
                self.entries.insert(
                    key,
                    HeaderEntry {
                        name,
                        values: vec![value.into()],
                    },
                );
            }
        }
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .and_then(|e| e.values.first())
            .map(String::as_str)
    }

    /// Every value for `name` in wire order
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|e| e.values.as_slice())
            .unwrap_or(&[])
    }

    /// All values for `name` joined with `", "`
    pub fn line(&self, name: &str) -> Option<String> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|e| e.values.join(", "))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries
            .shift_remove(&name.to_ascii_lowercase())
            .map(|e| e.values)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, values)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .values()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Iterate one `(name, value)` pair per stored value
    pub fn iter_flat(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name, v.as_str())))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
