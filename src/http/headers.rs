//! HTTP headers shared by [`Request`](crate::http::request::Request),
//! [`Response`](crate::http::response::Response) and interpreter output.
//!
//! Names are matched case-insensitively; the spelling used on first insertion
//! is the one written back on the wire. Looking up an absent header yields an
//! empty string, so callers treat "absent" and "empty" the same way.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    // lowercased name -> (original name, value)
    headers: IndexMap<String, (String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.headers.get_mut(&key) {
            Some(entry) => entry.1 = value.to_string(),
            None => {
                self.headers.insert(key, (name.to_string(), value.to_string()));
            }
        }
    }

    pub fn get(&self, name: &str) -> &str {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) {
        self.headers.shift_remove(&name.to_ascii_lowercase());
    }

    /// Copies every header of `other` over this map; `other` wins on collision.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in self.iter() {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result
    }
}
