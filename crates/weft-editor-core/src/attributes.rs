//! Ordered HTML attribute storage.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::html::entities::escape_attribute;

/// Ordered name → value mapping that keeps HTML source order.
///
/// Names are stored lowercased. Setting an existing name keeps its position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeBag {
    entries: Vec<(SmolStr, SmolStr)>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        let name = SmolStr::new(name.to_ascii_lowercase());
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = SmolStr::new(value),
            None => self.entries.push((name, SmolStr::new(value))),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<SmolStr> {
        let idx = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(idx).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Render as ` name="value"` pairs, each preceded by a space.
    pub fn write_html(&self, out: &mut String) {
        for (name, value) in &self.entries {
            let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for AttributeBag {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut bag = AttributeBag::new();
        for (name, value) in iter {
            bag.set(name, value);
        }
        bag
    }
}
