//! Inline `style` attribute model.

use std::fmt;

use super::css::parse_declarations;
use super::dom::Element;

/// Ordered property → value map parsed from a `style` attribute.
///
/// Property names are lower-cased; values are kept verbatim (trimmed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(source: &str) -> Self {
        let mut map = Self::new();
        for declaration in parse_declarations(source) {
            if declaration.important {
                map.set(&declaration.property, format!("{} !important", declaration.value));
            } else {
                map.set(&declaration.property, declaration.value);
            }
        }
        map
    }

    pub fn of(element: &Element) -> Self {
        element.attr("style").map(Self::parse).unwrap_or_default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// Insert or replace `property`; a replaced entry keeps its position.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(property))
        {
            Some((_, existing)) => *existing = value,
            None => self
                .entries
                .push((property.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(property))?;
        Some(self.entries.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Fill in `defaults` wherever this map has no entry of its own.
    ///
    /// Defaults are placed ahead of existing declarations so a shorthand
    /// default (`margin`) never overrides an existing longhand (`margin-top`).
    pub fn merge_defaults(&mut self, defaults: &StyleMap) {
        let mut merged: Vec<(String, String)> = defaults
            .entries
            .iter()
            .filter(|(key, _)| !self.contains(key))
            .cloned()
            .collect();
        merged.append(&mut self.entries);
        self.entries = merged;
    }

    /// Write the map back onto `element`, dropping the attribute when empty.
    pub fn apply_to(&self, element: &mut Element) {
        if self.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", self.to_string());
        }
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            write!(f, "{key}:{value};")?;
        }
        Ok(())
    }
}

/// Merge `defaults` under the element's current inline style.
pub fn merge_style(element: &mut Element, defaults: &str) {
    let mut style = StyleMap::of(element);
    style.merge_defaults(&StyleMap::parse(defaults));
    style.apply_to(element);
}
