//! Multi-valued header map with stable ordering.

use std::fmt;

use http::header::{HeaderName, HeaderValue};

/// Case-insensitive multimap over header names.
///
/// Names keep their first-appearance order and each name keeps the order its
/// values were appended in. A name may legitimately repeat on the wire, so a
/// lookup can yield more than one value.
#[derive(Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(HeaderName, Vec<HeaderValue>)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        HeaderMap::default()
    }

    /// Append a value, keeping any existing values for the name.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Replace all values recorded for the name.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => {
                values.clear();
                values.push(value);
            }
            None => self.entries.push((name, vec![value])),
        }
    }

    /// First value recorded for the name.
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, values)| values.first())
    }

    /// All values recorded for the name, in append order.
    pub fn get_all(&self, name: &HeaderName) -> &[HeaderValue] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, name: &HeaderName) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grouped view: one item per name, values in append order.
    pub fn entries(&self) -> impl Iterator<Item = (&HeaderName, &[HeaderValue])> {
        self.entries.iter().map(|(n, values)| (n, values.as_slice()))
    }

    /// Flattened view in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries
            .iter()
            .flat_map(|(n, values)| values.iter().map(move |v| (n, v)))
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> HeaderName {
        s.parse().unwrap()
    }

    fn value(s: &str) -> HeaderValue {
        s.parse().unwrap()
    }

    #[test]
    fn append_accumulates_in_order() {
        let mut map = HeaderMap::new();
        map.append(name("x-test"), value("a"));
        map.append(name("x-other"), value("1"));
        map.append(name("x-test"), value("b"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get_all(&name("x-test")), &[value("a"), value("b")][..]);

        // first-appearance key order survives interleaving
        let names: Vec<_> = map.entries().map(|(n, _)| n.as_str().to_owned()).collect();
        assert_eq!(names, ["x-test", "x-other"]);
    }

    #[test]
    fn insert_replaces_all_values() {
        let mut map = HeaderMap::new();
        map.append(name("x-test"), value("a"));
        map.append(name("x-test"), value("b"));
        map.insert(name("x-test"), value("c"));

        assert_eq!(map.get_all(&name("x-test")), &[value("c")][..]);
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut map = HeaderMap::new();
        map.append("X-Test".parse().unwrap(), value("a"));

        assert!(map.contains_key(&name("x-test")));
        assert_eq!(map.get(&name("x-test")), Some(&value("a")));
    }

    #[test]
    fn lookup_misses_yield_nothing() {
        let map = HeaderMap::new();
        assert!(map.get(&name("x-test")).is_none());
        assert!(map.get_all(&name("x-test")).is_empty());
        assert!(map.is_empty());
    }
}
