use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// A header multimap that strictly preserves insertion order.
/// Names may repeat; every entry is sent as given.
#[derive(Debug, Clone, Default)]
pub struct OrderedHeaderMap {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Append an entry, keeping any existing entries with the same name.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let (name, value) = Self::parse(name, value)?;
        self.headers.push((name, value));
        Ok(())
    }

    /// Replace the first entry with this name in place (case-insensitive),
    /// dropping later duplicates, or append if absent.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let (name, value) = Self::parse(name, value)?;
        match self.headers.iter().position(|(n, _)| *n == name) {
            Some(idx) => {
                self.headers[idx].1 = value;
                let mut seen = 0usize;
                self.headers.retain(|(n, _)| {
                    if *n == name {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.headers.push((name, value)),
        }
        Ok(())
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        let target = HeaderName::from_str(name).ok()?;
        self.headers
            .iter()
            .find(|(n, _)| *n == target)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Consumes the map and returns a standard http::HeaderMap.
    /// Repeated names are appended, not overwritten.
    pub fn to_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            map.append(name, value);
        }
        map
    }

    fn parse(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), NetError> {
        let name = HeaderName::from_str(name.trim()).map_err(|_| NetError::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;
        Ok((name, value))
    }
}
