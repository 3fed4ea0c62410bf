//! Case-preserving, case-insensitive header mapping.
//!
//! Header names keep the spelling they had on the wire, lookups compare them
//! ASCII case-insensitively. A name may repeat, every occurrence is kept in
//! arrival order. Names and values are shared slices of the received buffer.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

/// A single `field-name: field-value` pair as it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: Bytes,
    value: Bytes,
}

impl HeaderField {
    pub(crate) fn new(name: Bytes, value: Bytes) -> Self {
        Self { name, value }
    }

    /// The field name with its original casing.
    ///
    /// Names are restricted to token characters, so this never allocates.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn name_bytes(&self) -> &Bytes {
        &self.name
    }

    /// The field value with surrounding whitespace removed.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// The field value as `str`, `None` if it carries obs-text bytes.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    /// Returns true if this field has the given name, ignoring ASCII case.
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.as_bytes())
    }
}

/// Ordered multi-map of header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<HeaderField>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    /// Number of fields, counting each repetition.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.is(name))
    }

    /// First value received for `name`.
    pub fn get(&self, name: &str) -> Option<&Bytes> {
        self.fields.iter().find(|field| field.is(name)).map(HeaderField::value)
    }

    /// Every value received for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Bytes> + 'a {
        self.fields.iter().filter(move |field| field.is(name)).map(HeaderField::value)
    }

    /// All values of `name` joined by `", "`, the way a recipient may combine
    /// repeated list-valued fields into a single one.
    pub fn combined(&self, name: &str) -> Option<Bytes> {
        let mut values = self.get_all(name);
        let first = values.next()?;

        let mut rest = values.peekable();
        if rest.peek().is_none() {
            return Some(first.clone());
        }

        let mut combined = first.to_vec();
        for value in rest {
            combined.extend_from_slice(b", ");
            combined.extend_from_slice(value);
        }
        Some(Bytes::from(combined))
    }

    /// Iterates the fields in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    /// Converts into an [`http::HeaderMap`]; names are lower-cased by the conversion.
    pub fn to_header_map(&self) -> Result<HeaderMap, http::Error> {
        let mut map = HeaderMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let name = HeaderName::from_bytes(&field.name)?;
            let value = HeaderValue::from_maybe_shared(field.value.clone())?;
            map.append(name, value);
        }
        Ok(map)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
pub(crate) fn headers_of(pairs: &[(&'static str, &'static str)]) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in pairs {
        headers.append(HeaderField::new(Bytes::from_static(name.as_bytes()), Bytes::from_static(value.as_bytes())));
    }
    headers
}
