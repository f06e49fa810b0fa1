//! Qualified Names and Name Interning
//!
//! Names are shared `Arc<str>` values. When interning is enabled the encoder
//! routes every structure string through a `NameInterner`, so equal names
//! decode to the same allocation and consumers may compare with
//! `Arc::ptr_eq` instead of by content.

use std::fmt;
use std::sync::Arc;

use lru::LruCache;

/// An element or attribute name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<Arc<str>>,
    pub namespace_uri: Option<Arc<str>>,
    pub local_name: Arc<str>,
}

impl QName {
    /// Unprefixed name with no namespace
    pub fn local(local_name: impl Into<Arc<str>>) -> Self {
        Self {
            prefix: None,
            namespace_uri: None,
            local_name: local_name.into(),
        }
    }

    pub fn new(prefix: Option<&str>, namespace_uri: Option<&str>, local_name: &str) -> Self {
        Self {
            prefix: prefix.map(Arc::from),
            namespace_uri: namespace_uri.map(Arc::from),
            local_name: Arc::from(local_name),
        }
    }

    /// Split a `prefix:local` string; the namespace URI is left unresolved
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Self {
                prefix: Some(Arc::from(prefix)),
                namespace_uri: None,
                local_name: Arc::from(local),
            },
            _ => Self::local(qualified),
        }
    }

    /// Attach a namespace URI
    pub fn with_namespace(mut self, uri: impl Into<Arc<str>>) -> Self {
        self.namespace_uri = Some(uri.into());
        self
    }

    /// `prefix:local`, or just `local` when unprefixed
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}:", prefix)?;
        }
        f.write_str(&self.local_name)
    }
}

impl From<&str> for QName {
    fn from(qualified: &str) -> Self {
        QName::parse(qualified)
    }
}

/// Session-long string interner
///
/// Every distinct name stays resident until `clear`, so two equal names
/// encoded in the same pass are always the same allocation.
#[derive(Debug)]
pub struct NameInterner {
    cache: LruCache<Arc<str>, Arc<str>>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self {
            cache: LruCache::unbounded(),
        }
    }

    /// Return the canonical instance for `s`
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.cache.get(s) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(s);
        self.cache.put(Arc::clone(&interned), Arc::clone(&interned));
        interned
    }

    /// Canonicalize an existing `Arc<str>`, keeping it if it is new
    pub fn intern_arc(&mut self, s: &Arc<str>) -> Arc<str> {
        if let Some(existing) = self.cache.get(&**s) {
            return Arc::clone(existing);
        }
        self.cache.put(Arc::clone(s), Arc::clone(s));
        Arc::clone(s)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified() {
        let name = QName::parse("soap:Envelope");
        assert_eq!(name.prefix.as_deref(), Some("soap"));
        assert_eq!(&*name.local_name, "Envelope");
        assert_eq!(name.qualified(), "soap:Envelope");

        let plain = QName::parse("body");
        assert!(plain.prefix.is_none());
        assert_eq!(plain.to_string(), "body");
    }

    #[test]
    fn test_parse_degenerate_colons() {
        assert_eq!(&*QName::parse(":x").local_name, ":x");
        assert_eq!(&*QName::parse("x:").local_name, "x:");
    }

    #[test]
    fn test_intern_identity() {
        let mut interner = NameInterner::default();
        let a = interner.intern("item");
        let b = interner.intern("item");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_intern_arc_keeps_first_instance() {
        let mut interner = NameInterner::default();
        let original: Arc<str> = Arc::from("name");
        let first = interner.intern_arc(&original);
        assert!(Arc::ptr_eq(&first, &original));

        let duplicate: Arc<str> = Arc::from("name");
        let second = interner.intern_arc(&duplicate);
        assert!(Arc::ptr_eq(&second, &original));
    }

    #[test]
    fn test_large_vocabulary_keeps_identity() {
        let mut interner = NameInterner::new();
        let first = interner.intern("item");
        for i in 0..5000 {
            interner.intern(&format!("name{}", i));
        }
        let again = interner.intern("item");
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(interner.len(), 5001);

        interner.clear();
        assert!(interner.is_empty());
    }
}
