//! Namespace Context
//!
//! `NamespaceMap` is the flat prefix→URI map attached to a buffer or mark:
//! the declarations in force at its starting point that its own byte range
//! does not contain. `NamespaceStack` is the depth-tagged resolver the
//! encoder and the decode cursor maintain while walking a stream.

use std::sync::Arc;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Ordered prefix→URI map; the `None` prefix is the default namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    entries: Vec<(Option<Arc<str>>, Arc<str>)>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix`, replacing any existing binding for it
    pub fn insert(&mut self, prefix: Option<&str>, uri: &str) {
        self.insert_arc(prefix.map(Arc::from), Arc::from(uri));
    }

    pub(crate) fn insert_arc(&mut self, prefix: Option<Arc<str>>, uri: Arc<str>) {
        match self
            .entries
            .iter_mut()
            .find(|(p, _)| p.as_deref() == prefix.as_deref())
        {
            Some(entry) => entry.1 = uri,
            None => self.entries.push((prefix, uri)),
        }
    }

    /// Builder form of `insert`
    pub fn with(mut self, prefix: Option<&str>, uri: &str) -> Self {
        self.insert(prefix, uri);
        self
    }

    pub fn get(&self, prefix: Option<&str>) -> Option<&Arc<str>> {
        self.entries
            .iter()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> + '_ {
        self.entries.iter().map(|(p, u)| (p.as_deref(), &**u))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Namespace binding (prefix -> URI) tagged with the depth that declared it
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: Option<Arc<str>>,
    /// Empty for an undeclaration (`xmlns=""`)
    uri: Arc<str>,
    depth: u32,
}

/// Stack-based namespace resolver
#[derive(Debug, Clone, Default)]
pub struct NamespaceStack {
    bindings: Vec<NsBinding>,
    depth: u32,
}

impl NamespaceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with bindings inherited from outside the stream
    pub fn with_inherited(inherited: &NamespaceMap) -> Self {
        let mut stack = Self::new();
        for (prefix, uri) in &inherited.entries {
            stack.bindings.push(NsBinding {
                prefix: prefix.clone(),
                uri: Arc::clone(uri),
                depth: 0,
            });
        }
        stack
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a binding in the current scope; `None` uri undeclares
    pub fn declare(&mut self, prefix: Option<Arc<str>>, uri: Option<Arc<str>>) {
        // xml and xmlns are fixed
        if matches!(prefix.as_deref(), Some("xml") | Some("xmlns")) {
            return;
        }
        self.bindings.push(NsBinding {
            prefix,
            uri: uri.unwrap_or_else(|| Arc::from("")),
            depth: self.depth,
        });
    }

    /// Resolve a prefix to a namespace URI
    pub fn resolve(&self, prefix: Option<&str>) -> Option<Arc<str>> {
        match prefix {
            Some("xml") => return Some(Arc::from(ns::XML)),
            Some("xmlns") => return Some(Arc::from(ns::XMLNS)),
            _ => {}
        }
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix.as_deref() == prefix)
            .filter(|b| !b.uri.is_empty())
            .map(|b| Arc::clone(&b.uri))
    }

    /// Flatten the bindings visible at the current scope
    pub fn in_scope(&self) -> NamespaceMap {
        let mut map = NamespaceMap::new();
        let mut seen: Vec<Option<&str>> = Vec::new();
        for binding in self.bindings.iter().rev() {
            let prefix = binding.prefix.as_deref();
            if seen.contains(&prefix) {
                continue;
            }
            seen.push(prefix);
            if !binding.uri.is_empty() {
                map.entries.push((binding.prefix.clone(), Arc::clone(&binding.uri)));
            }
        }
        // Outermost first, matching declaration order
        map.entries.reverse();
        map
    }

    /// Current element depth
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Drop every binding and return to depth zero
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.depth = 0;
    }
}
