//! Buffer - the finished, replayable artifact of an encoding pass
//!
//! Cloning a buffer clones `Arc`s only; every clone, and every mark taken
//! from the same session, reads the same fragments.

use std::sync::Arc;

use crate::namespace::NamespaceMap;
use crate::storage::Snapshot;
use crate::view::{Extent, InfosetView, View};

/// An encoded infoset stream
#[derive(Debug, Clone)]
pub struct Buffer {
    view: View,
}

impl Buffer {
    pub(crate) fn new(
        start: Snapshot,
        tree_count: usize,
        interned: bool,
        system_id: Option<Arc<str>>,
    ) -> Self {
        Self {
            view: View {
                start,
                extent: Extent::UntilTerminator,
                tree_count,
                in_scope: Arc::new(NamespaceMap::new()),
                interned,
                system_id,
            },
        }
    }

    /// Attach the bindings in force where this buffer will be embedded
    pub fn with_in_scope_namespaces(mut self, namespaces: NamespaceMap) -> Self {
        self.view.in_scope = Arc::new(namespaces);
        self
    }

    pub fn with_system_id(mut self, system_id: impl Into<Arc<str>>) -> Self {
        self.view.system_id = Some(system_id.into());
        self
    }
}

impl InfosetView for Buffer {
    fn view(&self) -> &View {
        &self.view
    }
}
