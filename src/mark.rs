//! Mark - zero-copy view of one subtree
//!
//! A mark is a snapshot of channel positions taken while encoding (or while
//! decoding with a cursor) plus the namespace bindings in force at that
//! point. It shares fragments with its source and decodes exactly one
//! top-level item.
//!
//! # Caller obligations
//!
//! - Do not decode a mark after `reset()` on its encoder. Debug builds fail
//!   with `DecodeError::StaleView`; release builds read whatever pass the
//!   mark's fragments still hold.
//! - A mark can be decoded before its source is finished only once the
//!   marked subtree has been completely written. Reading further fails with
//!   `DecodeError::UnexpectedEnd` rather than waiting.

use std::sync::Arc;

use crate::namespace::NamespaceMap;
use crate::storage::Snapshot;
use crate::view::{Extent, InfosetView, View};

/// Decodable view of a single subtree
#[derive(Debug, Clone)]
pub struct Mark {
    view: View,
}

impl Mark {
    /// Capture a position and the namespaces in force there; O(1)
    pub fn capture(start: Snapshot, in_scope: NamespaceMap) -> Self {
        Self {
            view: View {
                start,
                extent: Extent::SingleTree,
                tree_count: 1,
                in_scope: Arc::new(in_scope),
                interned: false,
                system_id: None,
            },
        }
    }

    pub(crate) fn with_metadata(mut self, interned: bool, system_id: Option<Arc<str>>) -> Self {
        self.view.interned = interned;
        self.view.system_id = system_id;
        self
    }
}

impl InfosetView for Mark {
    fn view(&self) -> &View {
        &self.view
    }
}
