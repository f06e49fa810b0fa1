//! Decodable Views
//!
//! A `View` is the shape shared by `Buffer` and `Mark`: start positions in
//! the four channels plus the metadata a consumer needs to interpret them.
//! `InfosetView` is the seam the decoder works against, so a mark replays
//! through exactly the same code as a buffer.

use std::sync::Arc;

use crate::decoder::{Cursor, ReplayMode};
use crate::namespace::NamespaceMap;
use crate::opcode::Opcode;
use crate::storage::Snapshot;

/// How far a view extends past its start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Everything up to the terminal opcode
    UntilTerminator,
    /// One top-level item: a subtree or a single leaf event
    SingleTree,
}

/// Start positions plus metadata
#[derive(Debug, Clone)]
pub struct View {
    pub(crate) start: Snapshot,
    pub(crate) extent: Extent,
    pub(crate) tree_count: usize,
    pub(crate) in_scope: Arc<NamespaceMap>,
    pub(crate) interned: bool,
    pub(crate) system_id: Option<Arc<str>>,
}

impl View {
    /// The first structure byte, if it has been written
    pub(crate) fn first_opcode(&self) -> Option<Opcode> {
        self.start
            .structure
            .get()
            .and_then(|byte| Opcode::from_byte(byte).ok())
    }

    #[inline]
    pub fn start(&self) -> &Snapshot {
        &self.start
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }
}

/// Decode contract shared by buffers and marks
pub trait InfosetView {
    fn view(&self) -> &View;

    /// Number of sibling top-level trees
    fn tree_count(&self) -> usize {
        self.view().tree_count
    }

    /// Something other than the terminal opcode has been written
    fn is_created(&self) -> bool {
        matches!(self.view().first_opcode(), Some(op) if op != Opcode::EndOfBuffer)
    }

    /// Content without a document boundary
    fn is_fragment(&self) -> bool {
        self.is_created() && self.view().first_opcode() != Some(Opcode::Document)
    }

    /// Content that starts with an element
    fn is_element_fragment(&self) -> bool {
        matches!(self.view().first_opcode(), Some(Opcode::Element(_)))
    }

    fn is_forest(&self) -> bool {
        self.tree_count() > 1
    }

    /// Bindings in force at the start, not declared inside the view
    fn in_scope_namespaces(&self) -> &NamespaceMap {
        &self.view().in_scope
    }

    /// Names came from an interner and may be compared by identity
    fn has_interned_strings(&self) -> bool {
        self.view().interned
    }

    fn system_id(&self) -> Option<&str> {
        self.view().system_id.as_deref()
    }

    /// Pull cursor reporting full document events
    fn document_cursor(&self) -> Cursor {
        Cursor::new(self, ReplayMode::Document)
    }

    /// Pull cursor that omits document boundaries
    fn fragment_cursor(&self) -> Cursor {
        Cursor::new(self, ReplayMode::Fragment)
    }
}
