//! Pull Cursor
//!
//! A cursor owns one private read position per channel, initialized from a
//! view's snapshot, and turns structure bytes back into events on demand.
//! Cursors never write to channel storage, so any number of them may walk
//! the same buffer at once, on any threads.

use std::sync::Arc;

use super::event::{CharData, Event};
use crate::error::{Channel, DecodeError};
use crate::mark::Mark;
use crate::name::QName;
use crate::namespace::NamespaceStack;
use crate::opcode::{NameFlags, Opcode, TextTier};
use crate::storage::{Generation, ReadCursor, Snapshot};
use crate::view::{Extent, InfosetView};

/// Which boundary events a replay reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Report `StartDocument`/`EndDocument`
    #[default]
    Document,
    /// Omit document boundaries, for embedding into a larger stream
    Fragment,
}

/// Pull-style decoder over a buffer or mark
#[derive(Debug)]
pub struct Cursor {
    structure: ReadCursor<u8>,
    strings: ReadCursor<Arc<str>>,
    chars: ReadCursor<u8>,
    objects: ReadCursor<Arc<str>>,
    generation: Generation,
    mode: ReplayMode,
    extent: Extent,
    /// Open elements
    depth: u32,
    /// Open elements and documents
    open: u32,
    namespaces: NamespaceStack,
    interned: bool,
    system_id: Option<Arc<str>>,
    done: bool,
}

impl Cursor {
    pub fn new<V: InfosetView + ?Sized>(view: &V, mode: ReplayMode) -> Self {
        let view = view.view();
        let start = &view.start;
        Self {
            structure: ReadCursor::new(&start.structure, Channel::Structure),
            strings: ReadCursor::new(&start.strings, Channel::Strings),
            chars: ReadCursor::new(&start.chars, Channel::Characters),
            objects: ReadCursor::new(&start.objects, Channel::Objects),
            generation: start.generation.clone(),
            mode,
            extent: view.extent,
            depth: 0,
            open: 0,
            namespaces: NamespaceStack::with_inherited(&view.in_scope),
            interned: view.interned,
            system_id: view.system_id.clone(),
            done: false,
        }
    }

    /// Cursor reporting document boundaries
    pub fn document<V: InfosetView + ?Sized>(view: &V) -> Self {
        Self::new(view, ReplayMode::Document)
    }

    /// Cursor omitting document boundaries
    pub fn fragment<V: InfosetView + ?Sized>(view: &V) -> Self {
        Self::new(view, ReplayMode::Fragment)
    }

    /// Decode the next event
    ///
    /// Returns `Event::EndOfStream` at the end of the view, and keeps
    /// returning it on further calls.
    pub fn step(&mut self) -> Result<Event, DecodeError> {
        loop {
            match self.read_event() {
                Ok(Some(event)) => return Ok(event),
                // Suppressed boundary event
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(error = %err, depth = self.depth, "decode failed");
                    self.done = true;
                    return Err(err);
                }
            }
        }
    }

    fn read_event(&mut self) -> Result<Option<Event>, DecodeError> {
        if self.done {
            return Ok(Some(Event::EndOfStream));
        }
        #[cfg(debug_assertions)]
        if !self.generation.is_current() {
            return Err(DecodeError::StaleView);
        }

        let opcode = Opcode::from_byte(self.structure.next_value()?)?;
        let event = match opcode {
            Opcode::Document => {
                self.open += 1;
                Event::StartDocument
            }
            Opcode::EndDocument | Opcode::EndElement if self.open == 0 => {
                // An end at the start of a single-item view: nothing was marked
                return Ok(Some(self.end_of_stream()));
            }
            Opcode::EndDocument => {
                self.open -= 1;
                Event::EndDocument
            }
            Opcode::Element(flags) => {
                let name = self.read_name(flags)?;
                self.depth += 1;
                self.open += 1;
                self.namespaces.push_scope();
                Event::StartElement { name }
            }
            Opcode::EndElement => {
                self.depth = self.depth.saturating_sub(1);
                self.open -= 1;
                self.namespaces.pop_scope();
                Event::EndElement
            }
            Opcode::Attribute(flags) => {
                let name = self.read_name(flags)?;
                let value = self.strings.next_value()?;
                Event::Attribute { name, value }
            }
            Opcode::NamespaceAttribute(flags) => {
                let prefix = self.read_optional(flags.prefix)?;
                let uri = self.read_optional(flags.uri)?;
                self.namespaces.declare(prefix.clone(), uri.clone());
                Event::NamespaceDeclaration { prefix, uri }
            }
            Opcode::Text(tier) => Event::Characters(self.read_text(tier)?),
            Opcode::Comment(tier) => Event::Comment(self.read_text(tier)?),
            Opcode::ProcessingInstruction => {
                let target = self.strings.next_value()?;
                let data = self.strings.next_value()?;
                Event::ProcessingInstruction { target, data }
            }
            Opcode::EndOfBuffer => return Ok(Some(self.end_of_stream())),
        };

        if self.extent == Extent::SingleTree && self.open == 0 {
            self.done = true;
        }
        let suppressed = self.mode == ReplayMode::Fragment
            && matches!(event, Event::StartDocument | Event::EndDocument);
        Ok((!suppressed).then_some(event))
    }

    fn end_of_stream(&mut self) -> Event {
        self.done = true;
        Event::EndOfStream
    }

    fn read_name(&mut self, flags: NameFlags) -> Result<QName, DecodeError> {
        let prefix = self.read_optional(flags.prefix)?;
        let namespace_uri = self.read_optional(flags.uri)?;
        let local_name = self.strings.next_value()?;
        Ok(QName {
            prefix,
            namespace_uri,
            local_name,
        })
    }

    #[inline]
    fn read_optional(&mut self, present: bool) -> Result<Option<Arc<str>>, DecodeError> {
        if present {
            self.strings.next_value().map(Some)
        } else {
            Ok(None)
        }
    }

    fn read_text(&mut self, tier: TextTier) -> Result<CharData, DecodeError> {
        let len = match tier {
            TextTier::Small => self.structure.next_value()? as usize,
            TextTier::Medium => {
                let hi = self.structure.next_value()? as usize;
                let lo = self.structure.next_value()? as usize;
                (hi << 8) | lo
            }
            TextTier::Copy | TextTier::Shared => {
                return self.objects.next_value().map(CharData::Object);
            }
        };
        self.chars.take_str(len).map(CharData::Inline)
    }

    /// Mark the cursor's current position
    ///
    /// The mark covers the next item this cursor would decode, with the
    /// namespaces the cursor has in scope.
    pub fn mark(&self) -> Mark {
        let start = Snapshot {
            structure: self.structure.position(),
            strings: self.strings.position(),
            chars: self.chars.position(),
            objects: self.objects.position(),
            generation: self.generation.clone(),
        };
        Mark::capture(start, self.namespaces.in_scope())
            .with_metadata(self.interned, self.system_id.clone())
    }

    /// Open element depth
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Bindings in force at the current position
    #[inline]
    pub fn namespaces(&self) -> &NamespaceStack {
        &self.namespaces
    }

    #[inline]
    pub fn mode(&self) -> ReplayMode {
        self.mode
    }
}

impl Iterator for Cursor {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Event::EndOfStream) => None,
            other => Some(other),
        }
    }
}
