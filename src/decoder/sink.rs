//! Push Replay
//!
//! `InfosetSink` is the callback side of decoding: `replay` drives a sink to
//! completion from a view, synchronously, aborting on the first sink error.

use std::sync::Arc;

use super::cursor::{Cursor, ReplayMode};
use super::event::{CharData, Event};
use crate::error::ReplayError;
use crate::name::QName;
use crate::namespace::NamespaceMap;
use crate::view::InfosetView;

/// Receiver for replayed infoset events
///
/// Only element and character callbacks are required; everything else
/// defaults to ignoring the event.
pub trait InfosetSink {
    type Error;

    /// Called once before any event with the view's inherited bindings
    fn inherited_namespaces(&mut self, _namespaces: &NamespaceMap) -> Result<(), Self::Error> {
        Ok(())
    }

    fn start_document(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn start_element(&mut self, name: QName) -> Result<(), Self::Error>;

    fn end_element(&mut self) -> Result<(), Self::Error>;

    fn attribute(&mut self, _name: QName, _value: Arc<str>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn namespace_declaration(
        &mut self,
        _prefix: Option<Arc<str>>,
        _uri: Option<Arc<str>>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn characters(&mut self, text: CharData) -> Result<(), Self::Error>;

    fn comment(&mut self, _text: CharData) -> Result<(), Self::Error> {
        Ok(())
    }

    fn processing_instruction(&mut self, _target: Arc<str>, _data: Arc<str>) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Replay every event of `view` into `sink`
pub fn replay<V, S>(view: &V, sink: &mut S, mode: ReplayMode) -> Result<(), ReplayError<S::Error>>
where
    V: InfosetView + ?Sized,
    S: InfosetSink + ?Sized,
{
    sink.inherited_namespaces(view.in_scope_namespaces())
        .map_err(ReplayError::Sink)?;
    let mut cursor = Cursor::new(view, mode);
    loop {
        let result = match cursor.step()? {
            Event::StartDocument => sink.start_document(),
            Event::EndDocument => sink.end_document(),
            Event::StartElement { name } => sink.start_element(name),
            Event::EndElement => sink.end_element(),
            Event::Attribute { name, value } => sink.attribute(name, value),
            Event::NamespaceDeclaration { prefix, uri } => sink.namespace_declaration(prefix, uri),
            Event::Characters(text) => sink.characters(text),
            Event::Comment(text) => sink.comment(text),
            Event::ProcessingInstruction { target, data } => sink.processing_instruction(target, data),
            Event::EndOfStream => return Ok(()),
        };
        result.map_err(ReplayError::Sink)?;
    }
}

/// Replay with document boundaries
pub fn replay_document<V, S>(view: &V, sink: &mut S) -> Result<(), ReplayError<S::Error>>
where
    V: InfosetView + ?Sized,
    S: InfosetSink + ?Sized,
{
    replay(view, sink, ReplayMode::Document)
}

/// Replay without document boundaries, for embedding into another stream
pub fn replay_fragment<V, S>(view: &V, sink: &mut S) -> Result<(), ReplayError<S::Error>>
where
    V: InfosetView + ?Sized,
    S: InfosetSink + ?Sized,
{
    replay(view, sink, ReplayMode::Fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::StructuralEncoder;

    /// Counts elements and fails on a configured one
    struct Picky {
        elements: usize,
        reject: &'static str,
    }

    impl InfosetSink for Picky {
        type Error = String;

        fn start_element(&mut self, name: QName) -> Result<(), String> {
            if &*name.local_name == self.reject {
                return Err(format!("rejected <{}>", name));
            }
            self.elements += 1;
            Ok(())
        }

        fn end_element(&mut self) -> Result<(), String> {
            Ok(())
        }

        fn characters(&mut self, _text: CharData) -> Result<(), String> {
            Ok(())
        }
    }

    fn three_elements() -> crate::buffer::Buffer {
        let mut encoder = StructuralEncoder::new();
        encoder.start_element(&QName::local("a")).unwrap();
        encoder.start_element(&QName::local("b")).unwrap();
        encoder.end_element().unwrap();
        encoder.start_element(&QName::local("c")).unwrap();
        encoder.end_element().unwrap();
        encoder.end_element().unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_sink_error_aborts_replay() {
        let buffer = three_elements();
        let mut sink = Picky {
            elements: 0,
            reject: "b",
        };
        let err = replay_fragment(&buffer, &mut sink).unwrap_err();
        assert!(matches!(err, ReplayError::Sink(ref msg) if msg == "rejected <b>"));
        assert_eq!(sink.elements, 1);
    }

    #[test]
    fn test_replay_to_completion() {
        let buffer = three_elements();
        let mut sink = Picky {
            elements: 0,
            reject: "none",
        };
        replay_document(&buffer, &mut sink).unwrap();
        assert_eq!(sink.elements, 3);
    }
}
