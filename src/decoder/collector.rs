//! Event Collector
//!
//! Implements InfosetSink to gather replayed events into a `Vec`.

use std::convert::Infallible;
use std::sync::Arc;

use super::cursor::ReplayMode;
use super::event::{CharData, Event};
use super::sink::{replay, InfosetSink};
use crate::error::{DecodeError, ReplayError};
use crate::name::QName;
use crate::namespace::NamespaceMap;
use crate::view::InfosetView;

/// Sink that keeps every event it receives
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<Event>,
    inherited: NamespaceMap,
}

impl EventCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity
    pub fn with_capacity(events: usize) -> Self {
        Self {
            events: Vec::with_capacity(events),
            inherited: NamespaceMap::new(),
        }
    }

    /// Get the collected events as a slice
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the collected events
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Bindings the replayed view inherited
    pub fn inherited(&self) -> &NamespaceMap {
        &self.inherited
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl InfosetSink for EventCollector {
    type Error = Infallible;

    fn inherited_namespaces(&mut self, namespaces: &NamespaceMap) -> Result<(), Infallible> {
        self.inherited = namespaces.clone();
        Ok(())
    }

    fn start_document(&mut self) -> Result<(), Infallible> {
        self.events.push(Event::StartDocument);
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), Infallible> {
        self.events.push(Event::EndDocument);
        Ok(())
    }

    fn start_element(&mut self, name: QName) -> Result<(), Infallible> {
        self.events.push(Event::StartElement { name });
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), Infallible> {
        self.events.push(Event::EndElement);
        Ok(())
    }

    fn attribute(&mut self, name: QName, value: Arc<str>) -> Result<(), Infallible> {
        self.events.push(Event::Attribute { name, value });
        Ok(())
    }

    fn namespace_declaration(
        &mut self,
        prefix: Option<Arc<str>>,
        uri: Option<Arc<str>>,
    ) -> Result<(), Infallible> {
        self.events.push(Event::NamespaceDeclaration { prefix, uri });
        Ok(())
    }

    fn characters(&mut self, text: CharData) -> Result<(), Infallible> {
        self.events.push(Event::Characters(text));
        Ok(())
    }

    fn comment(&mut self, text: CharData) -> Result<(), Infallible> {
        self.events.push(Event::Comment(text));
        Ok(())
    }

    fn processing_instruction(&mut self, target: Arc<str>, data: Arc<str>) -> Result<(), Infallible> {
        self.events.push(Event::ProcessingInstruction { target, data });
        Ok(())
    }
}

/// Replay a view into a fresh `Vec` of events
pub fn collect<V: InfosetView + ?Sized>(view: &V, mode: ReplayMode) -> Result<Vec<Event>, DecodeError> {
    let mut collector = EventCollector::new();
    replay(view, &mut collector, mode).map_err(|err| match err {
        ReplayError::Decode(err) => err,
        ReplayError::Sink(never) => match never {},
    })?;
    Ok(collector.take_events())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::StructuralEncoder;

    #[test]
    fn test_collects_all_event_kinds() {
        let mut encoder = StructuralEncoder::new();
        encoder.start_document().unwrap();
        encoder.processing_instruction("style", "href='a.css'").unwrap();
        encoder.start_element(&QName::local("doc")).unwrap();
        encoder.namespace_attribute(None, Some("urn:d")).unwrap();
        encoder.attribute(&QName::local("id"), "7").unwrap();
        encoder.comment("note").unwrap();
        encoder.characters("body").unwrap();
        encoder.end_element().unwrap();
        encoder.end_document().unwrap();
        let buffer = encoder.finish().unwrap();

        let events = collect(&buffer, ReplayMode::Document).unwrap();
        assert_eq!(
            events,
            vec![
                Event::StartDocument,
                Event::ProcessingInstruction {
                    target: Arc::from("style"),
                    data: Arc::from("href='a.css'"),
                },
                Event::start("doc"),
                Event::NamespaceDeclaration {
                    prefix: None,
                    uri: Some(Arc::from("urn:d")),
                },
                Event::Attribute {
                    name: QName::local("id"),
                    value: Arc::from("7"),
                },
                Event::Comment(CharData::from("note")),
                Event::text("body"),
                Event::EndElement,
                Event::EndDocument,
            ]
        );
    }

    #[test]
    fn test_inherited_namespaces_reported() {
        let mut encoder = StructuralEncoder::new();
        encoder.start_element(&QName::local("a")).unwrap();
        let mark = encoder.mark_with_namespaces(NamespaceMap::new().with(Some("s"), "urn:s"));
        encoder.end_element().unwrap();

        let mut collector = EventCollector::with_capacity(4);
        replay(&mark, &mut collector, ReplayMode::Fragment).unwrap();
        assert_eq!(collector.inherited().get(Some("s")).map(|u| &**u), Some("urn:s"));
        assert_eq!(collector.event_count(), 0);
    }
}
