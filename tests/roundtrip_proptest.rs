//! Property-based round-trip tests
//!
//! Random infoset trees are encoded with small chunk capacities so every
//! channel grows many times, then decoded and compared event for event.
//! A mark is taken in front of every element and must replay exactly that
//! element's events.

use std::sync::Arc;

use infoset_buffer::{
    collect, CharData, EncoderConfig, Event, Mark, QName, ReplayMode, StructuralEncoder,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Node {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text(String),
    Comment(String),
    Pi(String, String),
}

// ============================================================================
// Generators
// ============================================================================

fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z <>&\u{e9}\u{4e2d}]{0,40}",
        1 => "[xy]{250,300}",
        1 => "[pq]{500,700}",
    ]
}

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => text().prop_map(Node::Text),
        1 => "[a-z ]{0,12}".prop_map(Node::Comment),
        1 => ("[a-z]{1,6}", "[a-z ]{0,10}").prop_map(|(t, d)| Node::Pi(t, d)),
    ]
}

fn tree() -> impl Strategy<Value = Node> {
    let element = |children: BoxedStrategy<Vec<Node>>| {
        (
            "[a-z]{1,8}",
            prop::collection::vec(("[a-z]{1,4}", "[a-z0-9 ]{0,8}"), 0..3),
            children,
        )
            .prop_map(|(name, attributes, children)| Node::Element {
                name,
                attributes,
                children,
            })
    };
    let root = element(Just(Vec::new()).boxed());
    prop_oneof![leaf(), root].prop_recursive(4, 48, 5, move |inner| {
        element(prop::collection::vec(inner, 0..5).boxed())
    })
}

fn config() -> impl Strategy<Value = EncoderConfig> {
    (1usize..8, 1usize..8, 512usize..1024, 1usize..4).prop_map(|(s, st, c, o)| {
        EncoderConfig::default()
            .with_chunks(s, st, c, o)
            .with_copy_threshold(512)
    })
}

// ============================================================================
// Encoding with expectations
// ============================================================================

/// Marks taken before each element with the range of events they cover
struct Recorder {
    expected: Vec<Event>,
    marks: Vec<(Mark, usize, usize)>,
}

impl Recorder {
    fn encode(&mut self, encoder: &mut StructuralEncoder, node: &Node) {
        match node {
            Node::Element {
                name,
                attributes,
                children,
            } => {
                let mark = encoder.mark();
                let start = self.expected.len();
                let qname = QName::local(name.as_str());
                encoder.start_element(&qname).unwrap();
                self.expected.push(Event::StartElement { name: qname });
                for (attr, value) in attributes {
                    let attr = QName::local(attr.as_str());
                    encoder.attribute(&attr, value).unwrap();
                    self.expected.push(Event::Attribute {
                        name: attr,
                        value: Arc::from(value.as_str()),
                    });
                }
                for child in children {
                    self.encode(encoder, child);
                }
                encoder.end_element().unwrap();
                self.expected.push(Event::EndElement);
                self.marks.push((mark, start, self.expected.len()));
            }
            Node::Text(text) => {
                encoder.characters(text).unwrap();
                self.expected.push(Event::Characters(CharData::from(text.as_str())));
            }
            Node::Comment(text) => {
                encoder.comment(text).unwrap();
                self.expected.push(Event::Comment(CharData::from(text.as_str())));
            }
            Node::Pi(target, data) => {
                encoder.processing_instruction(target, data).unwrap();
                self.expected.push(Event::ProcessingInstruction {
                    target: Arc::from(target.as_str()),
                    data: Arc::from(data.as_str()),
                });
            }
        }
    }
}

proptest! {
    #[test]
    fn document_round_trip(roots in prop::collection::vec(tree(), 1..4), config in config()) {
        let mut encoder = StructuralEncoder::with_config(config).unwrap();
        let mut recorder = Recorder { expected: vec![Event::StartDocument], marks: Vec::new() };
        encoder.start_document().unwrap();
        for root in &roots {
            recorder.encode(&mut encoder, root);
        }
        encoder.end_document().unwrap();
        recorder.expected.push(Event::EndDocument);
        let buffer = encoder.finish().unwrap();

        prop_assert_eq!(collect(&buffer, ReplayMode::Document).unwrap(), recorder.expected.clone());

        for (mark, start, end) in &recorder.marks {
            let events = collect(mark, ReplayMode::Fragment).unwrap();
            prop_assert_eq!(&events[..], &recorder.expected[*start..*end]);
        }
    }

    #[test]
    fn fragment_mode_drops_only_document_events(roots in prop::collection::vec(tree(), 1..3)) {
        let mut encoder = StructuralEncoder::new();
        let mut recorder = Recorder { expected: Vec::new(), marks: Vec::new() };
        encoder.start_document().unwrap();
        for root in &roots {
            recorder.encode(&mut encoder, root);
        }
        encoder.end_document().unwrap();
        let buffer = encoder.finish().unwrap();

        prop_assert_eq!(collect(&buffer, ReplayMode::Fragment).unwrap(), recorder.expected);
    }
}
