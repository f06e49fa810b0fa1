//! infoset-buffer - Append-only chunked encoding of XML infoset streams
//!
//! Encode once, replay many times:
//!
//! ```text
//! producer ──► StructuralEncoder ──► Channels ──► Buffer / Mark ──► Cursor / replay ──► consumer
//!                                   (4 chunked arrays)
//! ```
//!
//! Components:
//! - `storage`: fragments, chunked arrays and read cursors for the four channels
//! - `encoder`: infoset construction calls to opcodes and operands
//! - `Buffer`/`Mark`: decodable views sharing channel storage
//! - `decoder`: pull cursor and push replay over any view
//! - `producer`/`writer`: XML text in and out
//! - `parallel`: decode many views with Rayon
//!
//! ```
//! use infoset_buffer::{encode_xml, to_xml_string, InfosetView, ReplayMode};
//!
//! let buffer = encode_xml("<a><b>hi</b></a>").unwrap();
//! assert_eq!(buffer.tree_count(), 1);
//! assert_eq!(
//!     to_xml_string(&buffer, ReplayMode::Fragment).unwrap(),
//!     "<a><b>hi</b></a>"
//! );
//! ```

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod mark;
pub mod name;
pub mod namespace;
pub mod opcode;
pub mod parallel;
pub mod producer;
pub mod storage;
pub mod view;
pub mod writer;

// ============================================================================
// Core types
// ============================================================================

pub use buffer::Buffer;
pub use encoder::{EncoderConfig, StructuralEncoder};
pub use mark::Mark;
pub use name::{NameInterner, QName};
pub use namespace::{NamespaceMap, NamespaceStack};
pub use view::{Extent, InfosetView, View};

// ============================================================================
// Decoding
// ============================================================================

pub use decoder::{
    collect, replay, replay_document, replay_fragment, CharData, Cursor, Event, EventCollector,
    InfosetSink, ReplayMode,
};

// ============================================================================
// Errors
// ============================================================================

pub use error::{Channel, ConfigError, DecodeError, EncodeError, ProduceError, ReplayError};

// ============================================================================
// XML text and parallel replay
// ============================================================================

pub use parallel::{collect_parallel, replay_map};
pub use producer::{encode_xml, encode_xml_into, encode_xml_with_config};
pub use writer::{to_xml_string, XmlWriter};
