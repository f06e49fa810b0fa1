//! Structure Opcodes
//!
//! Every event starts with one structure byte: the high nibble is the event
//! type, the low nibble carries name flags or the text size tier. Decoding
//! turns the byte into an `Opcode` so dispatch never masks bits by hand.

use crate::error::DecodeError;

/// Type nibble values
pub const T_DOCUMENT: u8 = 0x10;
pub const T_ELEMENT: u8 = 0x20;
pub const T_ATTRIBUTE: u8 = 0x30;
pub const T_NAMESPACE_ATTRIBUTE: u8 = 0x40;
pub const T_TEXT: u8 = 0x50;
pub const T_COMMENT: u8 = 0x60;
pub const T_PROCESSING_INSTRUCTION: u8 = 0x70;
pub const T_END: u8 = 0x90;
pub const T_END_OF_BUFFER: u8 = 0xF0;

pub const TYPE_MASK: u8 = 0xF0;
pub const TAG_MASK: u8 = 0x0F;

/// Name flags: which optional strings precede the local name
pub const FLAG_PREFIX: u8 = 0x01;
pub const FLAG_URI: u8 = 0x02;

/// End tags
pub const END_ELEMENT: u8 = 0x00;
pub const END_DOCUMENT: u8 = 0x01;

/// Inline runs shorter than this use one length byte
pub const SMALL_LIMIT: usize = 1 << 8;
/// Inline runs shorter than this use two length bytes
pub const MEDIUM_LIMIT: usize = 1 << 16;

/// How a character run is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TextTier {
    /// Inline in content-characters, 1 length byte
    Small = 0x0,
    /// Inline in content-characters, 2 length bytes
    Medium = 0x1,
    /// Freshly copied `Arc<str>` in content-objects
    Copy = 0x2,
    /// Caller-owned `Arc<str>` in content-objects, not copied
    Shared = 0x3,
}

impl TextTier {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x0 => Some(TextTier::Small),
            0x1 => Some(TextTier::Medium),
            0x2 => Some(TextTier::Copy),
            0x3 => Some(TextTier::Shared),
            _ => None,
        }
    }
}

/// Which optional name parts are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameFlags {
    pub prefix: bool,
    pub uri: bool,
}

impl NameFlags {
    #[inline]
    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.prefix {
            bits |= FLAG_PREFIX;
        }
        if self.uri {
            bits |= FLAG_URI;
        }
        bits
    }

    #[inline]
    fn from_tag(tag: u8) -> Option<Self> {
        if tag & !(FLAG_PREFIX | FLAG_URI) != 0 {
            return None;
        }
        Some(NameFlags {
            prefix: tag & FLAG_PREFIX != 0,
            uri: tag & FLAG_URI != 0,
        })
    }
}

/// A decoded structure byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Document,
    Element(NameFlags),
    Attribute(NameFlags),
    NamespaceAttribute(NameFlags),
    Text(TextTier),
    Comment(TextTier),
    ProcessingInstruction,
    EndElement,
    EndDocument,
    EndOfBuffer,
}

impl Opcode {
    /// Pack into the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::Document => T_DOCUMENT,
            Opcode::Element(flags) => T_ELEMENT | flags.bits(),
            Opcode::Attribute(flags) => T_ATTRIBUTE | flags.bits(),
            Opcode::NamespaceAttribute(flags) => T_NAMESPACE_ATTRIBUTE | flags.bits(),
            Opcode::Text(tier) => T_TEXT | tier as u8,
            Opcode::Comment(tier) => T_COMMENT | tier as u8,
            Opcode::ProcessingInstruction => T_PROCESSING_INSTRUCTION,
            Opcode::EndElement => T_END | END_ELEMENT,
            Opcode::EndDocument => T_END | END_DOCUMENT,
            Opcode::EndOfBuffer => T_END_OF_BUFFER,
        }
    }

    /// Unpack a wire byte
    pub fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        let tag = byte & TAG_MASK;
        let op = match byte & TYPE_MASK {
            T_DOCUMENT if tag == 0 => Some(Opcode::Document),
            T_ELEMENT => NameFlags::from_tag(tag).map(Opcode::Element),
            T_ATTRIBUTE => NameFlags::from_tag(tag).map(Opcode::Attribute),
            T_NAMESPACE_ATTRIBUTE => NameFlags::from_tag(tag).map(Opcode::NamespaceAttribute),
            T_TEXT => TextTier::from_tag(tag).map(Opcode::Text),
            T_COMMENT => TextTier::from_tag(tag).map(Opcode::Comment),
            T_PROCESSING_INSTRUCTION if tag == 0 => Some(Opcode::ProcessingInstruction),
            T_END if tag == END_ELEMENT => Some(Opcode::EndElement),
            T_END if tag == END_DOCUMENT => Some(Opcode::EndDocument),
            T_END_OF_BUFFER if tag == 0 => Some(Opcode::EndOfBuffer),
            _ => None,
        };
        op.ok_or(DecodeError::InvalidOpcode(byte))
    }

    /// True for opcodes that open a subtree
    #[inline]
    pub fn is_start(self) -> bool {
        matches!(self, Opcode::Document | Opcode::Element(_))
    }
}

/// Pick a tier for a run of `len` bytes with `remaining` free inline slots
///
/// Returns the tier and whether the character channel must first advance to
/// a fresh fragment.
pub fn route_text(len: usize, remaining: usize, copy_threshold: usize) -> (TextTier, bool) {
    let advance = len > remaining;
    if advance && len >= copy_threshold {
        return (TextTier::Copy, false);
    }
    let tier = if len < SMALL_LIMIT {
        TextTier::Small
    } else if len < MEDIUM_LIMIT {
        TextTier::Medium
    } else {
        return (TextTier::Copy, false);
    };
    (tier, advance)
}
