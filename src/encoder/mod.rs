//! Structural Encoder
//!
//! Turns infoset construction calls into opcodes and operands spread over
//! the four channels:
//!
//! - names, attribute values and PI parts go to structure-strings
//! - short text runs are copied inline into content-characters with their
//!   length in the structure channel
//! - long runs become one `Arc<str>` in content-objects
//!
//! The encoder only appends. `mark()` and `finish()` hand out snapshots of
//! its channel positions; nothing is copied.

pub mod config;

pub use config::EncoderConfig;

use std::sync::Arc;

use crate::buffer::Buffer;
use crate::error::{ConfigError, EncodeError};
use crate::mark::Mark;
use crate::name::{NameInterner, QName};
use crate::namespace::{NamespaceMap, NamespaceStack};
use crate::opcode::{route_text, NameFlags, Opcode, TextTier};
use crate::storage::Channels;

/// Single-writer encoder for one infoset stream
#[derive(Debug)]
pub struct StructuralEncoder {
    channels: Channels,
    config: EncoderConfig,
    interner: Option<NameInterner>,
    /// Declarations seen so far, for automatic mark context
    namespaces: NamespaceStack,
    depth: u32,
    document_open: bool,
    tree_count: usize,
    finished: bool,
    system_id: Option<Arc<str>>,
}

impl Default for StructuralEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralEncoder {
    /// Create an encoder with the default configuration
    pub fn new() -> Self {
        Self::build(EncoderConfig::default())
    }

    /// Create an encoder with a validated configuration
    pub fn with_config(config: EncoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EncoderConfig) -> Self {
        let channels = Channels::new(
            config.structure_chunk,
            config.strings_chunk,
            config.chars_chunk,
            config.objects_chunk,
        );
        let interner = config.intern_names.then(NameInterner::new);
        Self {
            channels,
            config,
            interner,
            namespaces: NamespaceStack::new(),
            depth: 0,
            document_open: false,
            tree_count: 0,
            finished: false,
            system_id: None,
        }
    }

    // ========================================================================
    // Producer operations
    // ========================================================================

    pub fn start_document(&mut self) -> Result<(), EncodeError> {
        self.ensure_open()?;
        if self.depth == 0 && !self.document_open {
            self.tree_count += 1;
        }
        self.document_open = true;
        self.push_opcode(Opcode::Document);
        Ok(())
    }

    pub fn end_document(&mut self) -> Result<(), EncodeError> {
        self.ensure_open()?;
        if !self.document_open {
            return Err(EncodeError::UnbalancedEnd("no document is open"));
        }
        if self.depth > 0 {
            return Err(EncodeError::UnbalancedEnd("elements are still open"));
        }
        self.document_open = false;
        self.push_opcode(Opcode::EndDocument);
        Ok(())
    }

    pub fn start_element(&mut self, name: &QName) -> Result<(), EncodeError> {
        self.ensure_open()?;
        if self.depth == 0 && !self.document_open {
            self.tree_count += 1;
        }
        self.push_opcode(Opcode::Element(name_flags(name)));
        self.push_name(name);
        self.depth += 1;
        self.namespaces.push_scope();
        Ok(())
    }

    pub fn end_element(&mut self) -> Result<(), EncodeError> {
        self.ensure_open()?;
        if self.depth == 0 {
            return Err(EncodeError::UnbalancedEnd("no element is open"));
        }
        self.push_opcode(Opcode::EndElement);
        self.depth -= 1;
        self.namespaces.pop_scope();
        Ok(())
    }

    pub fn attribute(&mut self, name: &QName, value: &str) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.push_opcode(Opcode::Attribute(name_flags(name)));
        self.push_name(name);
        self.channels.strings.append(Arc::from(value));
        Ok(())
    }

    /// Declare a namespace on the current element
    ///
    /// `None` prefix is the default namespace; `None` uri undeclares it.
    pub fn namespace_attribute(
        &mut self,
        prefix: Option<&str>,
        uri: Option<&str>,
    ) -> Result<(), EncodeError> {
        self.ensure_open()?;
        let flags = NameFlags {
            prefix: prefix.is_some(),
            uri: uri.is_some(),
        };
        self.push_opcode(Opcode::NamespaceAttribute(flags));
        let prefix = prefix.map(|p| self.push_str(p));
        let uri = uri.map(|u| {
            let uri: Arc<str> = Arc::from(u);
            self.channels.strings.append(Arc::clone(&uri));
            uri
        });
        self.namespaces.declare(prefix, uri);
        Ok(())
    }

    pub fn characters(&mut self, text: &str) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.push_text(Opcode::Text, text);
        Ok(())
    }

    /// Encode `length` bytes of `text` starting at `offset`
    pub fn characters_at(
        &mut self,
        text: &str,
        offset: usize,
        length: usize,
    ) -> Result<(), EncodeError> {
        let run = offset
            .checked_add(length)
            .and_then(|end| text.get(offset..end))
            .ok_or(EncodeError::InvalidRange {
                offset,
                length,
                available: text.len(),
            })?;
        self.characters(run)
    }

    /// Store caller-owned text by reference, without copying it
    pub fn characters_shared(&mut self, text: Arc<str>) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.push_opcode(Opcode::Text(TextTier::Shared));
        self.channels.objects.append(text);
        Ok(())
    }

    pub fn comment(&mut self, text: &str) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.push_text(Opcode::Comment, text);
        Ok(())
    }

    pub fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), EncodeError> {
        self.ensure_open()?;
        self.push_opcode(Opcode::ProcessingInstruction);
        self.push_str(target);
        self.channels.strings.append(Arc::from(data));
        Ok(())
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Mark the current position with the namespaces declared so far
    pub fn mark(&self) -> Mark {
        self.mark_with_namespaces(self.namespaces.in_scope())
    }

    /// Mark the current position with caller-supplied namespace context
    pub fn mark_with_namespaces(&self, namespaces: NamespaceMap) -> Mark {
        tracing::debug!(depth = self.depth, bindings = namespaces.len(), "mark taken");
        Mark::capture(self.channels.snapshot(), namespaces)
            .with_metadata(self.interner.is_some(), self.system_id.clone())
    }

    /// Bindings in force at the current position
    pub fn in_scope_namespaces(&self) -> NamespaceMap {
        self.namespaces.in_scope()
    }

    /// Terminate the stream and hand out the buffer
    ///
    /// Further appends fail with `EncodeError::Finished` until `reset`.
    pub fn finish(&mut self) -> Result<Buffer, EncodeError> {
        self.ensure_open()?;
        self.push_opcode(Opcode::EndOfBuffer);
        self.finished = true;
        let [structure, strings, chars, objects] = self.channels.fragment_counts();
        tracing::debug!(
            trees = self.tree_count,
            structure,
            strings,
            chars,
            objects,
            "buffer finished"
        );
        Ok(Buffer::new(
            self.channels.start_snapshot(),
            self.tree_count,
            self.interner.is_some(),
            self.system_id.clone(),
        ))
    }

    /// Rewind for another pass over the same storage
    ///
    /// Buffers and marks from earlier passes must not be decoded afterwards.
    /// Fragments none of them still hold are refilled in place.
    pub fn reset(&mut self) {
        self.channels.rewind();
        if let Some(interner) = self.interner.as_mut() {
            interner.clear();
        }
        self.namespaces.clear();
        self.depth = 0;
        self.document_open = false;
        self.tree_count = 0;
        self.finished = false;
        self.system_id = None;
        tracing::debug!("encoder reset");
    }

    pub fn set_system_id(&mut self, system_id: impl Into<Arc<str>>) {
        self.system_id = Some(system_id.into());
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Open element depth
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Top-level trees started so far
    #[inline]
    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Fragments in use per channel: structure, strings, chars, objects
    pub fn fragment_counts(&self) -> [usize; 4] {
        self.channels.fragment_counts()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    #[inline]
    fn ensure_open(&self) -> Result<(), EncodeError> {
        if self.finished {
            return Err(EncodeError::Finished);
        }
        Ok(())
    }

    #[inline]
    fn push_opcode(&mut self, opcode: Opcode) {
        self.channels.structure.append(opcode.to_byte());
    }

    /// Append a name part, through the interner when enabled
    fn push_str(&mut self, s: &str) -> Arc<str> {
        let s = match self.interner.as_mut() {
            Some(interner) => interner.intern(s),
            None => Arc::from(s),
        };
        self.channels.strings.append(Arc::clone(&s));
        s
    }

    fn push_arc(&mut self, s: &Arc<str>) {
        let s = match self.interner.as_mut() {
            Some(interner) => interner.intern_arc(s),
            None => Arc::clone(s),
        };
        self.channels.strings.append(s);
    }

    fn push_name(&mut self, name: &QName) {
        if let Some(prefix) = &name.prefix {
            self.push_arc(prefix);
        }
        if let Some(uri) = &name.namespace_uri {
            self.push_arc(uri);
        }
        self.push_arc(&name.local_name);
    }

    fn push_text(&mut self, opcode: fn(TextTier) -> Opcode, text: &str) {
        let len = text.len();
        let (tier, advance) = route_text(
            len,
            self.channels.chars.remaining(),
            self.config.copy_threshold,
        );
        tracing::trace!(len, ?tier, advance, "character run routed");
        self.push_opcode(opcode(tier));
        match tier {
            TextTier::Small => {
                self.channels.structure.append(len as u8);
            }
            TextTier::Medium => {
                self.channels.structure.append((len >> 8) as u8);
                self.channels.structure.append(len as u8);
            }
            TextTier::Copy | TextTier::Shared => {
                self.channels.objects.append(Arc::from(text));
                return;
            }
        }
        if advance {
            self.channels.chars.advance();
        }
        self.channels.chars.append_run(text.as_bytes());
    }
}

#[inline]
fn name_flags(name: &QName) -> NameFlags {
    NameFlags {
        prefix: name.prefix.is_some(),
        uri: name.namespace_uri.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{MEDIUM_LIMIT, SMALL_LIMIT};
    use crate::view::InfosetView;

    fn small_config() -> EncoderConfig {
        EncoderConfig::default()
            .with_chunks(4, 4, 16, 2)
            .with_copy_threshold(8)
    }

    #[test]
    fn test_tree_count_for_forest() {
        let mut encoder = StructuralEncoder::new();
        for name in ["a", "b"] {
            encoder.start_element(&QName::local(name)).unwrap();
            encoder.end_element().unwrap();
        }
        assert_eq!(encoder.tree_count(), 2);
        let buffer = encoder.finish().unwrap();
        assert!(buffer.is_forest());
    }

    #[test]
    fn test_document_counts_as_one_tree() {
        let mut encoder = StructuralEncoder::new();
        encoder.start_document().unwrap();
        encoder.start_element(&QName::local("a")).unwrap();
        encoder.end_element().unwrap();
        encoder.end_document().unwrap();
        assert_eq!(encoder.tree_count(), 1);
    }

    #[test]
    fn test_unbalanced_ends() {
        let mut encoder = StructuralEncoder::new();
        let err = encoder.end_element().unwrap_err();
        assert_eq!(err.to_string(), "unbalanced end: no element is open");
        let err = encoder.end_document().unwrap_err();
        assert_eq!(err.to_string(), "unbalanced end: no document is open");

        encoder.start_document().unwrap();
        encoder.start_element(&QName::local("a")).unwrap();
        let err = encoder.end_document().unwrap_err();
        assert_eq!(err.to_string(), "unbalanced end: elements are still open");
    }

    #[test]
    fn test_append_after_finish() {
        let mut encoder = StructuralEncoder::new();
        encoder.finish().unwrap();
        assert_eq!(encoder.characters("x"), Err(EncodeError::Finished));
        assert!(encoder.finish().is_err());

        encoder.reset();
        assert!(encoder.characters("x").is_ok());
    }

    #[test]
    fn test_characters_at_range() {
        let mut encoder = StructuralEncoder::new();
        assert!(encoder.characters_at("hello", 1, 3).is_ok());
        assert_eq!(
            encoder.characters_at("hello", 4, 2),
            Err(EncodeError::InvalidRange {
                offset: 4,
                length: 2,
                available: 5
            })
        );
        // Not a char boundary
        assert!(encoder.characters_at("é", 1, 1).is_err());
        assert!(encoder.characters_at("abc", usize::MAX, 2).is_err());
    }

    #[test]
    fn test_short_run_inline() {
        let mut encoder = StructuralEncoder::with_config(small_config()).unwrap();
        encoder.characters("abc").unwrap();
        assert_eq!(encoder.channels.chars.current_index(), 3);
        assert_eq!(encoder.channels.objects.current_index(), 0);
    }

    #[test]
    fn test_run_that_does_not_fit_advances() {
        let mut encoder = StructuralEncoder::with_config(small_config()).unwrap();
        encoder.characters("0123456789ab").unwrap();
        // 7 bytes below the threshold but only 4 free
        encoder.characters("xyzwvut").unwrap();
        assert_eq!(encoder.fragment_counts()[2], 2);
        assert_eq!(encoder.channels.chars.current_index(), 7);
    }

    #[test]
    fn test_long_run_that_does_not_fit_is_copied() {
        let mut encoder = StructuralEncoder::with_config(small_config()).unwrap();
        encoder.characters("0123456789ab").unwrap();
        encoder.characters("this is far too long").unwrap();
        assert_eq!(encoder.fragment_counts()[2], 1);
        assert_eq!(encoder.channels.objects.current_index(), 1);
    }

    #[test]
    fn test_exact_fill_grows_chunk() {
        let mut encoder = StructuralEncoder::with_config(small_config()).unwrap();
        encoder.characters("0123456789abcdef").unwrap();
        assert_eq!(encoder.fragment_counts()[2], 2);
        assert_eq!(encoder.channels.chars.current_index(), 0);
    }

    #[test]
    fn test_tier_limits() {
        let config = EncoderConfig::default()
            .with_chunks(64, 64, MEDIUM_LIMIT * 2, 4)
            .with_copy_threshold(MEDIUM_LIMIT * 2);
        let mut encoder = StructuralEncoder::with_config(config).unwrap();

        encoder.characters(&"s".repeat(SMALL_LIMIT - 1)).unwrap();
        encoder.characters(&"m".repeat(SMALL_LIMIT)).unwrap();
        encoder.characters(&"c".repeat(MEDIUM_LIMIT)).unwrap();

        let inline = (SMALL_LIMIT - 1) + SMALL_LIMIT;
        assert_eq!(encoder.channels.chars.current_index(), inline);
        assert_eq!(encoder.channels.objects.current_index(), 1);
        // Small: op + 1 length byte; Medium: op + 2; Copy: op only
        assert_eq!(encoder.channels.structure.current_index(), 2 + 3 + 1);
    }

    #[test]
    fn test_interned_names_share_storage() {
        let config = EncoderConfig::default().with_interning();
        let mut encoder = StructuralEncoder::with_config(config).unwrap();
        let first = encoder.channels.strings.position();
        encoder.start_element(&QName::parse("item")).unwrap();
        encoder.end_element().unwrap();
        let second = encoder.channels.strings.position();
        encoder.start_element(&QName::parse("item")).unwrap();
        encoder.end_element().unwrap();

        let (a, b) = (first.get().unwrap(), second.get().unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(encoder.finish().unwrap().has_interned_strings());
    }

    #[test]
    fn test_mark_captures_declarations() {
        let mut encoder = StructuralEncoder::new();
        encoder.start_element(&QName::local("root")).unwrap();
        encoder.namespace_attribute(Some("p"), Some("urn:p")).unwrap();
        let mark = encoder.mark();
        assert_eq!(mark.in_scope_namespaces().get(Some("p")).map(|u| &**u), Some("urn:p"));

        encoder.end_element().unwrap();
        assert!(encoder.in_scope_namespaces().is_empty());
    }

    #[test]
    fn test_reset_reuses_fragments() {
        let mut encoder = StructuralEncoder::with_config(small_config()).unwrap();
        for _ in 0..10 {
            encoder.start_element(&QName::local("e")).unwrap();
            encoder.end_element().unwrap();
        }
        encoder.finish().unwrap();
        let used = encoder.fragment_counts()[0];
        assert!(used > 1);
        let head = Arc::as_ptr(encoder.channels.structure.start().fragment());

        encoder.reset();
        assert_eq!(encoder.fragment_counts(), [1, 1, 1, 1]);
        assert_eq!(Arc::as_ptr(encoder.channels.structure.start().fragment()), head);
        assert_eq!(encoder.tree_count(), 0);
        assert_eq!(encoder.depth(), 0);
    }
}
