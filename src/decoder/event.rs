//! Decoded Events

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::name::QName;

/// Character data as it was stored
///
/// Inline runs are copied out of the shared character channel; out-of-line
/// runs hand back the stored `Arc` without copying.
#[derive(Debug, Clone, Eq)]
pub enum CharData {
    Inline(String),
    Object(Arc<str>),
}

impl CharData {
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            CharData::Inline(s) => s,
            CharData::Object(s) => s,
        }
    }

    /// True when the run was stored out of line
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, CharData::Object(_))
    }

    pub fn into_string(self) -> String {
        match self {
            CharData::Inline(s) => s,
            CharData::Object(s) => s.to_string(),
        }
    }
}

// Storage tier is not part of the content
impl PartialEq for CharData {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Deref for CharData {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CharData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CharData {
    fn from(s: &str) -> Self {
        CharData::Inline(s.to_owned())
    }
}

/// One infoset event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartDocument,
    EndDocument,
    StartElement {
        name: QName,
    },
    EndElement,
    Attribute {
        name: QName,
        value: Arc<str>,
    },
    /// `None` prefix is the default namespace; `None` uri undeclares
    NamespaceDeclaration {
        prefix: Option<Arc<str>>,
        uri: Option<Arc<str>>,
    },
    Characters(CharData),
    Comment(CharData),
    ProcessingInstruction {
        target: Arc<str>,
        data: Arc<str>,
    },
    /// The terminal opcode, or the end of a mark's single item
    EndOfStream,
}

impl Event {
    /// Shorthand for an unqualified start tag
    pub fn start(local_name: &str) -> Self {
        Event::StartElement {
            name: QName::local(local_name),
        }
    }

    pub fn text(text: &str) -> Self {
        Event::Characters(CharData::from(text))
    }

    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Event::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_data_equality_ignores_tier() {
        let inline = CharData::Inline("abc".to_string());
        let object = CharData::Object(Arc::from("abc"));
        assert_eq!(inline, object);
        assert!(object.is_object());
        assert_eq!(Event::Characters(inline), Event::text("abc"));
    }

    #[test]
    fn test_char_data_deref() {
        let data = CharData::Object(Arc::from("hello"));
        assert_eq!(data.len(), 5);
        assert_eq!(data.to_string(), "hello");
        assert_eq!(data.into_string(), "hello");
    }
}
