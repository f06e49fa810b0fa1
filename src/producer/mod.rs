//! XML Text Producer
//!
//! Drives a `StructuralEncoder` from XML text, the way a streaming parser
//! would. The input is treated as one document:
//!
//! - the XML declaration and DOCTYPE are consumed without events
//! - `xmlns`/`xmlns:p` attributes become namespace declarations and element
//!   and attribute prefixes are resolved against them
//! - CDATA sections become character data
//! - predefined and numeric entity references are decoded
//!
//! Well-formedness checking stops at tag balance and prefix resolution.

pub mod entities;
pub mod scanner;

use std::borrow::Cow;

use self::entities::decode_text;
use self::scanner::Scanner;
use crate::buffer::Buffer;
use crate::encoder::{EncoderConfig, StructuralEncoder};
use crate::error::ProduceError;
use crate::name::QName;
use crate::namespace::NamespaceStack;

/// Encode an XML document with the default configuration
pub fn encode_xml(input: &str) -> Result<Buffer, ProduceError> {
    let mut encoder = StructuralEncoder::new();
    encode_xml_into(input, &mut encoder)?;
    Ok(encoder.finish()?)
}

pub fn encode_xml_with_config(input: &str, config: EncoderConfig) -> Result<Buffer, ProduceError> {
    let mut encoder = StructuralEncoder::with_config(config)?;
    encode_xml_into(input, &mut encoder)?;
    Ok(encoder.finish()?)
}

/// Append an XML document to an existing encoder
///
/// The encoder is left unfinished, so callers can take marks or append
/// further content before calling `finish`.
pub fn encode_xml_into(input: &str, encoder: &mut StructuralEncoder) -> Result<(), ProduceError> {
    Producer {
        scanner: Scanner::new(input),
        encoder,
        namespaces: NamespaceStack::new(),
        open: Vec::new(),
    }
    .run()?;
    tracing::debug!(bytes = input.len(), "xml document encoded");
    Ok(())
}

struct Producer<'a, 'e> {
    scanner: Scanner<'a>,
    encoder: &'e mut StructuralEncoder,
    namespaces: NamespaceStack,
    /// Qualified names of open elements
    open: Vec<&'a str>,
}

impl<'a> Producer<'a, '_> {
    fn run(mut self) -> Result<(), ProduceError> {
        self.encoder.start_document()?;
        loop {
            let text_start = self.scanner.position();
            let text = self.scanner.read_text();
            if !text.is_empty() {
                self.text(text, text_start)?;
            }
            if self.scanner.is_eof() {
                break;
            }
            let tag_start = self.scanner.position();
            self.scanner.advance(1);
            if self.scanner.eat("?") {
                self.processing_instruction(tag_start)?;
            } else if self.scanner.eat("!--") {
                let body = self
                    .scanner
                    .read_until_str("-->")
                    .ok_or_else(|| ProduceError::syntax("unterminated comment", tag_start))?;
                self.encoder.comment(body)?;
            } else if self.scanner.eat("![CDATA[") {
                let body = self
                    .scanner
                    .read_until_str("]]>")
                    .ok_or_else(|| ProduceError::syntax("unterminated CDATA section", tag_start))?;
                if self.open.is_empty() {
                    return Err(ProduceError::syntax("CDATA outside the root element", tag_start));
                }
                self.encoder.characters(body)?;
            } else if self.scanner.eat("!DOCTYPE") {
                self.scanner
                    .skip_doctype()
                    .ok_or_else(|| ProduceError::syntax("unterminated DOCTYPE", tag_start))?;
            } else if self.scanner.eat("/") {
                self.end_tag(tag_start)?;
            } else {
                self.start_tag(tag_start)?;
            }
        }
        if let Some(name) = self.open.last() {
            return Err(ProduceError::Unclosed(name.to_string()));
        }
        self.encoder.end_document()?;
        Ok(())
    }

    fn text(&mut self, raw: &str, position: usize) -> Result<(), ProduceError> {
        if self.open.is_empty() {
            if raw.trim().is_empty() {
                return Ok(());
            }
            return Err(ProduceError::syntax("text outside the root element", position));
        }
        let text = decode_text(raw).map_err(|message| ProduceError::syntax(message, position))?;
        self.encoder.characters(&text)?;
        Ok(())
    }

    fn processing_instruction(&mut self, position: usize) -> Result<(), ProduceError> {
        let target = self
            .scanner
            .read_name()
            .ok_or_else(|| ProduceError::syntax("expected processing instruction target", position))?;
        let body = self
            .scanner
            .read_until_str("?>")
            .ok_or_else(|| ProduceError::syntax("unterminated processing instruction", position))?;
        // The XML declaration is not part of the infoset
        if target.eq_ignore_ascii_case("xml") {
            return Ok(());
        }
        self.encoder.processing_instruction(target, body.trim_start())?;
        Ok(())
    }

    fn end_tag(&mut self, position: usize) -> Result<(), ProduceError> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ProduceError::syntax("expected end tag name", position))?;
        self.scanner.skip_whitespace();
        if !self.scanner.eat(">") {
            return Err(ProduceError::syntax("expected '>' after end tag name", position));
        }
        match self.open.pop() {
            Some(expected) if expected == name => {}
            Some(expected) => {
                return Err(ProduceError::MismatchedEndTag {
                    expected: expected.to_string(),
                    found: name.to_string(),
                    position,
                })
            }
            None => return Err(ProduceError::syntax("end tag without start tag", position)),
        }
        self.encoder.end_element()?;
        self.namespaces.pop_scope();
        Ok(())
    }

    fn start_tag(&mut self, position: usize) -> Result<(), ProduceError> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ProduceError::syntax("expected element name", position))?;

        let mut attributes: Vec<(&'a str, Cow<'a, str>)> = Vec::new();
        let empty = loop {
            self.scanner.skip_whitespace();
            if self.scanner.eat("/>") {
                break true;
            }
            if self.scanner.eat(">") {
                break false;
            }
            let attr_start = self.scanner.position();
            let attr_name = self
                .scanner
                .read_name()
                .ok_or_else(|| ProduceError::syntax("expected attribute name", attr_start))?;
            self.scanner.skip_whitespace();
            if !self.scanner.eat("=") {
                return Err(ProduceError::syntax("expected '=' after attribute name", attr_start));
            }
            self.scanner.skip_whitespace();
            let raw = self
                .scanner
                .read_quoted()
                .ok_or_else(|| ProduceError::syntax("expected quoted attribute value", attr_start))?;
            let value =
                decode_text(raw).map_err(|message| ProduceError::syntax(message, attr_start))?;
            attributes.push((attr_name, value));
        };

        // Declarations on this tag are in scope for its own name
        self.namespaces.push_scope();
        let mut declarations = Vec::new();
        for (attr_name, value) in &attributes {
            let prefix = match *attr_name {
                "xmlns" => None,
                other => match other.strip_prefix("xmlns:") {
                    Some(prefix) => Some(prefix),
                    None => continue,
                },
            };
            let uri = (!value.is_empty()).then_some(&**value);
            self.namespaces
                .declare(prefix.map(Into::into), uri.map(Into::into));
            declarations.push((prefix, uri));
        }

        let element = self.resolve(name, true)?;
        self.encoder.start_element(&element)?;
        for (prefix, uri) in declarations {
            self.encoder.namespace_attribute(prefix, uri)?;
        }
        for (attr_name, value) in &attributes {
            if *attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
                continue;
            }
            let attribute = self.resolve(attr_name, false)?;
            self.encoder.attribute(&attribute, value)?;
        }

        if empty {
            self.encoder.end_element()?;
            self.namespaces.pop_scope();
        } else {
            self.open.push(name);
        }
        Ok(())
    }

    /// Resolve a lexical name; unprefixed attributes take no namespace
    fn resolve(&self, lexical: &str, use_default: bool) -> Result<QName, ProduceError> {
        let name = QName::parse(lexical);
        let uri = match name.prefix.as_deref() {
            Some(prefix) => Some(
                self.namespaces
                    .resolve(Some(prefix))
                    .ok_or_else(|| ProduceError::UndeclaredPrefix(prefix.to_string()))?,
            ),
            None if use_default => self.namespaces.resolve(None),
            None => None,
        };
        Ok(match uri {
            Some(uri) => name.with_namespace(uri),
            None => name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{collect, Event, ReplayMode};
    use std::sync::Arc;

    fn events(xml: &str) -> Vec<Event> {
        collect(&encode_xml(xml).unwrap(), ReplayMode::Fragment).unwrap()
    }

    #[test]
    fn test_simple_document() {
        assert_eq!(
            events("<?xml version=\"1.0\"?>\n<a><b>hi</b></a>\n"),
            vec![
                Event::start("a"),
                Event::start("b"),
                Event::text("hi"),
                Event::EndElement,
                Event::EndElement,
            ]
        );
    }

    #[test]
    fn test_namespaces_resolved() {
        let got = events(r#"<r xmlns="urn:d" xmlns:p="urn:p"><p:c p:x="1" y="2"/></r>"#);
        assert_eq!(
            got[0],
            Event::StartElement {
                name: QName::new(None, Some("urn:d"), "r")
            }
        );
        assert_eq!(
            got[1],
            Event::NamespaceDeclaration {
                prefix: None,
                uri: Some(Arc::from("urn:d"))
            }
        );
        assert_eq!(
            got[3],
            Event::StartElement {
                name: QName::new(Some("p"), Some("urn:p"), "c")
            }
        );
        assert_eq!(
            got[4],
            Event::Attribute {
                name: QName::new(Some("p"), Some("urn:p"), "x"),
                value: Arc::from("1")
            }
        );
        assert_eq!(
            got[5],
            Event::Attribute {
                name: QName::local("y"),
                value: Arc::from("2")
            }
        );
    }

    #[test]
    fn test_entities_cdata_comment_pi() {
        let got = events("<!DOCTYPE r><r>a&amp;b<![CDATA[<raw>]]><!--c--><?go now?></r>");
        assert_eq!(
            got,
            vec![
                Event::start("r"),
                Event::text("a&b"),
                Event::text("<raw>"),
                Event::Comment("c".into()),
                Event::ProcessingInstruction {
                    target: Arc::from("go"),
                    data: Arc::from("now")
                },
                Event::EndElement,
            ]
        );
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(matches!(
            encode_xml("<a><b></a>"),
            Err(ProduceError::MismatchedEndTag { ref expected, ref found, .. })
                if expected == "b" && found == "a"
        ));
    }

    #[test]
    fn test_unclosed_and_undeclared() {
        assert_eq!(encode_xml("<a><b/>").unwrap_err(), ProduceError::Unclosed("a".into()));
        assert_eq!(
            encode_xml("<q:a/>").unwrap_err(),
            ProduceError::UndeclaredPrefix("q".into())
        );
    }

    #[test]
    fn test_text_outside_root() {
        assert!(matches!(
            encode_xml("stray<a/>"),
            Err(ProduceError::Syntax { position: 0, .. })
        ));
    }

    #[test]
    fn test_encode_into_allows_marks() {
        let mut encoder = StructuralEncoder::new();
        let mark = encoder.mark();
        encode_xml_into("<only/>", &mut encoder).unwrap();
        let got = collect(&mark, ReplayMode::Fragment).unwrap();
        assert_eq!(got, vec![Event::start("only"), Event::EndElement]);
    }

    #[test]
    fn test_invalid_config() {
        let config = EncoderConfig::default().with_chunks(0, 1, 4096, 1);
        assert!(matches!(
            encode_xml_with_config("<a/>", config),
            Err(ProduceError::Config(_))
        ));
    }
}
