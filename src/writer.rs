//! XML Writer
//!
//! An `InfosetSink` that renders replayed events back to XML text. Start
//! tags stay open until the first non-attribute event so attributes and
//! namespace declarations land inside them. Bindings a view inherited are
//! declared on each top-level element so the output stands on its own.
//! Comments containing `--` and PI data containing `?>` have no XML
//! spelling; writing one fails with `fmt::Error`.

use std::fmt;
use std::sync::Arc;

use memchr::{memchr, memchr3, memmem};

use crate::decoder::{replay, CharData, InfosetSink, ReplayMode};
use crate::error::ReplayError;
use crate::name::QName;
use crate::namespace::NamespaceMap;
use crate::view::InfosetView;

/// Sink writing XML text to any `fmt::Write`
#[derive(Debug)]
pub struct XmlWriter<W: fmt::Write> {
    out: W,
    open: Vec<QName>,
    /// A start tag is waiting for its closing '>'
    pending: bool,
    inherited: NamespaceMap,
    /// Prefixes declared on the pending start tag
    declared_here: Vec<Option<Arc<str>>>,
}

impl<W: fmt::Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            open: Vec::new(),
            pending: false,
            inherited: NamespaceMap::new(),
            declared_here: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_start_tag(&mut self, terminator: &str) -> fmt::Result {
        if !self.pending {
            return Ok(());
        }
        self.pending = false;
        if self.open.len() == 1 {
            for (prefix, uri) in self.inherited.iter() {
                if self.declared_here.iter().any(|p| p.as_deref() == prefix) {
                    continue;
                }
                write_xmlns(&mut self.out, prefix, uri)?;
            }
        }
        self.out.write_str(terminator)
    }
}

impl<W: fmt::Write> InfosetSink for XmlWriter<W> {
    type Error = fmt::Error;

    fn inherited_namespaces(&mut self, namespaces: &NamespaceMap) -> fmt::Result {
        self.inherited = namespaces.clone();
        Ok(())
    }

    fn start_element(&mut self, name: QName) -> fmt::Result {
        self.close_start_tag(">")?;
        write!(self.out, "<{}", name)?;
        self.open.push(name);
        self.pending = true;
        self.declared_here.clear();
        Ok(())
    }

    fn end_element(&mut self) -> fmt::Result {
        if self.pending {
            self.close_start_tag("/>")?;
            self.open.pop();
            return Ok(());
        }
        let name = self.open.pop().ok_or(fmt::Error)?;
        write!(self.out, "</{}>", name)
    }

    fn attribute(&mut self, name: QName, value: Arc<str>) -> fmt::Result {
        if !self.pending {
            return Err(fmt::Error);
        }
        write!(self.out, " {}=\"", name)?;
        escape_to(&mut self.out, &value, true)?;
        self.out.write_char('"')
    }

    fn namespace_declaration(&mut self, prefix: Option<Arc<str>>, uri: Option<Arc<str>>) -> fmt::Result {
        if !self.pending {
            return Err(fmt::Error);
        }
        write_xmlns(&mut self.out, prefix.as_deref(), uri.as_deref().unwrap_or(""))?;
        self.declared_here.push(prefix);
        Ok(())
    }

    fn characters(&mut self, text: CharData) -> fmt::Result {
        self.close_start_tag(">")?;
        escape_to(&mut self.out, &text, false)
    }

    fn comment(&mut self, text: CharData) -> fmt::Result {
        if memmem::find(text.as_bytes(), b"--").is_some() || text.ends_with('-') {
            return Err(fmt::Error);
        }
        self.close_start_tag(">")?;
        write!(self.out, "<!--{}-->", text)
    }

    fn processing_instruction(&mut self, target: Arc<str>, data: Arc<str>) -> fmt::Result {
        if memmem::find(data.as_bytes(), b"?>").is_some() {
            return Err(fmt::Error);
        }
        self.close_start_tag(">")?;
        if data.is_empty() {
            write!(self.out, "<?{}?>", target)
        } else {
            write!(self.out, "<?{} {}?>", target, data)
        }
    }
}

fn write_xmlns<W: fmt::Write>(out: &mut W, prefix: Option<&str>, uri: &str) -> fmt::Result {
    match prefix {
        Some(prefix) => write!(out, " xmlns:{}=\"", prefix)?,
        None => out.write_str(" xmlns=\"")?,
    }
    escape_to(out, uri, true)?;
    out.write_char('"')
}

/// Escape XML special characters
///
/// Uses memchr to pass clean runs through untouched.
fn escape_to<W: fmt::Write>(out: &mut W, s: &str, in_attribute: bool) -> fmt::Result {
    let bytes = s.as_bytes();
    let clean = memchr3(b'&', b'<', b'>', bytes).is_none()
        && !(in_attribute && memchr(b'"', bytes).is_some());
    if clean {
        return out.write_str(s);
    }
    for c in s.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' if in_attribute => out.write_str("&quot;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}

/// Render a buffer or mark as XML text
pub fn to_xml_string<V: InfosetView + ?Sized>(
    view: &V,
    mode: ReplayMode,
) -> Result<String, ReplayError<fmt::Error>> {
    let mut writer = XmlWriter::new(String::new());
    replay(view, &mut writer, mode)?;
    Ok(writer.into_inner())
}
