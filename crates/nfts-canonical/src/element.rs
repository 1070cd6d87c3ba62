//! Owned XML element tree.
//!
//! Record documents are small and are rewritten in place (signature insertion,
//! child reordering), so they are held as a plain owned tree rather than a
//! borrowed DOM. Matching is always by local name; prefixes and namespace
//! declarations are carried through untouched.

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use thiserror::Error;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Declaration written in front of serialized documents.
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>\n";

/// Error returned when a document cannot be read into an element tree.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Input bytes are not UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    /// The XML declaration names an encoding other than UTF-8.
    #[error("unsupported document encoding '{0}' (only UTF-8 is accepted)")]
    UnsupportedEncoding(String),
    /// The XML is not well formed.
    #[error("malformed XML: {0}")]
    Malformed(String),
    /// No element was found at all.
    #[error("document has no root element")]
    NoRoot,
}

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified name as written (`prefix:local` or `local`).
    pub name: String,
    /// Attributes in document order, namespace declarations included.
    pub attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

/// Returns the local part of a qualified name.
pub fn local_name(qualified: &str) -> &str {
    match qualified.rsplit_once(':') {
        Some((_, local)) => local,
        None => qualified,
    }
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a leaf element carrying text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Appends a child and returns `self`, for building trees inline.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends an attribute and returns `self`.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Local part of this element's name.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Text content, or the empty string when there is none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// First child with the given local name.
    pub fn find_child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// First child with the given local name, mutably.
    pub fn find_child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.local_name() == local)
    }

    /// Removes every child with the given local name; returns how many were removed.
    pub fn remove_children(&mut self, local: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.local_name() != local);
        before - self.children.len()
    }

    /// Elements with the given local name in document order, this element included.
    ///
    /// A matching element is not searched further, so units never nest.
    pub fn descendants_named(&self, local: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_named(self, local, &mut found);
        found
    }

    /// Mutable variant of [`Element::descendants_named`].
    pub fn descendants_named_mut(&mut self, local: &str) -> Vec<&mut Element> {
        let mut found = Vec::new();
        collect_named_mut(self, local, &mut found);
        found
    }

    /// Serializes the tree as a complete UTF-8 document with declaration.
    pub fn to_document_bytes(&self) -> Vec<u8> {
        let mut out = String::from(XML_DECLARATION);
        self.write_to(&mut out);
        out.into_bytes()
    }

    /// Serializes the tree without declaration.
    pub fn to_fragment_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Appends the serialized element to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }
        let text = self.text();
        if text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        escape_text(text, out);
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn collect_named<'a>(element: &'a Element, local: &str, found: &mut Vec<&'a Element>) {
    if element.local_name() == local {
        found.push(element);
        return;
    }
    for child in &element.children {
        collect_named(child, local, found);
    }
}

fn collect_named_mut<'a>(element: &'a mut Element, local: &str, found: &mut Vec<&'a mut Element>) {
    if element.local_name() == local {
        found.push(element);
        return;
    }
    for child in element.children.iter_mut() {
        collect_named_mut(child, local, found);
    }
}

/// Escapes character data the way libxml2 serializes text nodes.
pub fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

/// Parses a UTF-8 document into its root element.
///
/// Comments, processing instructions and DOCTYPE are dropped. Whitespace-only
/// text inside elements that have child elements is discarded; leaf text is
/// kept verbatim up to the first comment or processing instruction.
pub fn parse_document(bytes: &[u8]) -> Result<Element, DocumentError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let source =
        std::str::from_utf8(bytes).map_err(|e| DocumentError::InvalidUtf8(e.to_string()))?;

    let mut reader = Reader::from_str(source);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocumentError::Malformed(e.to_string()))?;
        match event {
            Event::Decl(decl) => check_encoding(&decl)?,
            Event::Start(start) => stack.push(OpenElement::new(open_element(&start)?)),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| DocumentError::Malformed("unexpected closing tag".into()))?;
                attach(close_element(open.element), &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let raw = utf8(&text)?;
                let value = quick_xml::escape::unescape(&normalize_newlines(raw))
                    .map_err(|e| DocumentError::Malformed(e.to_string()))?
                    .into_owned();
                push_text(&mut stack, &value)?;
            }
            Event::CData(data) => {
                let value = normalize_newlines(utf8(&data)?).into_owned();
                push_text(&mut stack, &value)?;
            }
            Event::Comment(_) | Event::PI(_) => {
                if let Some(open) = stack.last_mut() {
                    open.text_closed = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DocumentError::Malformed(format!(
            "unclosed element <{}>",
            open.element.name
        )));
    }
    root.ok_or(DocumentError::NoRoot)
}

fn utf8(bytes: &[u8]) -> Result<&str, DocumentError> {
    std::str::from_utf8(bytes).map_err(|e| DocumentError::InvalidUtf8(e.to_string()))
}

fn check_encoding(decl: &BytesDecl<'_>) -> Result<(), DocumentError> {
    if let Some(encoding) = decl.encoding() {
        let encoding = encoding.map_err(|e| DocumentError::Malformed(e.to_string()))?;
        let label = String::from_utf8_lossy(&encoding);
        if !label.eq_ignore_ascii_case("utf-8") && !label.eq_ignore_ascii_case("utf8") {
            return Err(DocumentError::UnsupportedEncoding(label.into_owned()));
        }
    }
    Ok(())
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| DocumentError::Malformed(e.to_string()))?;
        let name = utf8(attribute.key.as_ref())?.to_string();
        let raw = normalize_newlines(utf8(&attribute.value)?).replace(['\t', '\n'], " ");
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| DocumentError::Malformed(e.to_string()))?
            .into_owned();
        element.attributes.push((name, value));
    }
    Ok(element)
}

fn close_element(mut element: Element) -> Element {
    let blank = element.text().chars().all(char::is_whitespace);
    if !element.children.is_empty() && blank {
        element.text = None;
    }
    element
}

/// Element being parsed.
///
/// Leaf text ends at the first child element, comment or processing
/// instruction; later character data is not part of it.
struct OpenElement {
    element: Element,
    text_closed: bool,
}

impl OpenElement {
    fn new(element: Element) -> Self {
        Self {
            element,
            text_closed: false,
        }
    }
}

fn attach(
    element: Element,
    stack: &mut [OpenElement],
    root: &mut Option<Element>,
) -> Result<(), DocumentError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.element.children.push(element);
            parent.text_closed = true;
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(DocumentError::Malformed("more than one root element".into())),
    }
}

fn push_text(stack: &mut [OpenElement], value: &str) -> Result<(), DocumentError> {
    let Some(current) = stack.last_mut() else {
        if value.chars().all(char::is_whitespace) {
            return Ok(());
        }
        return Err(DocumentError::Malformed(
            "character data outside the root element".into(),
        ));
    };
    if !current.text_closed {
        current
            .element
            .text
            .get_or_insert_with(String::new)
            .push_str(value);
    }
    Ok(())
}

/// Applies XML end-of-line handling before references are resolved.
fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\r') {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
}
