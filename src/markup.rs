//! Inline markup – parses a fragment of `<b>`, `<color rgb='..'>`,
//! `<link href='..'>` style tags into a small tree and serialises it back.
//!
//! The parser is strict about structure: every opened tag must be closed by
//! a matching closing tag, otherwise the fragment is rejected with a
//! [`MarkupError`]. Tag names and attribute values are kept verbatim so a
//! parse → serialise round trip leaves the structure unchanged.

use std::fmt;

use crate::error::MarkupError;

// ---------------------------------------------------------------------------
// Tree types
// ---------------------------------------------------------------------------

/// A node in an inline-markup fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// A tag with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Lower-cased tag name.
    pub fn tag(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    fn is_void(&self) -> bool {
        is_void(&self.name)
    }
}

fn is_void(name: &str) -> bool {
    matches!(name.to_ascii_lowercase().as_str(), "br" | "img" | "hr")
}

/// A parsed fragment: a forest of top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        parse_fragment(markup).map(|nodes| Fragment { nodes })
    }

    /// Build a new fragment with `f` applied to every text leaf. Elements and
    /// their attributes are copied unchanged.
    pub fn map_text<F>(&self, mut f: F) -> Fragment
    where
        F: FnMut(&str) -> String,
    {
        Fragment {
            nodes: map_nodes(&self.nodes, &mut f),
        }
    }

    /// Text leaves in document order.
    pub fn text_leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_text(&self.nodes, &mut out);
        out
    }

    /// The tree with every text leaf blanked – two fragments with equal
    /// outlines differ only in leaf text.
    pub fn outline(&self) -> Fragment {
        self.map_text(|_| String::new())
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.nodes, &mut out);
        out
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

fn map_nodes<F>(nodes: &[Node], f: &mut F) -> Vec<Node>
where
    F: FnMut(&str) -> String,
{
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(text) => Node::Text(f(text)),
            Node::Element(e) => Node::Element(Element {
                name: e.name.clone(),
                attributes: e.attributes.clone(),
                children: map_nodes(&e.children, f),
            }),
        })
        .collect()
}

fn collect_text<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(text),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent over the fragment
// ---------------------------------------------------------------------------

/// Parse an inline-markup string into a list of nodes.
///
/// A `<` that is not followed by a tag name, `/` or `!` is literal text
/// (`5 < 6`). Anything that does start a tag has to be well-formed.
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>, MarkupError> {
    let mut parser = Parser::new(markup);
    let nodes = parser.parse_nodes(None)?;
    if let Some(offset) = parser.closing_tag_at() {
        let tag = parser.peek_closing_name();
        return Err(MarkupError::UnmatchedClosingTag { tag, offset });
    }
    Ok(nodes)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse siblings until EOF or a closing tag. `open` is the enclosing
    /// element's name and start offset, if any.
    fn parse_nodes(&mut self, open: Option<(&str, usize)>) -> Result<Vec<Node>, MarkupError> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        loop {
            if self.eof() {
                break;
            }
            if self.closing_tag_at().is_some() {
                break;
            }
            if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.at_tag_start() {
                flush_text(&mut text, &mut nodes);
                nodes.push(Node::Element(self.parse_element()?));
            } else {
                let c = self.current_char();
                self.advance(c);
                text.push(c);
            }
        }
        flush_text(&mut text, &mut nodes);

        if let Some((name, offset)) = open {
            if self.eof() {
                return Err(MarkupError::UnclosedTag {
                    tag: name.to_string(),
                    offset,
                });
            }
        }
        Ok(nodes)
    }

    fn parse_element(&mut self) -> Result<Element, MarkupError> {
        let start = self.pos;
        self.advance('<');
        let name = self.parse_name();
        let mut elem = Element::new(name);

        loop {
            self.skip_whitespace();
            if self.eof() {
                return Err(MarkupError::UnexpectedEof { offset: start });
            }
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(elem);
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            let (key, value) = self.parse_attribute(start)?;
            elem.attributes.push((key, value));
        }

        if elem.is_void() {
            return Ok(elem);
        }

        let name = elem.name.clone();
        elem.children = self.parse_nodes(Some((&name, start)))?;

        let close_at = self.pos;
        self.pos += 2; // "</"
        let found = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with(">") {
            return Err(MarkupError::MalformedTag { offset: close_at });
        }
        self.pos += 1;
        if !found.eq_ignore_ascii_case(&elem.name) {
            return Err(MarkupError::MismatchedClosingTag {
                expected: elem.name,
                found,
                offset: close_at,
            });
        }
        Ok(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(c);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self, tag_start: usize) -> Result<(String, String), MarkupError> {
        let key = self.parse_name();
        if key.is_empty() {
            return Err(MarkupError::MalformedTag { offset: self.pos });
        }
        self.skip_whitespace();
        if !self.starts_with("=") {
            return Ok((key, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = self.parse_attr_value(tag_start)?;
        Ok((key, value))
    }

    fn parse_attr_value(&mut self, tag_start: usize) -> Result<String, MarkupError> {
        if self.eof() {
            return Err(MarkupError::UnexpectedEof { offset: tag_start });
        }
        let quote = self.current_char();
        if quote == '"' || quote == '\'' {
            self.pos += 1;
            let start = self.pos;
            match self.input[start..].find(quote) {
                Some(len) => {
                    self.pos = start + len + 1;
                    Ok(decode_entities(&self.input[start..start + len]))
                }
                None => Err(MarkupError::UnexpectedEof { offset: tag_start }),
            }
        } else {
            let start = self.pos;
            while !self.eof() {
                let c = self.current_char();
                if c.is_whitespace() || c == '>' || self.starts_with("/>") {
                    break;
                }
                self.advance(c);
            }
            Ok(decode_entities(&self.input[start..self.pos]))
        }
    }

    fn skip_comment(&mut self) -> Result<(), MarkupError> {
        let start = self.pos;
        match self.input[start + 4..].find("-->") {
            Some(len) => {
                self.pos = start + 4 + len + 3;
                Ok(())
            }
            None => Err(MarkupError::UnexpectedEof { offset: start }),
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            let c = self.current_char();
            self.advance(c);
        }
    }

    /// `<` followed by an ASCII letter opens a tag.
    fn at_tag_start(&self) -> bool {
        let mut chars = self.input[self.pos..].chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// `</` followed by an ASCII letter closes a tag. Any other `</` is text.
    fn closing_tag_at(&self) -> Option<usize> {
        let rest = self.input[self.pos..].strip_prefix("</")?;
        rest.chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            .then_some(self.pos)
    }

    fn peek_closing_name(&mut self) -> String {
        self.pos += 2;
        self.parse_name()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Callers check `eof()` first.
    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, c: char) {
        self.pos += c.len_utf8();
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(decode_entities(text)));
        text.clear();
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end))) {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Serialiser
// ---------------------------------------------------------------------------

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => escape_into(text, false, out),
            Node::Element(e) => {
                out.push('<');
                out.push_str(&e.name);
                for (key, value) in &e.attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if e.is_void() {
                    continue;
                }
                write_nodes(&e.children, out);
                out.push_str("</");
                out.push_str(&e.name);
                out.push('>');
            }
        }
    }
}

/// Escape `s` so it can be spliced into markup as text or a quoted
/// attribute value.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(s, true, &mut out);
    out.replace('\'', "&apos;")
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_text_parses_back_literally() {
        let raw = "a<b>&'\"";
        let escaped = escape(raw);
        assert_eq!(escaped, "a&lt;b&gt;&amp;&apos;&quot;");
        let f = Fragment::parse(&escaped).unwrap();
        assert_eq!(f.text_leaves(), vec![raw]);
    }

    #[test]
    fn plain_text_is_a_single_leaf() {
        let f = Fragment::parse("Hello world").unwrap();
        assert_eq!(f.nodes, vec![Node::Text("Hello world".into())]);
    }

    #[test]
    fn parse_nested_tags() {
        let f = Fragment::parse("<color rgb='326d92'><link href='mailto:a@b.com'><b>a@b.com</b></link></color> tail")
            .unwrap();
        assert_eq!(f.nodes.len(), 2);
        match &f.nodes[0] {
            Node::Element(color) => {
                assert_eq!(color.tag(), "color");
                assert_eq!(color.attr("rgb"), Some("326d92"));
                match &color.children[0] {
                    Node::Element(link) => assert_eq!(link.attr("href"), Some("mailto:a@b.com")),
                    other => panic!("Expected link, got {other:?}"),
                }
            }
            other => panic!("Expected element, got {other:?}"),
        }
        assert_eq!(f.text_leaves(), vec!["a@b.com", " tail"]);
    }

    #[test]
    fn serialise_normalises_quotes_only() {
        let f = Fragment::parse("<b>x</b> &amp; <color rgb='eee'>y</color>").unwrap();
        assert_eq!(f.to_markup(), "<b>x</b> &amp; <color rgb=\"eee\">y</color>");
        assert_eq!(Fragment::parse(&f.to_markup()).unwrap(), f);
    }

    #[test]
    fn void_tags_have_no_children() {
        let f = Fragment::parse("a<br>b<br/>c").unwrap();
        assert_eq!(f.text_leaves(), vec!["a", "b", "c"]);
        assert_eq!(f.to_markup(), "a<br>b<br>c");
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let f = Fragment::parse("5 < 6").unwrap();
        assert_eq!(f.text_leaves(), vec!["5 < 6"]);
    }

    #[test]
    fn slash_after_angle_bracket_is_text() {
        let f = Fragment::parse("1 </ 2").unwrap();
        assert_eq!(f.nodes, vec![Node::Text("1 </ 2".into())]);
        let f = Fragment::parse("<b>a </ b</b>").unwrap();
        assert_eq!(f.text_leaves(), vec!["a </ b"]);
    }

    #[test]
    fn numeric_entities_decode() {
        let f = Fragment::parse("&#1576;&#x628;").unwrap();
        assert_eq!(f.text_leaves(), vec!["بب"]);
    }

    #[test]
    fn unclosed_tag_is_rejected() {
        assert_eq!(
            Fragment::parse("<b>bold"),
            Err(MarkupError::UnclosedTag {
                tag: "b".into(),
                offset: 0
            })
        );
    }

    #[test]
    fn mismatched_tag_is_rejected() {
        assert!(matches!(
            Fragment::parse("<b><i>x</b></i>"),
            Err(MarkupError::MismatchedClosingTag { .. })
        ));
    }

    #[test]
    fn stray_closing_tag_is_rejected() {
        assert_eq!(
            Fragment::parse("x</b>"),
            Err(MarkupError::UnmatchedClosingTag {
                tag: "b".into(),
                offset: 1
            })
        );
    }

    #[test]
    fn unterminated_attribute_is_rejected() {
        assert!(matches!(
            Fragment::parse("<color rgb='326d92>x</color>"),
            Err(MarkupError::UnexpectedEof { offset: 0 })
        ));
    }

    #[test]
    fn map_text_keeps_outline() {
        let f = Fragment::parse("<b>one</b> two <i>three</i>").unwrap();
        let upper = f.map_text(|t| t.to_uppercase());
        assert_eq!(upper.outline(), f.outline());
        assert_eq!(upper.text_leaves(), vec!["ONE", " TWO ", "THREE"]);
    }
}
