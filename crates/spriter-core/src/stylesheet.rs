//! Rule/declaration stylesheet tree with round-trip serialization.
//!
//! The sprite pipeline needs to mutate individual declarations in place and
//! then serialize the whole sheet back out with everything else untouched, so
//! the tree keeps declarations as raw property/value strings and hands out
//! stable [`RuleId`]/[`DeclId`] identities assigned at parse time. At-rules
//! other than `@media` are carried through verbatim.

use thiserror::Error;

/// Error produced when the stylesheet text cannot be parsed.
#[derive(Debug, Error)]
#[error("stylesheet parse error at line {line}: {message}")]
pub struct ParseError {
    /// 1-based line of the offending input.
    pub line: usize,
    /// What the parser expected or found.
    pub message: String,
}

/// Stable identity of a rule within its stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u32);

/// Stable identity of a parsed declaration within its stylesheet.
///
/// Declarations inserted after parsing carry no id; identity checks against
/// them always fail, which is exactly what the rewriter wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(u32);

/// A single `property: value` declaration.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    id: Option<DeclId>,
}

impl Declaration {
    /// Create a declaration that did not come from parsed input.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            id: None,
        }
    }

    /// Identity assigned at parse time, if any.
    pub fn id(&self) -> Option<DeclId> {
        self.id
    }
}

/// A selector block with its declarations.
#[derive(Debug, Clone)]
pub struct Rule {
    id: RuleId,
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

impl Rule {
    pub fn id(&self) -> RuleId {
        self.id
    }
}

/// A `@media <condition> { ... }` block. Blocks may nest.
#[derive(Debug, Clone)]
pub struct MediaBlock {
    /// Condition text after the `@media` keyword, e.g.
    /// `(-webkit-min-device-pixel-ratio: 1.5)`.
    pub condition: String,
    pub items: Vec<Item>,
}

/// One top-level or nested stylesheet item.
#[derive(Debug, Clone)]
pub enum Item {
    Rule(Rule),
    Media(MediaBlock),
    /// Any other at-rule (`@import`, `@font-face`, `@keyframes`, ...),
    /// preserved verbatim.
    Other(String),
}

/// A parsed stylesheet.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub items: Vec<Item>,
}

impl Stylesheet {
    /// Parse stylesheet text into a tree.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut parser = Parser::new(input);
        let items = parser.parse_items(false)?;
        Ok(Self { items })
    }

    /// Look up a rule by identity anywhere in the tree.
    pub fn rule_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        find_rule_mut(&mut self.items, id)
    }

    /// Serialize the tree back to CSS text.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        write_items(&mut out, &self.items, 0);
        out
    }
}

fn find_rule_mut(items: &mut [Item], id: RuleId) -> Option<&mut Rule> {
    for item in items.iter_mut() {
        match item {
            Item::Rule(rule) => {
                if rule.id == id {
                    return Some(rule);
                }
            }
            Item::Media(block) => {
                if let Some(rule) = find_rule_mut(&mut block.items, id) {
                    return Some(rule);
                }
            }
            Item::Other(_) => {}
        }
    }
    None
}

fn write_items(out: &mut String, items: &[Item], indent: usize) {
    let pad = "  ".repeat(indent);
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        match item {
            Item::Rule(rule) => {
                for (i, selector) in rule.selectors.iter().enumerate() {
                    let separator = if i + 1 < rule.selectors.len() { ",\n" } else { " {\n" };
                    out.push_str(&pad);
                    out.push_str(selector);
                    out.push_str(separator);
                }
                for declaration in &rule.declarations {
                    out.push_str(&pad);
                    out.push_str("  ");
                    out.push_str(&declaration.property);
                    out.push_str(": ");
                    out.push_str(&declaration.value);
                    out.push_str(";\n");
                }
                out.push_str(&pad);
                out.push_str("}\n");
            }
            Item::Media(block) => {
                out.push_str(&pad);
                out.push_str("@media ");
                out.push_str(&block.condition);
                out.push_str(" {\n");
                write_items(out, &block.items, indent + 1);
                out.push_str(&pad);
                out.push_str("}\n");
            }
            Item::Other(raw) => {
                out.push_str(&pad);
                out.push_str(raw);
                out.push('\n');
            }
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    next_rule: u32,
    next_decl: u32,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            next_rule: 0,
            next_decl: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        if self.bytes.get(self.pos) == Some(&b'\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_ws_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
                self.bump();
            }
            // Scan over bytes: the cursor may sit inside a multi-byte
            // character while walking a comment body.
            if self.bytes[self.pos..].starts_with(b"/*") {
                let line = self.line;
                self.bump();
                self.bump();
                loop {
                    if self.peek().is_none() {
                        return Err(ParseError {
                            line,
                            message: "unterminated comment".into(),
                        });
                    }
                    if self.bytes[self.pos..].starts_with(b"*/") {
                        self.bump();
                        self.bump();
                        break;
                    }
                    self.bump();
                }
            } else {
                return Ok(());
            }
        }
    }

    fn parse_items(&mut self, nested: bool) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws_and_comments()?;
            match self.peek() {
                None => {
                    if nested {
                        return Err(self.err("unclosed block"));
                    }
                    break;
                }
                Some(b'}') => {
                    if nested {
                        self.bump();
                        break;
                    }
                    return Err(self.err("unexpected `}`"));
                }
                Some(b'@') => items.push(self.parse_at_rule()?),
                Some(_) => items.push(Item::Rule(self.parse_rule()?)),
            }
        }
        Ok(items)
    }

    fn parse_at_rule(&mut self) -> Result<Item, ParseError> {
        let start = self.pos;
        self.bump();
        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'-') {
            self.bump();
        }
        let name = &self.input[name_start..self.pos];
        let is_media = name == "media";

        let prelude_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated at-rule")),
                Some(b';') => {
                    self.bump();
                    return Ok(Item::Other(self.input[start..self.pos].trim().to_string()));
                }
                Some(b'{') => break,
                Some(_) => self.bump(),
            }
        }
        let prelude = self.input[prelude_start..self.pos].trim().to_string();

        if is_media {
            self.bump();
            let items = self.parse_items(true)?;
            return Ok(Item::Media(MediaBlock {
                condition: prelude,
                items,
            }));
        }

        // Other block at-rules pass through verbatim.
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.err("unclosed block")),
                Some(b'{') => {
                    depth += 1;
                    self.bump();
                }
                Some(b'}') => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                }
                Some(_) => self.bump(),
            }
        }
        Ok(Item::Other(self.input[start..self.pos].trim().to_string()))
    }

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let start = self.pos;
        // `;` and `}` inside quoted attribute values belong to the selector.
        let mut quote: Option<u8> = None;
        loop {
            match self.peek() {
                None => return Err(self.err("expected `{` after selector")),
                Some(c) => {
                    if let Some(q) = quote {
                        if c == q {
                            quote = None;
                        }
                        self.bump();
                        continue;
                    }
                    match c {
                        b'\'' | b'"' => {
                            quote = Some(c);
                            self.bump();
                        }
                        b'{' => break,
                        b'}' | b';' => {
                            return Err(self.err("expected `{` after selector"));
                        }
                        _ => self.bump(),
                    }
                }
            }
        }
        let selectors: Vec<String> = self.input[start..self.pos]
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if selectors.is_empty() {
            return Err(self.err("empty selector"));
        }
        self.bump();

        let declarations = self.parse_declarations()?;
        let id = RuleId(self.next_rule);
        self.next_rule += 1;
        Ok(Rule {
            id,
            selectors,
            declarations,
        })
    }

    fn parse_declarations(&mut self) -> Result<Vec<Declaration>, ParseError> {
        let mut declarations = Vec::new();
        loop {
            self.skip_ws_and_comments()?;
            match self.peek() {
                None => return Err(self.err("unclosed rule")),
                Some(b'}') => {
                    self.bump();
                    return Ok(declarations);
                }
                Some(b';') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            let property_start = self.pos;
            loop {
                match self.peek() {
                    None | Some(b'}') | Some(b';') => {
                        return Err(self.err("expected `:` in declaration"));
                    }
                    Some(b':') => break,
                    Some(_) => self.bump(),
                }
            }
            let property = self.input[property_start..self.pos].trim().to_string();
            self.bump();

            // Semicolons inside parentheses or quotes do not end the value.
            let value_start = self.pos;
            let mut depth = 0usize;
            let mut quote: Option<u8> = None;
            loop {
                match self.peek() {
                    None => return Err(self.err("unclosed rule")),
                    Some(c) => {
                        if let Some(q) = quote {
                            if c == q {
                                quote = None;
                            }
                            self.bump();
                            continue;
                        }
                        match c {
                            b'\'' | b'"' => {
                                quote = Some(c);
                                self.bump();
                            }
                            b'(' => {
                                depth += 1;
                                self.bump();
                            }
                            b')' => {
                                depth = depth.saturating_sub(1);
                                self.bump();
                            }
                            b';' | b'}' if depth == 0 => break,
                            _ => self.bump(),
                        }
                    }
                }
            }
            let value = self.input[value_start..self.pos].trim().to_string();
            let id = DeclId(self.next_decl);
            self.next_decl += 1;
            declarations.push(Declaration {
                property,
                value,
                id: Some(id),
            });
        }
    }
}
