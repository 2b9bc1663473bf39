//! Lean 4 parser adapter.
//!
//! Scans a source buffer into a small syntax tree: a root node holding the
//! import header and one node per top-level command. The tree captures
//! exactly the structure the mutation operators need to locate sites
//! (identifiers, literals, infix operator atoms, bracketed groups, unary
//! negation) and nothing more. The adapter is stateless and reentrant.
//!
//! A malformed header fails the whole parse with no tree. A command that
//! fails to parse (unterminated literal, unbalanced bracket) stops the scan;
//! the header plus all previously parsed commands are still returned under
//! the synthetic root, with the failure recorded in [`Parsed::errors`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),
    #[error("unterminated block comment starting at byte {0}")]
    UnterminatedComment(usize),
    #[error("unmatched `{delimiter}` at byte {at}")]
    Unmatched { delimiter: char, at: usize },
    #[error("import without a module name at byte {0}")]
    MissingImportName(usize),
}

/// Byte range of a node in the source buffer. Synthesized nodes (operator
/// replacements) carry the empty `0..0` range; no real token is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub byte_start: usize,
    pub byte_end: usize,
}

impl SourceInfo {
    pub fn new(byte_start: usize, byte_end: usize) -> Self {
        Self {
            byte_start,
            byte_end,
        }
    }

    pub fn synthetic() -> Self {
        Self::new(0, 0)
    }

    pub fn is_synthetic(&self) -> bool {
        self.byte_start == 0 && self.byte_end == 0
    }
}

/// Recursive node shape. Kinds are opaque strings; downstream code reads only
/// the byte range, the kind tag, the leaf text, and the children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    Node {
        info: SourceInfo,
        kind: String,
        children: Vec<SyntaxNode>,
    },
    Atom {
        info: SourceInfo,
        text: String,
    },
    Identifier {
        info: SourceInfo,
        name: String,
    },
    Missing,
}

impl SyntaxNode {
    /// Synthesized atom, used by operators for replacement tokens.
    pub fn atom(text: impl Into<String>) -> Self {
        Self::Atom {
            info: SourceInfo::synthetic(),
            text: text.into(),
        }
    }

    /// Synthesized identifier.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier {
            info: SourceInfo::synthetic(),
            name: name.into(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Node { kind, .. } => kind,
            Self::Atom { .. } => "atom",
            Self::Identifier { .. } => "ident",
            Self::Missing => "missing",
        }
    }

    pub fn info(&self) -> SourceInfo {
        match self {
            Self::Node { info, .. } | Self::Atom { info, .. } | Self::Identifier { info, .. } => {
                *info
            }
            Self::Missing => SourceInfo::synthetic(),
        }
    }

    /// Byte index of the node's first character, 0 when the node has no
    /// position.
    pub fn byte_start(&self) -> usize {
        self.info().byte_start
    }

    pub fn byte_end(&self) -> usize {
        self.info().byte_end
    }

    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            Self::Node { children, .. } => children,
            _ => &[],
        }
    }

    pub fn atom_text(&self) -> Option<&str> {
        match self {
            Self::Atom { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn ident_name(&self) -> Option<&str> {
        match self {
            Self::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Byte slice of this node in `source`; empty for synthesized nodes.
    pub fn source_text<'a>(&self, source: &'a str) -> &'a str {
        let info = self.info();
        if info.is_synthetic() || info.byte_end > source.len() || info.byte_start >= info.byte_end
        {
            ""
        } else {
            &source[info.byte_start..info.byte_end]
        }
    }
}

/// Parse result: the root tree plus any command-level failures. A partial
/// tree has non-empty `errors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub root: SyntaxNode,
    pub errors: Vec<ParseError>,
}

impl Parsed {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Lean source buffer. `Err` means the header could not be parsed
/// and there is no tree at all.
pub fn parse(source: &str) -> Result<Parsed, ParseError> {
    let (tokens, scan_error) = tokenize(source);
    let mut builder = TreeBuilder {
        source,
        tokens: &tokens,
        pos: 0,
    };
    let header = builder.parse_header()?;
    let (commands, errors) = builder.parse_commands(scan_error);

    let mut children = vec![header];
    children.extend(commands);
    let root = SyntaxNode::Node {
        info: SourceInfo::new(0, source.len()),
        kind: "root".to_string(),
        children,
    };
    Ok(Parsed { root, errors })
}

const KEYWORDS: &[&str] = &[
    "abbrev",
    "attribute",
    "axiom",
    "by",
    "class",
    "def",
    "deriving",
    "do",
    "else",
    "end",
    "example",
    "from",
    "fun",
    "have",
    "if",
    "import",
    "in",
    "inductive",
    "instance",
    "lemma",
    "let",
    "macro",
    "match",
    "mutual",
    "namespace",
    "noncomputable",
    "notation",
    "open",
    "partial",
    "private",
    "protected",
    "return",
    "section",
    "set_option",
    "show",
    "structure",
    "syntax",
    "then",
    "theorem",
    "universe",
    "unsafe",
    "variable",
    "where",
    "with",
];

/// Keywords that open a new top-level command.
const COMMAND_KEYWORDS: &[&str] = &[
    "abbrev",
    "attribute",
    "axiom",
    "class",
    "def",
    "end",
    "example",
    "inductive",
    "instance",
    "lemma",
    "macro",
    "mutual",
    "namespace",
    "noncomputable",
    "notation",
    "open",
    "partial",
    "private",
    "protected",
    "section",
    "set_option",
    "structure",
    "syntax",
    "theorem",
    "universe",
    "unsafe",
    "variable",
];

/// Declaration modifiers; a command keyword right after these continues the
/// same command (`private def f ...` is one command, not two).
const MODIFIER_KEYWORDS: &[&str] = &[
    "noncomputable",
    "partial",
    "private",
    "protected",
    "unsafe",
];

/// Multi-character operator tokens, longest first for maximal munch.
const MULTI_SYMBOLS: &[&str] = &[
    "<|>", "|>.", ">>=", "=<<", "<<<", ">>>", "...", ":=", "=>", "->", "<-", "==", "!=", "/=",
    "<=", ">=", "&&", "||", "::", "++", "<<", ">>", "|>", "<|", "^^",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Keyword,
    Number,
    Str,
    Char,
    Symbol,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    kind: TokenKind,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

/// Tokenize the buffer. On a lexical error the tokens collected so far are
/// returned together with the error, so the builder can still hand back the
/// header and any complete commands.
fn tokenize(source: &str) -> (Vec<Token>, Option<ParseError>) {
    let mut tokens = Vec::new();
    let mut s = Scanner {
        src: source,
        pos: 0,
    };

    'outer: loop {
        while s.peek().is_some_and(|c| c.is_whitespace()) {
            s.bump();
        }
        let start = s.pos;
        let Some(c) = s.peek() else { break };

        // Line comment.
        if s.rest().starts_with("--") {
            while s.peek().is_some_and(|c| c != '\n') {
                s.bump();
            }
            continue;
        }

        // Block comment, nested.
        if s.rest().starts_with("/-") {
            let mut depth = 0usize;
            loop {
                if s.eat("/-") {
                    depth += 1;
                } else if s.eat("-/") {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                } else if s.bump().is_none() {
                    return (tokens, Some(ParseError::UnterminatedComment(start)));
                }
            }
            continue;
        }

        // String literal, including quotes.
        if c == '"' {
            s.bump();
            loop {
                match s.bump() {
                    Some('\\') => {
                        s.bump();
                    }
                    Some('"') => break,
                    Some(_) => {}
                    None => return (tokens, Some(ParseError::UnterminatedString(start))),
                }
            }
            tokens.push(Token {
                start,
                end: s.pos,
                kind: TokenKind::Str,
            });
            continue;
        }

        // Char literal. A quote that does not close after one scalar falls
        // back to a bare symbol; primes inside identifiers never reach here
        // because the identifier rule consumes them.
        if c == '\'' {
            s.bump();
            let quote_end = s.pos;
            match s.peek() {
                Some('\\') => {
                    s.bump();
                    s.bump();
                }
                Some(ch) if ch != '\'' => {
                    s.bump();
                }
                _ => {}
            }
            if s.peek() == Some('\'') && s.pos > quote_end {
                s.bump();
                tokens.push(Token {
                    start,
                    end: s.pos,
                    kind: TokenKind::Char,
                });
            } else {
                s.pos = quote_end;
                tokens.push(Token {
                    start,
                    end: quote_end,
                    kind: TokenKind::Symbol,
                });
            }
            continue;
        }

        // Numeral: decimal, based (0x/0b/0o), or decimal float.
        if c.is_ascii_digit() {
            if s.eat("0x") || s.eat("0X") || s.eat("0b") || s.eat("0o") {
                while s.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                    s.bump();
                }
            } else {
                while s.peek().is_some_and(|c| c.is_ascii_digit()) {
                    s.bump();
                }
                if s.peek() == Some('.')
                    && s.rest().chars().nth(1).is_some_and(|c| c.is_ascii_digit())
                {
                    s.bump();
                    while s.peek().is_some_and(|c| c.is_ascii_digit()) {
                        s.bump();
                    }
                }
            }
            tokens.push(Token {
                start,
                end: s.pos,
                kind: TokenKind::Number,
            });
            continue;
        }

        // Identifier or keyword; `.` joins qualified name segments.
        if is_ident_start(c) {
            loop {
                while s.peek().is_some_and(is_ident_continue) {
                    s.bump();
                }
                if s.peek() == Some('.')
                    && s.rest().chars().nth(1).is_some_and(is_ident_start)
                {
                    s.bump();
                } else {
                    break;
                }
            }
            // Attached `!`/`?` name suffixes (`get!`, `find?`); a following
            // `=` means the `!` belongs to `!=` instead.
            if s.peek() == Some('!') && s.rest().chars().nth(1) != Some('=') {
                s.bump();
            } else if s.peek() == Some('?') {
                s.bump();
            }
            let text = &source[start..s.pos];
            let kind = if KEYWORDS.contains(&text) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            };
            tokens.push(Token {
                start,
                end: s.pos,
                kind,
            });
            continue;
        }

        // Hash command token (#guard, #eval, ...).
        if c == '#' {
            s.bump();
            while s.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                s.bump();
            }
            let kind = if s.pos > start + 1 {
                TokenKind::Keyword
            } else {
                TokenKind::Symbol
            };
            tokens.push(Token {
                start,
                end: s.pos,
                kind,
            });
            continue;
        }

        // Operator symbols, maximal munch.
        for sym in MULTI_SYMBOLS {
            if s.eat(sym) {
                tokens.push(Token {
                    start,
                    end: s.pos,
                    kind: TokenKind::Symbol,
                });
                continue 'outer;
            }
        }
        s.bump();
        tokens.push(Token {
            start,
            end: s.pos,
            kind: TokenKind::Symbol,
        });
    }

    (tokens, None)
}

fn open_group(text: &str) -> Option<(&'static str, &'static str)> {
    match text {
        "(" => Some((")", "paren")),
        "[" => Some(("]", "bracket")),
        "{" => Some(("}", "brace")),
        "⟨" => Some(("⟩", "anon")),
        _ => None,
    }
}

fn is_close_delim(text: &str) -> bool {
    matches!(text, ")" | "]" | "}" | "⟩")
}

/// True when `node` can terminate an operand, which makes a following `-`
/// read as a binary operator rather than a numeric prefix.
fn is_operand(node: &SyntaxNode) -> bool {
    match node {
        SyntaxNode::Identifier { .. } => true,
        SyntaxNode::Node { kind, .. } => {
            matches!(kind.as_str(), "paren" | "bracket" | "brace" | "anon" | "neg" | "uminus")
        }
        SyntaxNode::Atom { text, .. } => {
            text.starts_with('"')
                || text.starts_with('\'')
                || text.chars().next().is_some_and(|c| c.is_ascii_digit())
        }
        SyntaxNode::Missing => false,
    }
}

struct TreeBuilder<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TreeBuilder<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn text(&self, token: &Token) -> &'a str {
        &self.source[token.start..token.end]
    }

    fn leaf(&mut self) -> SyntaxNode {
        let token = self.tokens[self.pos];
        self.pos += 1;
        let info = SourceInfo::new(token.start, token.end);
        let text = self.text(&token).to_string();
        match token.kind {
            TokenKind::Ident => SyntaxNode::Identifier { info, name: text },
            _ => SyntaxNode::Atom { info, text },
        }
    }

    fn parse_header(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut imports = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind != TokenKind::Keyword || self.text(token) != "import" {
                break;
            }
            let keyword = *token;
            self.pos += 1;
            let name = match self.peek() {
                Some(t) if t.kind == TokenKind::Ident => *t,
                _ => return Err(ParseError::MissingImportName(keyword.start)),
            };
            self.pos += 1;
            imports.push(SyntaxNode::Node {
                info: SourceInfo::new(keyword.start, name.end),
                kind: "import".to_string(),
                children: vec![
                    SyntaxNode::Atom {
                        info: SourceInfo::new(keyword.start, keyword.end),
                        text: "import".to_string(),
                    },
                    SyntaxNode::Identifier {
                        info: SourceInfo::new(name.start, name.end),
                        name: self.text(&name).to_string(),
                    },
                ],
            });
        }
        let info = match (imports.first(), imports.last()) {
            (Some(first), Some(last)) => SourceInfo::new(first.byte_start(), last.byte_end()),
            _ => SourceInfo::synthetic(),
        };
        Ok(SyntaxNode::Node {
            info,
            kind: "header".to_string(),
            children: imports,
        })
    }

    fn parse_commands(
        &mut self,
        scan_error: Option<ParseError>,
    ) -> (Vec<SyntaxNode>, Vec<ParseError>) {
        let mut commands = Vec::new();
        let mut errors = Vec::new();
        while self.pos < self.tokens.len() {
            match self.parse_command() {
                Ok(command) => commands.push(command),
                Err(e) => {
                    errors.push(e);
                    return (commands, errors);
                }
            }
        }
        if let Some(e) = scan_error {
            errors.push(e);
        }
        (commands, errors)
    }

    fn parse_command(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.tokens[self.pos].start;
        let mut children: Vec<SyntaxNode> = Vec::new();
        while let Some(token) = self.peek() {
            if !children.is_empty() && self.is_command_boundary(token, &children) {
                break;
            }
            let prev = children.last();
            let node = self.parse_element(prev)?;
            children.push(node);
        }
        let end = children
            .iter()
            .rev()
            .map(SyntaxNode::byte_end)
            .find(|&e| e > 0)
            .unwrap_or(start);
        Ok(SyntaxNode::Node {
            info: SourceInfo::new(start, end),
            kind: "command".to_string(),
            children,
        })
    }

    fn is_command_boundary(&self, token: &Token, children: &[SyntaxNode]) -> bool {
        if token.kind != TokenKind::Keyword {
            return false;
        }
        let text = self.text(token);
        if !COMMAND_KEYWORDS.contains(&text) && !text.starts_with('#') {
            return false;
        }
        // `@[inline] private def ...` stays one command.
        let only_prefixes = children.iter().all(|c| match c {
            SyntaxNode::Atom { text, .. } => {
                MODIFIER_KEYWORDS.contains(&text.as_str()) || text == "@"
            }
            SyntaxNode::Node { kind, .. } => kind == "bracket",
            _ => false,
        });
        !only_prefixes
    }

    fn parse_element(&mut self, prev: Option<&SyntaxNode>) -> Result<SyntaxNode, ParseError> {
        let token = self.tokens[self.pos];
        let text = self.text(&token);
        if token.kind != TokenKind::Symbol {
            return Ok(self.leaf());
        }
        if open_group(text).is_some() {
            return self.parse_group();
        }
        if is_close_delim(text) {
            return Err(ParseError::Unmatched {
                delimiter: text.chars().next().unwrap_or('?'),
                at: token.start,
            });
        }
        if text == "!" || text == "¬" {
            return Ok(self.parse_negation());
        }
        if text == "-" && !prev.is_some_and(is_operand) {
            return Ok(self.parse_unary_minus());
        }
        Ok(self.leaf())
    }

    fn parse_group(&mut self) -> Result<SyntaxNode, ParseError> {
        let open = self.tokens[self.pos];
        let open_text = self.text(&open);
        let (close_text, kind) = open_group(open_text).expect("caller checked delimiter");
        self.pos += 1;

        let mut children: Vec<SyntaxNode> = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError::Unmatched {
                    delimiter: open_text.chars().next().unwrap_or('?'),
                    at: open.start,
                });
            };
            let text = self.text(token);
            if token.kind == TokenKind::Symbol && text == close_text {
                let end = token.end;
                self.pos += 1;
                return Ok(SyntaxNode::Node {
                    info: SourceInfo::new(open.start, end),
                    kind: kind.to_string(),
                    children,
                });
            }
            if token.kind == TokenKind::Symbol && is_close_delim(text) {
                return Err(ParseError::Unmatched {
                    delimiter: text.chars().next().unwrap_or('?'),
                    at: token.start,
                });
            }
            let prev = children.last();
            let node = self.parse_element(prev)?;
            children.push(node);
        }
    }

    /// `!e` / `¬e`. The operand must be an isolable unit (identifier,
    /// literal, group, nested negation); otherwise it is `Missing` and the
    /// negation-removal operator declines the site.
    fn parse_negation(&mut self) -> SyntaxNode {
        let token = self.tokens[self.pos];
        self.pos += 1;
        let operand = self.parse_operand_unit();
        let end = match operand.info() {
            info if !info.is_synthetic() => info.byte_end,
            _ => token.end,
        };
        SyntaxNode::Node {
            info: SourceInfo::new(token.start, end),
            kind: "neg".to_string(),
            children: vec![operand],
        }
    }

    /// Prefix `-`. Folding it keeps the token out of the binary-operator
    /// sites; `(-)` sections and stray minuses stay plain atoms.
    fn parse_unary_minus(&mut self) -> SyntaxNode {
        let token = self.tokens[self.pos];
        self.pos += 1;
        let operand = self.parse_operand_unit();
        if matches!(operand, SyntaxNode::Missing) {
            return SyntaxNode::Atom {
                info: SourceInfo::new(token.start, token.end),
                text: "-".to_string(),
            };
        }
        SyntaxNode::Node {
            info: SourceInfo::new(token.start, operand.byte_end()),
            kind: "uminus".to_string(),
            children: vec![operand],
        }
    }

    fn parse_operand_unit(&mut self) -> SyntaxNode {
        let Some(token) = self.peek() else {
            return SyntaxNode::Missing;
        };
        let text = self.text(token);
        match token.kind {
            TokenKind::Ident | TokenKind::Number | TokenKind::Str | TokenKind::Char => {
                self.leaf()
            }
            TokenKind::Symbol if open_group(text).is_some() => {
                // A lexically unbalanced group inside a negation operand is
                // rare enough to decline rather than thread the error.
                let save = self.pos;
                match self.parse_group() {
                    Ok(node) => node,
                    Err(_) => {
                        self.pos = save;
                        SyntaxNode::Missing
                    }
                }
            }
            TokenKind::Symbol if text == "!" || text == "¬" => self.parse_negation(),
            _ => SyntaxNode::Missing,
        }
    }
}
