use std::fmt;

use serde::{Deserialize, Serialize};

use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Identifier,
    Punctuation,
    Operator,
    StringLiteral,
    Number,
    Delimiter,
}

/// A pre-lexed token. Sigiled variables (`$x`, `@_`) are identifiers whose text
/// keeps the sigil; only sigil-free identifiers are barewords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position: Position::new(line, column),
        }
    }

    pub fn identifier(text: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(TokenKind::Identifier, text, line, column)
    }

    pub fn is_bareword(&self) -> bool {
        self.kind == TokenKind::Identifier
            && self
                .text
                .chars()
                .next()
                .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
    }

    pub fn sigil(&self) -> Option<char> {
        if self.kind != TokenKind::Identifier {
            return None;
        }
        self.text
            .chars()
            .next()
            .filter(|ch| matches!(ch, '$' | '@' | '%' | '&'))
    }

    /// `$name` with a plain (possibly qualified) name, no deref or subscript.
    pub fn is_scalar_variable(&self) -> bool {
        self.sigil() == Some('$')
            && self.text.len() > 1
            && self.text[1..]
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == ':')
    }

    /// Name with any leading sigil removed.
    pub fn name(&self) -> &str {
        match self.sigil() {
            Some(sigil) => self.text.trim_start_matches(sigil),
            None => &self.text,
        }
    }

    pub fn is_delimiter(&self, text: &str) -> bool {
        self.kind == TokenKind::Delimiter && self.text == text
    }

    pub fn is_punctuation(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }

    pub fn is_operator(&self, text: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == text
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    pub fn is_namespace_separator(&self) -> bool {
        self.is_punctuation(syntax::NAMESPACE_SEPARATOR)
    }

    /// Whether a string literal interpolates variables (double-quoted forms).
    pub fn interpolates(&self) -> bool {
        if self.kind != TokenKind::StringLiteral {
            return false;
        }
        let text = self.text.as_str();
        if text.starts_with('"') || text.starts_with("qq") {
            return true;
        }
        match text.strip_prefix("<<") {
            Some(rest) => {
                let rest = rest.trim_start_matches('~');
                rest.starts_with('"')
                    || rest
                        .chars()
                        .next()
                        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
            }
            None => false,
        }
    }
}

/// Grammatical position of a bareword occurrence, supplied by the upstream adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    ContainerKey,
    MemberAccess,
    SpecialBlock,
    ConstantDeclaration,
    CallableDeclaration,
    NamespaceDeclaration,
    LexicalHandleDeclaration,
    PairValue,
    StatementCall,
    IoHandle,
    OrderingComparator,
}

impl Slot {
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Slot::ConstantDeclaration
                | Slot::CallableDeclaration
                | Slot::NamespaceDeclaration
                | Slot::LexicalHandleDeclaration
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::ContainerKey => "container_key",
            Slot::MemberAccess => "member_access",
            Slot::SpecialBlock => "special_block",
            Slot::ConstantDeclaration => "constant_declaration",
            Slot::CallableDeclaration => "callable_declaration",
            Slot::NamespaceDeclaration => "namespace_declaration",
            Slot::LexicalHandleDeclaration => "lexical_handle_declaration",
            Slot::PairValue => "pair_value",
            Slot::StatementCall => "statement_call",
            Slot::IoHandle => "io_handle",
            Slot::OrderingComparator => "ordering_comparator",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlottedToken {
    pub token: Token,
    pub slot: Option<Slot>,
}

impl SlottedToken {
    pub fn plain(token: Token) -> Self {
        Self { token, slot: None }
    }

    pub fn slotted(token: Token, slot: Slot) -> Self {
        Self {
            token,
            slot: Some(slot),
        }
    }
}

impl From<Token> for SlottedToken {
    fn from(token: Token) -> Self {
        Self::plain(token)
    }
}
