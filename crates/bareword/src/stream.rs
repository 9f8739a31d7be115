//! Token stream adapter: turns targets on disk into slotted token units.
//!
//! Two inputs are accepted. JSON token documents already carry tokens and slot
//! hints and are taken as-is. Source files go through the bundled lexer and
//! slot inference first.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::Notice;
use crate::lexer::lex;
use crate::slots::infer_slots;
use crate::token::{Position, Slot, SlottedToken, Token, TokenKind};
use crate::BarewordError;

pub const SOURCE_EXTENSIONS: &[&str] = &["pl", "pm", "t"];
pub const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("{unit}: malformed token document: {source}")]
    Malformed {
        unit: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{unit}: token {index} has empty text")]
    EmptyToken { unit: String, index: usize },
    #[error("{unit}: token {index} has position {position}; lines and columns start at 1")]
    InvalidPosition {
        unit: String,
        index: usize,
        position: Position,
    },
    #[error("{unit}: token {index} at {position} comes before the token preceding it")]
    OutOfOrder {
        unit: String,
        index: usize,
        position: Position,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
}

impl From<&SlottedToken> for TokenRecord {
    fn from(entry: &SlottedToken) -> Self {
        Self {
            kind: entry.token.kind,
            text: entry.token.text.clone(),
            line: entry.token.position.line,
            column: entry.token.position.column,
            slot: entry.slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub tokens: Vec<TokenRecord>,
}

/// One compilation unit ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub tokens: Vec<SlottedToken>,
    /// Findings from the tokenizer, reported alongside the analysis.
    pub notices: Vec<Notice>,
}

impl Unit {
    pub fn to_document(&self) -> TokenDocument {
        TokenDocument {
            unit: Some(self.name.clone()),
            tokens: self.tokens.iter().map(TokenRecord::from).collect(),
        }
    }
}

pub fn unit_from_source(name: &str, content: &str) -> Unit {
    let (tokens, notices) = lex(content);
    Unit {
        name: name.to_string(),
        tokens: infer_slots(tokens),
        notices,
    }
}

/// Parses a token document. `fallback_name` is used when the document does not
/// name its unit.
pub fn unit_from_document(fallback_name: &str, text: &str) -> Result<Unit, StreamError> {
    let document: TokenDocument =
        serde_json::from_str(text).map_err(|source| StreamError::Malformed {
            unit: fallback_name.to_string(),
            source,
        })?;
    let name = document
        .unit
        .unwrap_or_else(|| fallback_name.to_string());

    let mut tokens = Vec::with_capacity(document.tokens.len());
    let mut last: Option<Position> = None;
    for (index, record) in document.tokens.into_iter().enumerate() {
        let position = Position::new(record.line, record.column);
        if record.text.is_empty() {
            return Err(StreamError::EmptyToken { unit: name, index });
        }
        if record.line == 0 || record.column == 0 {
            return Err(StreamError::InvalidPosition {
                unit: name,
                index,
                position,
            });
        }
        if last.is_some_and(|last| position < last) {
            return Err(StreamError::OutOfOrder {
                unit: name,
                index,
                position,
            });
        }
        last = Some(position);
        tokens.push(SlottedToken {
            token: Token {
                kind: record.kind,
                text: record.text,
                position,
            },
            slot: record.slot,
        });
    }

    Ok(Unit {
        name,
        tokens,
        notices: Vec::new(),
    })
}

pub fn load_unit(path: &Path) -> Result<Unit, BarewordError> {
    let content = fs::read_to_string(path)?;
    let name = path.display().to_string();
    if is_document(path) {
        return Ok(unit_from_document(&name, &content)?);
    }
    Ok(unit_from_source(&name, &content))
}

fn is_document(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION)
}

fn is_supported(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => ext == DOCUMENT_EXTENSION || SOURCE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Resolves a CLI target: a file, a directory, or `dir/...` for a recursive walk.
pub fn expand_target(target: &str) -> Result<Vec<PathBuf>, BarewordError> {
    let mut paths = Vec::new();
    let (base, recursive) = match target.strip_suffix("/...") {
        Some(base) => (if base.is_empty() { "." } else { base }, true),
        None => (target, false),
    };

    let path = Path::new(base);
    if !path.exists() {
        return Err(BarewordError::InvalidPath(target.to_string()));
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        if recursive {
            collect_files(path, &mut paths)?;
        } else {
            for entry in fs::read_dir(path)? {
                let entry_path = entry?.path();
                if entry_path.is_file() && is_supported(&entry_path) {
                    paths.push(entry_path);
                }
            }
        }
    }

    paths.sort();
    if paths.is_empty() {
        return Err(BarewordError::InvalidPath(target.to_string()));
    }

    Ok(paths)
}

fn collect_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), BarewordError> {
    for entry in fs::read_dir(dir)? {
        let entry_path = entry?.path();
        if entry_path.is_dir() {
            collect_files(&entry_path, paths)?;
            continue;
        }

        if is_supported(&entry_path) {
            paths.push(entry_path);
        }
    }
    Ok(())
}
