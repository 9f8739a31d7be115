//! Order-sensitive declaration table for one compilation unit.
//!
//! The table only grows. Snapshots are `im` clones that share structure with
//! the live table, so the engine takes one per occurrence and queries it
//! without ever seeing declarations recorded later.

use std::fmt;

use serde::Serialize;

use crate::token::Position;
use crate::trace::debug_trace_enabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DeclarationKind {
    Constant,
    Callable,
    Namespace,
    LexicalHandle,
    SpecialBlock,
}

impl DeclarationKind {
    pub const ALL: [DeclarationKind; 5] = [
        DeclarationKind::Constant,
        DeclarationKind::Callable,
        DeclarationKind::Namespace,
        DeclarationKind::LexicalHandle,
        DeclarationKind::SpecialBlock,
    ];

    fn index(self) -> usize {
        match self {
            DeclarationKind::Constant => 0,
            DeclarationKind::Callable => 1,
            DeclarationKind::Namespace => 2,
            DeclarationKind::LexicalHandle => 3,
            DeclarationKind::SpecialBlock => 4,
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Constant => "constant",
            DeclarationKind::Callable => "subroutine",
            DeclarationKind::Namespace => "package",
            DeclarationKind::LexicalHandle => "lexical handle",
            DeclarationKind::SpecialBlock => "special block",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of declaration kinds seen for one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, kind: DeclarationKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn with(self, kind: DeclarationKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = DeclarationKind> {
        DeclarationKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<DeclarationKind> for KindSet {
    fn from_iter<T: IntoIterator<Item = DeclarationKind>>(iter: T) -> Self {
        iter.into_iter().fold(KindSet::empty(), KindSet::with)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub position: Position,
}

/// Recording a name/kind pair that is already known. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' redeclared at {position} (first declared at {first})")]
pub struct DuplicateBenignDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub first: Position,
    pub position: Position,
}

/// Kinds recorded for one name, with the first position of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct NameEntry {
    kinds: KindSet,
    first: [Option<Position>; DeclarationKind::ALL.len()],
}

/// Immutable view of the table as of one point in the stream.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    names: im::HashMap<String, NameEntry>,
    log: im::Vector<Declaration>,
}

impl Snapshot {
    pub fn query(&self, name: &str) -> KindSet {
        self.names
            .get(name)
            .map(|entry| entry.kinds)
            .unwrap_or_default()
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.log.iter()
    }

    /// Where `name` was first recorded as `kind`.
    pub fn first_declaration(&self, name: &str, kind: DeclarationKind) -> Option<Position> {
        self.names
            .get(name)
            .and_then(|entry| entry.first[kind.index()])
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

/// Append-only declaration table. Create one per compilation unit.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTracker {
    table: Snapshot,
}

impl DeclarationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        name: &str,
        kind: DeclarationKind,
        position: Position,
    ) -> Result<(), DuplicateBenignDeclaration> {
        let mut entry = self.table.names.get(name).copied().unwrap_or_default();
        if let Some(first) = entry.first[kind.index()] {
            if debug_trace_enabled() {
                eprintln!("[BAREWORD_TRACE] duplicate {kind} '{name}' at {position}");
            }
            return Err(DuplicateBenignDeclaration {
                name: name.to_string(),
                kind,
                first,
                position,
            });
        }

        if debug_trace_enabled() {
            eprintln!("[BAREWORD_TRACE] record {kind} '{name}' at {position}");
        }
        entry.kinds = entry.kinds.with(kind);
        entry.first[kind.index()] = Some(position);
        self.table.names.insert(name.to_string(), entry);
        self.table.log.push_back(Declaration {
            name: name.to_string(),
            kind,
            position,
        });
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.table.clone()
    }

    pub fn query(&self, name: &str) -> KindSet {
        self.table.query(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
