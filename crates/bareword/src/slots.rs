//! Slot inference for lexed source.
//!
//! The engine expects every bareword occurrence to arrive with its grammatical
//! slot. Token documents carry slots explicitly; for raw source this module
//! derives them from the immediate neighborhood of each token plus a stack of
//! open braces, which is enough to tell a statement start from a hash
//! subscript or an anonymous hash.

use crate::syntax;
use crate::token::{Slot, SlottedToken, Token, TokenKind};

pub fn infer_slots(tokens: Vec<Token>) -> Vec<SlottedToken> {
    let slots = SlotInference::new(&tokens).run();
    tokens
        .into_iter()
        .zip(slots)
        .map(|(token, slot)| SlottedToken { token, slot })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Subscript,
    AnonHash,
    /// `use constant { NAME => value, ... }`
    ConstantList,
}

struct SlotInference<'a> {
    tokens: &'a [Token],
    slots: Vec<Option<Slot>>,
    braces: Vec<Brace>,
    statement_start: bool,
    last_closed: Option<Brace>,
}

impl<'a> SlotInference<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            slots: vec![None; tokens.len()],
            braces: Vec::new(),
            statement_start: true,
            last_closed: None,
        }
    }

    fn at(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    fn before(&self, index: usize, distance: usize) -> Option<&'a Token> {
        index.checked_sub(distance).and_then(|i| self.tokens.get(i))
    }

    fn assign(&mut self, index: usize, slot: Slot) {
        if let Some(entry) = self.slots.get_mut(index) {
            if entry.is_none() {
                *entry = Some(slot);
            }
        }
    }

    fn run(mut self) -> Vec<Option<Slot>> {
        let tokens = self.tokens;
        for (index, token) in tokens.iter().enumerate() {
            let at_start = self.statement_start;

            if token.is_delimiter("{") {
                let kind = self.brace_kind(index);
                if kind == Brace::Subscript {
                    self.subscript_key(index);
                }
                self.braces.push(kind);
                self.statement_start = kind == Brace::Block;
                self.last_closed = None;
                continue;
            }
            if token.is_delimiter("}") {
                let closed = self.braces.pop();
                self.statement_start = closed == Some(Brace::Block);
                self.last_closed = closed;
                continue;
            }
            self.last_closed = None;
            if token.is_punctuation(";") {
                self.statement_start = true;
                continue;
            }
            self.statement_start = false;

            if token.kind != TokenKind::Identifier {
                continue;
            }
            if token.is_word("sort") {
                self.comparator(index);
                continue;
            }
            if token.is_scalar_variable() {
                if self.opens_lexical_handle(index) {
                    self.assign(index, Slot::LexicalHandleDeclaration);
                }
                continue;
            }
            if !token.is_bareword() || self.slots[index].is_some() {
                continue;
            }
            if let Some(slot) = self.bareword_slot(index, at_start) {
                self.assign(index, slot);
            }
        }
        self.slots
    }

    fn brace_kind(&self, index: usize) -> Brace {
        let Some(prev) = self.before(index, 1) else {
            return Brace::Block;
        };
        if prev.is_word(syntax::CONSTANT_PRAGMA)
            && self.before(index, 2).is_some_and(|t| t.is_word("use"))
        {
            return Brace::ConstantList;
        }
        if matches!(prev.sigil(), Some('$' | '@' | '%')) || prev.is_operator(syntax::MEMBER_ARROW)
        {
            return Brace::Subscript;
        }
        if prev.is_delimiter("]")
            || (prev.is_delimiter("}") && self.last_closed == Some(Brace::Subscript))
        {
            return Brace::Subscript;
        }
        match prev.kind {
            // `@{...}` and `${...}` dereference blocks.
            TokenKind::Operator if matches!(prev.text.as_str(), "$" | "@" | "%" | "&") => {
                Brace::Block
            }
            TokenKind::Operator => Brace::AnonHash,
            TokenKind::Punctuation if prev.text == "," => Brace::AnonHash,
            TokenKind::Delimiter if matches!(prev.text.as_str(), "(" | "[") => Brace::AnonHash,
            TokenKind::Identifier if prev.is_word("return") => Brace::AnonHash,
            _ => Brace::Block,
        }
    }

    /// `$h{key}` and `$h{+key}` put the key in container-key position.
    fn subscript_key(&mut self, open: usize) {
        let mut key = open + 1;
        if self
            .at(key)
            .is_some_and(|t| t.is_operator(syntax::EVALUATION_MARKER))
        {
            key += 1;
        }
        let Some(token) = self.at(key) else {
            return;
        };
        let followed_by_arrow = self
            .at(key + 1)
            .is_some_and(|t| t.is_operator(syntax::MEMBER_ARROW) || t.is_namespace_separator());
        if token.is_bareword() && !followed_by_arrow {
            self.assign(key, Slot::ContainerKey);
        }
    }

    /// `sort NAME LIST`, `sort BLOCK LIST` and `sort $sub LIST`.
    fn comparator(&mut self, index: usize) {
        let mut candidate = index + 1;
        if self.at(candidate).is_some_and(|t| t.is_delimiter("(")) {
            candidate += 1;
        }
        let Some(token) = self.at(candidate) else {
            return;
        };
        if token.is_delimiter("{") {
            self.assign(candidate, Slot::OrderingComparator);
            return;
        }
        if matches!(token.sigil(), Some('@' | '%'))
            || (token.is_bareword() && syntax::is_reserved_word(&token.text))
            || token.kind == TokenKind::Delimiter
        {
            return;
        }
        let starts_list = self.at(candidate + 1).is_some_and(|next| {
            matches!(next.sigil(), Some('@' | '%'))
                || next.is_delimiter("(")
                || syntax::LIST_PRODUCERS.contains(&next.text.as_str())
        });
        if starts_list {
            self.assign(candidate, Slot::OrderingComparator);
        }
    }

    /// `open(my $fh, ...)` or `open my $fh, ...`.
    fn opens_lexical_handle(&self, index: usize) -> bool {
        let declared = self
            .before(index, 1)
            .is_some_and(|t| matches!(t.text.as_str(), "my" | "our" | "state"));
        if !declared {
            return false;
        }
        let mut opener = self.before(index, 2);
        if opener.is_some_and(|t| t.is_delimiter("(")) {
            opener = self.before(index, 3);
        }
        opener.is_some_and(|t| {
            t.kind == TokenKind::Identifier && syntax::OPEN_LIKE.contains(&t.text.as_str())
        })
    }

    fn bareword_slot(&self, index: usize, at_start: bool) -> Option<Slot> {
        let token = &self.tokens[index];
        let word = token.text.as_str();
        let prev = self.before(index, 1);
        let next = self.at(index + 1);
        let reserved = syntax::is_reserved_word(word);

        if let Some(prev) = prev {
            if prev.is_word(syntax::SUBROUTINE_KEYWORD) {
                return Some(Slot::CallableDeclaration);
            }
            if prev.is_word(syntax::PACKAGE_KEYWORD) {
                return Some(Slot::NamespaceDeclaration);
            }
            if prev.is_word(syntax::CONSTANT_PRAGMA)
                && self.before(index, 2).is_some_and(|t| t.is_word("use"))
            {
                return Some(Slot::ConstantDeclaration);
            }
            if prev.is_operator(syntax::MEMBER_ARROW) {
                return None;
            }
        }
        if self.braces.last() == Some(&Brace::ConstantList)
            && next.is_some_and(|t| t.is_operator(syntax::FAT_COMMA))
        {
            return Some(Slot::ConstantDeclaration);
        }
        if at_start
            && self.braces.is_empty()
            && syntax::is_special_block(word)
            && next.is_some_and(|t| t.is_delimiter("{"))
        {
            return Some(Slot::SpecialBlock);
        }
        if !reserved
            && (next.is_some_and(|t| t.is_operator(syntax::MEMBER_ARROW))
                || next.is_some_and(Token::is_namespace_separator))
        {
            return Some(Slot::MemberAccess);
        }
        if next.is_some_and(|t| t.is_operator(syntax::FAT_COMMA)) {
            return Some(Slot::ContainerKey);
        }
        if reserved {
            return None;
        }
        if let Some(slot) = self.handle_slot(index) {
            return Some(slot);
        }
        if prev.is_some_and(|t| t.is_operator(syntax::FAT_COMMA)) && ends_value(next) {
            return Some(Slot::PairValue);
        }
        if at_start
            && (next.is_none()
                || next.is_some_and(|t| {
                    t.is_punctuation(";")
                        || t.is_delimiter("}")
                        || t.sigil().is_some()
                        || matches!(t.kind, TokenKind::StringLiteral | TokenKind::Number)
                }))
        {
            return Some(Slot::StatementCall);
        }
        None
    }

    fn handle_slot(&self, index: usize) -> Option<Slot> {
        let next = self.at(index + 1);
        if self.before(index, 1).is_some_and(|t| t.is_operator("<"))
            && next.is_some_and(|t| t.is_operator(">"))
        {
            return Some(Slot::IoHandle);
        }

        let mut builtin = self.before(index, 1);
        if builtin.is_some_and(|t| t.is_delimiter("(")) {
            builtin = self.before(index, 2);
        }
        let builtin = builtin.filter(|t| t.kind == TokenKind::Identifier)?;

        if syntax::PRINT_LIKE.contains(&builtin.text.as_str()) {
            let printed = next.is_some_and(|t| {
                matches!(t.kind, TokenKind::StringLiteral | TokenKind::Number)
                    || matches!(t.sigil(), Some('$' | '@'))
            });
            return printed.then_some(Slot::IoHandle);
        }
        if syntax::HANDLE_BUILTINS.contains(&builtin.text.as_str()) {
            let argument_ends = next.is_none()
                || next.is_some_and(|t| {
                    t.is_punctuation(",") || t.is_punctuation(";") || t.is_delimiter(")")
                });
            return argument_ends.then_some(Slot::IoHandle);
        }
        None
    }
}

fn ends_value(next: Option<&Token>) -> bool {
    match next {
        None => true,
        Some(token) => {
            token.is_punctuation(",")
                || token.is_punctuation(";")
                || token.is_delimiter(")")
                || token.is_delimiter("}")
                || token.is_delimiter("]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn slots_of(src: &str) -> Vec<(String, Slot)> {
        let (tokens, _) = lex(src);
        infer_slots(tokens)
            .into_iter()
            .filter_map(|entry| entry.slot.map(|slot| (entry.token.text, slot)))
            .collect()
    }

    fn pairs(items: &[(&str, Slot)]) -> Vec<(String, Slot)> {
        items
            .iter()
            .map(|(text, slot)| ((*text).to_string(), *slot))
            .collect()
    }

    #[test]
    fn subscript_keys_and_marked_keys() {
        assert_eq!(
            slots_of("my $v = $h{shift}; my $w = $h{+shift}; $h{shift @_};"),
            pairs(&[
                ("shift", Slot::ContainerKey),
                ("shift", Slot::ContainerKey),
                ("shift", Slot::ContainerKey),
            ])
        );
    }

    #[test]
    fn chained_subscripts_are_keys() {
        assert_eq!(
            slots_of("$h->{outer}{inner}[0]{leaf} = 1;"),
            pairs(&[
                ("outer", Slot::ContainerKey),
                ("inner", Slot::ContainerKey),
                ("leaf", Slot::ContainerKey),
            ])
        );
    }

    #[test]
    fn declarations_are_slotted() {
        assert_eq!(
            slots_of("package Logger; sub greet { } use constant PI => 3.14;"),
            pairs(&[
                ("Logger", Slot::NamespaceDeclaration),
                ("greet", Slot::CallableDeclaration),
                ("PI", Slot::ConstantDeclaration),
            ])
        );
        assert_eq!(
            slots_of("use constant { E => 2.71, TAU => 6.28 };"),
            pairs(&[
                ("E", Slot::ConstantDeclaration),
                ("TAU", Slot::ConstantDeclaration),
            ])
        );
    }

    #[test]
    fn member_access_and_namespace_separator() {
        assert_eq!(
            slots_of("Package->new; Package::->new; $obj->method;"),
            pairs(&[
                ("Package", Slot::MemberAccess),
                ("Package", Slot::MemberAccess),
            ])
        );
    }

    #[test]
    fn pair_keys_and_values() {
        assert_eq!(
            slots_of("my %h = (name => Annette, age => 42, call => greet());"),
            pairs(&[
                ("name", Slot::ContainerKey),
                ("Annette", Slot::PairValue),
                ("age", Slot::ContainerKey),
                ("call", Slot::ContainerKey),
            ])
        );
    }

    #[test]
    fn special_blocks_only_at_top_level() {
        assert_eq!(
            slots_of("BEGIN { setup; } sub f { END { } }"),
            pairs(&[
                ("BEGIN", Slot::SpecialBlock),
                ("setup", Slot::StatementCall),
                ("f", Slot::CallableDeclaration),
            ])
        );
    }

    #[test]
    fn handles_in_print_and_io_builtins() {
        assert_eq!(
            slots_of("print STDERR \"oops\"; print LOG $line; close(LOG); while (<FH>) { }"),
            pairs(&[
                ("STDERR", Slot::IoHandle),
                ("LOG", Slot::IoHandle),
                ("LOG", Slot::IoHandle),
                ("FH", Slot::IoHandle),
            ])
        );
        assert_eq!(
            slots_of("open(my $fh, '<', $path); open my $out, '>', $p;"),
            pairs(&[
                ("$fh", Slot::LexicalHandleDeclaration),
                ("$out", Slot::LexicalHandleDeclaration),
            ])
        );
    }

    #[test]
    fn sort_comparator_forms() {
        assert_eq!(
            slots_of("my @a = sort by_name @list;"),
            pairs(&[("by_name", Slot::OrderingComparator)])
        );
        assert_eq!(
            slots_of("my @b = sort { $a <=> $b } @list; my @c = sort keys %h;"),
            pairs(&[("{", Slot::OrderingComparator)])
        );
        assert_eq!(
            slots_of("my @d = sort 42 @list;"),
            pairs(&[("42", Slot::OrderingComparator)])
        );
    }

    #[test]
    fn statement_calls_need_a_statement_start() {
        assert_eq!(
            slots_of("greet; greet $name; my $x = greet; greet(1);"),
            pairs(&[
                ("greet", Slot::StatementCall),
                ("greet", Slot::StatementCall),
            ])
        );
    }

    #[test]
    fn anonymous_hash_is_not_a_block() {
        assert_eq!(
            slots_of("my $r = { first => Alpha };"),
            pairs(&[("first", Slot::ContainerKey), ("Alpha", Slot::PairValue)])
        );
    }
}
