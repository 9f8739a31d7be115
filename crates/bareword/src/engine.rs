//! Single forward pass over one compilation unit.
//!
//! [`UnitAnalyzer`] pulls slotted tokens lazily, keeps exactly one token of
//! lookahead and one of lookbehind, and yields classifications as it goes.
//! Callers may stop pulling at any point; [`UnitAnalyzer::finish`] then
//! reports only what was seen.

use std::iter::Peekable;

use crate::classify::{classify, AnalysisError, Classification, Occurrence};
use crate::config::Mode;
use crate::diagnostics::{Notice, Reporter, UnitReport};
use crate::token::{Slot, SlottedToken, Token, TokenKind};
use crate::trace::debug_trace_enabled;
use crate::tracker::{DeclarationKind, DeclarationTracker};

pub struct UnitAnalyzer<I: Iterator<Item = SlottedToken>> {
    tokens: Peekable<I>,
    previous: Option<Token>,
    tracker: DeclarationTracker,
    reporter: Reporter,
    abort: Option<AnalysisError>,
}

impl<I: Iterator<Item = SlottedToken>> UnitAnalyzer<I> {
    pub fn new(tokens: impl IntoIterator<Item = SlottedToken, IntoIter = I>, mode: Mode) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
            previous: None,
            tracker: DeclarationTracker::new(),
            reporter: Reporter::new(mode),
            abort: None,
        }
    }

    /// Seeds notices produced upstream (for example by the tokenizer).
    pub fn with_notices(mut self, notices: impl IntoIterator<Item = Notice>) -> Self {
        for notice in notices {
            self.reporter.notice(notice);
        }
        self
    }

    pub fn tracker(&self) -> &DeclarationTracker {
        &self.tracker
    }

    pub fn classifications(&self) -> &[Classification] {
        self.reporter.classifications()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    /// Drains the remaining tokens and builds the report.
    pub fn run(mut self, unit: &str) -> UnitReport {
        for _ in self.by_ref() {}
        self.finish(unit)
    }

    /// Builds the report from what has been consumed so far.
    pub fn finish(self, unit: &str) -> UnitReport {
        self.reporter.finish(unit, self.abort.as_ref())
    }

    fn visit(
        &mut self,
        token: &Token,
        next: Option<&Token>,
        slot: Slot,
    ) -> Result<Option<Classification>, AnalysisError> {
        let ruling = classify(&Occurrence {
            token,
            slot,
            previous: self.previous.as_ref(),
            next,
            snapshot: self.tracker.snapshot(),
        })?;
        let Some(ruling) = ruling else {
            if debug_trace_enabled() {
                eprintln!(
                    "[BAREWORD_TRACE] {} hint on '{}' at {} carries no bareword",
                    slot, token.text, token.position
                );
            }
            return Ok(None);
        };

        if let Some(kind) = ruling.declares {
            self.declare(token.name(), kind, token);
        }
        let admitted = self.reporter.admit(ruling.classification);
        if debug_trace_enabled() {
            eprintln!(
                "[BAREWORD_TRACE] {} '{}' at {} -> {} ({})",
                admitted.slot,
                admitted.name,
                admitted.position,
                admitted.category,
                admitted.ambiguity_level.as_str()
            );
        }
        Ok(Some(admitted.clone()))
    }

    fn declare(&mut self, name: &str, kind: DeclarationKind, token: &Token) {
        if let Err(duplicate) = self.tracker.record(name, kind, token.position) {
            self.reporter.notice(Notice::duplicate_declaration(&duplicate));
        }
    }

    fn scan_string(&mut self, token: &Token) {
        if !token.interpolates() {
            return;
        }
        let mut seen: Vec<&str> = Vec::new();
        for word in token
            .text
            .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
            .filter(|word| !word.is_empty())
        {
            if seen.contains(&word) {
                continue;
            }
            if self.tracker.query(word).contains(DeclarationKind::Constant) {
                seen.push(word);
                self.reporter
                    .notice(Notice::constant_in_string(word, token.position));
            }
        }
    }
}

impl<I: Iterator<Item = SlottedToken>> Iterator for UnitAnalyzer<I> {
    type Item = Result<Classification, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.abort.is_some() {
            return None;
        }
        loop {
            let SlottedToken { token, slot } = self.tokens.next()?;
            let next = self.tokens.peek().map(|entry| entry.token.clone());
            let visited = match slot {
                Some(slot) => self.visit(&token, next.as_ref(), slot),
                None => {
                    if token.kind == TokenKind::StringLiteral {
                        self.scan_string(&token);
                    }
                    Ok(None)
                }
            };
            self.previous = Some(token);
            match visited {
                Ok(Some(classification)) => return Some(Ok(classification)),
                Ok(None) => continue,
                Err(err) => {
                    if debug_trace_enabled() {
                        eprintln!("[BAREWORD_TRACE] abort: {err}");
                    }
                    self.abort = Some(err.clone());
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Analyzes one unit to completion.
pub fn analyze_unit<T>(unit: &str, tokens: T, mode: Mode) -> UnitReport
where
    T: IntoIterator<Item = SlottedToken>,
{
    UnitAnalyzer::new(tokens, mode).run(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use crate::diagnostics::Outcome;
    use crate::token::Position;
    use crate::trace::with_debug_trace;

    fn ident(text: &str, column: usize) -> SlottedToken {
        SlottedToken::plain(Token::identifier(text, 1, column))
    }

    fn slotted(text: &str, column: usize, slot: Slot) -> SlottedToken {
        SlottedToken::slotted(Token::identifier(text, 1, column), slot)
    }

    fn sym(kind: TokenKind, text: &str, column: usize) -> SlottedToken {
        SlottedToken::plain(Token::new(kind, text, 1, column))
    }

    #[test]
    fn declaration_is_visible_only_after_its_token() {
        let tokens = vec![
            slotted("greet", 1, Slot::StatementCall),
            sym(TokenKind::Punctuation, ";", 6),
            ident("sub", 8),
            slotted("greet", 12, Slot::CallableDeclaration),
            sym(TokenKind::Delimiter, "{", 18),
            sym(TokenKind::Delimiter, "}", 19),
            slotted("greet", 21, Slot::StatementCall),
            sym(TokenKind::Punctuation, ";", 26),
        ];
        let report = analyze_unit("order.pl", tokens, Mode::Permissive);
        let categories: Vec<Category> =
            report.classifications.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::UnknownIdentifierError,
                Category::CallableDeclaration,
                Category::BarewordCall,
            ]
        );
    }

    #[test]
    fn stopping_early_reports_partial_unit() {
        let tokens = vec![
            slotted("Annette", 1, Slot::PairValue),
            slotted("Bob", 10, Slot::PairValue),
            slotted("Carol", 20, Slot::PairValue),
        ];
        let mut analyzer = UnitAnalyzer::new(tokens, Mode::Strict);
        let first = analyzer.next().expect("first").expect("classified");
        assert_eq!(first.name, "Annette");
        let report = analyzer.finish("partial.pl");
        assert_eq!(report.classifications.len(), 1);
        assert_eq!(report.outcome, Outcome::Advisory);
    }

    #[test]
    fn pulled_state_is_visible_between_steps() {
        let tokens = vec![
            slotted("Logger", 9, Slot::NamespaceDeclaration),
            sym(TokenKind::Punctuation, ";", 15),
            slotted("Logger", 17, Slot::MemberAccess),
            sym(TokenKind::Operator, "->", 23),
        ];
        let mut analyzer = UnitAnalyzer::new(tokens, Mode::Strict);
        assert!(analyzer.tracker().is_empty());

        let declared = analyzer.next().expect("declaration").expect("classified");
        assert_eq!(declared.category, Category::NamespaceDeclaration);
        assert!(analyzer
            .tracker()
            .query("Logger")
            .contains(DeclarationKind::Namespace));
        assert_eq!(analyzer.classifications().len(), 1);

        let access = analyzer.next().expect("access").expect("classified");
        assert_eq!(access.category, Category::NamespaceName);
        assert_eq!(analyzer.classifications().last(), Some(&access));
        assert!(analyzer.next().is_none());
        assert_eq!(analyzer.tracker().len(), 1);
    }

    #[test]
    fn abort_stops_the_iterator() {
        let tokens = vec![
            ident("sort", 1),
            SlottedToken::slotted(Token::new(TokenKind::Number, "1", 1, 6), Slot::OrderingComparator),
            ident("@list", 8),
            slotted("later", 14, Slot::PairValue),
        ];
        let mut analyzer = UnitAnalyzer::new(tokens, Mode::Permissive);
        assert!(matches!(
            analyzer.next(),
            Some(Err(AnalysisError::InvalidOrderingOperandSyntax { .. }))
        ));
        assert!(analyzer.next().is_none());
        assert!(analyzer.is_aborted());
        let report = analyzer.finish("sort.pl");
        assert_eq!(report.outcome, Outcome::Aborted);
        assert!(report.classifications.is_empty());
        assert_eq!(
            report.abort.map(|abort| abort.position),
            Some(Position::new(1, 6))
        );
    }

    #[test]
    fn duplicate_constant_becomes_info_notice() {
        let tokens = vec![
            slotted("PI", 14, Slot::ConstantDeclaration),
            slotted("PI", 30, Slot::ConstantDeclaration),
        ];
        let report = analyze_unit("dup.pl", tokens, Mode::Strict);
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].code, "B0601");
        assert_eq!(report.outcome, Outcome::Clean);
    }

    #[test]
    fn constants_inside_interpolating_strings_are_noticed_once() {
        let tokens = vec![
            slotted("PI", 14, Slot::ConstantDeclaration),
            sym(TokenKind::StringLiteral, "\"PI is PI\"", 30),
            sym(TokenKind::StringLiteral, "'PI'", 45),
        ];
        let report = analyze_unit("interp.pl", tokens, Mode::Permissive);
        let codes: Vec<&str> = report.notices.iter().map(|n| n.code.as_str()).collect();
        assert_eq!(codes, vec!["B0602"]);
    }

    #[test]
    fn tracing_does_not_change_results() {
        let tokens = vec![
            slotted("Package", 1, Slot::MemberAccess),
            sym(TokenKind::Operator, "->", 8),
        ];
        let quiet = with_debug_trace(false, || analyze_unit("t.pl", tokens.clone(), Mode::Strict));
        let loud = with_debug_trace(true, || analyze_unit("t.pl", tokens, Mode::Strict));
        assert_eq!(quiet, loud);
    }
}
