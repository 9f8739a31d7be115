//! Tokenizer for raw source files.
//!
//! The analysis engine only consumes tokens; this lexer exists so the CLI can
//! feed it plain source. It understands enough of the surface syntax to keep
//! quoted text, patterns, heredocs and POD out of the identifier stream.

use crate::diagnostics::{Notice, Severity};
use crate::syntax;
use crate::token::{Position, Token, TokenKind};

pub fn lex(content: &str) -> (Vec<Token>, Vec<Notice>) {
    let mut lexer = Lexer::new(content);
    lexer.run();
    (lexer.tokens, lexer.notices)
}

struct PendingHeredoc {
    terminator: String,
    indented: bool,
    token_index: usize,
    start: Position,
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    notices: Vec<Notice>,
    heredocs: Vec<PendingHeredoc>,
}

impl Lexer {
    fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            notices: Vec::new(),
            heredocs: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek(0)?;
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.index].iter().collect()
    }

    fn push(&mut self, kind: TokenKind, text: String, position: Position) {
        self.tokens.push(Token {
            kind,
            text,
            position,
        });
    }

    fn run(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch == '\n' {
                self.bump();
                self.read_heredoc_bodies();
                continue;
            }
            if ch.is_whitespace() {
                self.bump();
                continue;
            }
            // POD runs from a `=word` line to the next `=cut` line.
            if ch == '=' && self.col == 1 && self.peek(1).is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.skip_pod();
                continue;
            }
            if ch == '#' {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.bump();
                }
                continue;
            }

            let start = self.index;
            let position = self.position();

            if ch == '"' || ch == '\'' || ch == '`' {
                self.bump();
                let closed = self.scan_body(ch);
                self.push_literal(start, position, closed);
                continue;
            }
            if self.starts_variable(ch) {
                self.lex_variable(start, position);
                continue;
            }
            if is_ident_start(ch) {
                if self.lex_word(start, position) {
                    break;
                }
                continue;
            }
            if ch.is_ascii_digit() {
                self.lex_number(start, position);
                continue;
            }
            if ch == '/' && self.pattern_allowed() {
                self.bump();
                let closed = self.scan_body('/');
                self.skip_modifiers();
                self.push_literal(start, position, closed);
                continue;
            }
            if ch == '<' && self.peek(1) == Some('<') && self.lex_heredoc(start, position) {
                continue;
            }
            if let Some((symbol, len)) = match_symbol(&self.chars, self.index) {
                for _ in 0..len {
                    self.bump();
                }
                let kind = syntax::symbol_kind(&symbol);
                self.push(kind, symbol, position);
                continue;
            }

            self.notices.push(Notice::new(
                "B0604",
                Severity::Warning,
                format!("unexpected character '{ch}'"),
                position,
            ));
            self.bump();
        }

        for heredoc in std::mem::take(&mut self.heredocs) {
            self.notices.push(unterminated_heredoc(&heredoc));
        }
    }

    fn skip_pod(&mut self) {
        loop {
            let line_start = self.index;
            while self.peek(0).is_some_and(|c| c != '\n') {
                self.bump();
            }
            let line = self.text_from(line_start);
            self.bump();
            if line.starts_with("=cut") || self.peek(0).is_none() {
                break;
            }
        }
    }

    fn starts_variable(&self, ch: char) -> bool {
        let next = self.peek(1);
        match ch {
            '$' => next.is_some_and(|c| {
                is_ident_start(c)
                    || c.is_ascii_digit()
                    || c == ':'
                    || (c == '#' && self.peek(2).is_some_and(is_ident_start))
                    || "!@/\\,;.0&\"_".contains(c)
            }),
            '@' => next.is_some_and(|c| is_ident_start(c) || c == ':'),
            '%' | '&' => !self.previous_is_value() && next.is_some_and(is_ident_start),
            _ => false,
        }
    }

    fn lex_variable(&mut self, start: usize, position: Position) {
        let sigil = self.bump();
        if sigil == Some('$') && self.peek(0) == Some('#') {
            self.bump();
        }
        match self.peek(0) {
            Some(c) if is_ident_start(c) || c == ':' => self.scan_qualified_name(),
            Some(c) if c.is_ascii_digit() => {
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
            Some(_) => {
                // Punctuation variable such as `$!` or `$@`.
                self.bump();
            }
            None => {}
        }
        let text = self.text_from(start);
        self.push(TokenKind::Identifier, text, position);
    }

    fn scan_qualified_name(&mut self) {
        loop {
            while self.peek(0).is_some_and(is_ident_continue) {
                self.bump();
            }
            if self.peek(0) == Some(':')
                && self.peek(1) == Some(':')
                && self.peek(2).is_some_and(is_ident_start)
            {
                self.bump();
                self.bump();
                continue;
            }
            break;
        }
    }

    /// Returns `true` when the word ends the code section (`__END__`).
    fn lex_word(&mut self, start: usize, position: Position) -> bool {
        self.scan_qualified_name();
        let word = self.text_from(start);

        if word == "__END__" || word == "__DATA__" {
            return true;
        }
        let method_name = self
            .tokens
            .last()
            .is_some_and(|t| t.is_operator(syntax::MEMBER_ARROW));
        if !method_name && syntax::QUOTE_LIKE.contains(&word.as_str()) {
            if let Some(open) = self.quote_like_delimiter() {
                while self.peek(0).is_some_and(char::is_whitespace) {
                    self.bump();
                }
                self.bump();
                let mut closed = self.scan_body(open);
                if closed && matches!(word.as_str(), "s" | "tr" | "y") {
                    closed = self.scan_second_body(open);
                }
                self.skip_modifiers();
                self.push_literal(start, position, closed);
                return false;
            }
        }
        self.push(TokenKind::Identifier, word, position);
        false
    }

    /// Delimiter opening a quote-like body, if the word really starts one.
    fn quote_like_delimiter(&self) -> Option<char> {
        let mut offset = 0;
        while self.peek(offset).is_some_and(|c| c == ' ' || c == '\t') {
            offset += 1;
        }
        let open = self.peek(offset)?;
        if offset > 0 && !matches!(open, '(' | '[' | '{' | '<' | '/' | '|' | '!') {
            return None;
        }
        if open.is_alphanumeric()
            || open.is_whitespace()
            || matches!(open, ',' | ';' | ')' | ']' | '}')
        {
            return None;
        }
        if open == '=' || (open == '-' && self.peek(offset + 1) == Some('>')) {
            return None;
        }
        Some(open)
    }

    /// Scans up to and including the closing delimiter for `open`.
    fn scan_body(&mut self, open: char) -> bool {
        let close = closing_delimiter(open);
        let nests = close != open;
        let mut depth = 0usize;
        while let Some(ch) = self.peek(0) {
            if ch == '\\' && self.peek(1).is_some() {
                self.bump();
                self.bump();
                continue;
            }
            self.bump();
            if nests && ch == open {
                depth += 1;
            } else if ch == close {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
        }
        false
    }

    fn scan_second_body(&mut self, open: char) -> bool {
        if closing_delimiter(open) == open {
            return self.scan_body(open);
        }
        while self.peek(0).is_some_and(char::is_whitespace) {
            self.bump();
        }
        match self.bump() {
            Some(next_open) => self.scan_body(next_open),
            None => false,
        }
    }

    fn skip_modifiers(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
    }

    fn push_literal(&mut self, start: usize, position: Position, closed: bool) {
        let text = self.text_from(start);
        if !closed {
            self.notices.push(Notice::new(
                "B0603",
                Severity::Warning,
                "unterminated string literal",
                position,
            ));
        }
        self.push(TokenKind::StringLiteral, text, position);
    }

    fn lex_number(&mut self, start: usize, position: Position) {
        if self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X' | 'b' | 'B')) {
            self.bump();
            self.bump();
            while self
                .peek(0)
                .is_some_and(|c| c.is_ascii_hexdigit() || c == '_')
            {
                self.bump();
            }
        } else {
            self.scan_digits();
            if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                self.scan_digits();
            }
            if matches!(self.peek(0), Some('e' | 'E'))
                && self
                    .peek(1)
                    .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+')
            {
                self.bump();
                self.bump();
                self.scan_digits();
            }
        }
        let text = self.text_from(start);
        self.push(TokenKind::Number, text, position);
    }

    fn scan_digits(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn previous_is_value(&self) -> bool {
        match self.tokens.last() {
            Some(token) => match token.kind {
                TokenKind::Identifier => {
                    token.sigil().is_some() || !syntax::is_reserved_word(&token.text)
                }
                TokenKind::Number | TokenKind::StringLiteral => true,
                TokenKind::Delimiter => matches!(token.text.as_str(), ")" | "]" | "}"),
                TokenKind::Operator | TokenKind::Punctuation => false,
            },
            None => false,
        }
    }

    fn pattern_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(token) => match token.kind {
                TokenKind::Operator | TokenKind::Punctuation => true,
                TokenKind::Delimiter => matches!(token.text.as_str(), "(" | "[" | "{"),
                TokenKind::Identifier => {
                    syntax::PATTERN_PRECEDERS.contains(&token.text.as_str())
                }
                TokenKind::Number | TokenKind::StringLiteral => false,
            },
        }
    }

    /// `<<"EOF"`, `<<'EOF'`, `<<EOF` and the indented `<<~` forms.
    fn lex_heredoc(&mut self, start: usize, position: Position) -> bool {
        let mut offset = 2;
        let indented = self.peek(offset) == Some('~');
        if indented {
            offset += 1;
        }
        let terminator = match self.peek(offset) {
            Some(quote @ ('"' | '\'')) => {
                let mut end = offset + 1;
                while self.peek(end).is_some_and(|c| c != quote && c != '\n') {
                    end += 1;
                }
                if self.peek(end) != Some(quote) {
                    return false;
                }
                let name: String = self.chars[self.index + offset + 1..self.index + end]
                    .iter()
                    .collect();
                offset = end + 1;
                name
            }
            Some(c) if is_ident_start(c) => {
                let mut end = offset;
                while self.peek(end).is_some_and(is_ident_continue) {
                    end += 1;
                }
                let name: String = self.chars[self.index + offset..self.index + end]
                    .iter()
                    .collect();
                offset = end;
                name
            }
            _ => return false,
        };
        for _ in 0..offset {
            self.bump();
        }
        let text = self.text_from(start);
        self.push(TokenKind::StringLiteral, text, position);
        self.heredocs.push(PendingHeredoc {
            terminator,
            indented,
            token_index: self.tokens.len() - 1,
            start: position,
        });
        true
    }

    fn read_heredoc_bodies(&mut self) {
        for heredoc in std::mem::take(&mut self.heredocs) {
            let mut body = String::new();
            let mut terminated = false;
            while self.peek(0).is_some() {
                let line_start = self.index;
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.bump();
                }
                let line = self.text_from(line_start);
                self.bump();
                let candidate = if heredoc.indented {
                    line.trim_start()
                } else {
                    line.as_str()
                };
                if candidate == heredoc.terminator {
                    terminated = true;
                    break;
                }
                body.push('\n');
                body.push_str(&line);
            }
            if let Some(token) = self.tokens.get_mut(heredoc.token_index) {
                token.text.push_str(&body);
            }
            if !terminated {
                self.notices.push(unterminated_heredoc(&heredoc));
            }
        }
    }
}

fn unterminated_heredoc(heredoc: &PendingHeredoc) -> Notice {
    Notice::new(
        "B0605",
        Severity::Warning,
        format!("heredoc terminator '{}' never found", heredoc.terminator),
        heredoc.start,
    )
}

fn closing_delimiter(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn match_symbol(chars: &[char], index: usize) -> Option<(String, usize)> {
    if index + 2 < chars.len() {
        for (needle, symbol) in syntax::SYMBOLS_3 {
            if chars[index] == needle[0]
                && chars[index + 1] == needle[1]
                && chars[index + 2] == needle[2]
            {
                return Some(((*symbol).to_string(), 3));
            }
        }
    }

    if index + 1 < chars.len() {
        for (needle, symbol) in syntax::SYMBOLS_2 {
            if chars[index] == needle[0] && chars[index + 1] == needle[1] {
                return Some(((*symbol).to_string(), 2));
            }
        }
    }

    let ch = chars[index];
    if syntax::SYMBOLS_1.contains(&ch) {
        return Some((ch.to_string(), 1));
    }

    None
}
