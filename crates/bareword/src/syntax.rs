use crate::token::TokenKind;

/// Lifecycle blocks that run implicitly when written as `NAME { ... }` at top level.
pub const SPECIAL_BLOCKS: &[&str] = &["BEGIN", "UNITCHECK", "CHECK", "INIT", "END"];

pub const STANDARD_HANDLES: &[&str] = &["STDIN", "STDOUT", "STDERR"];

pub const NAMESPACE_SEPARATOR: &str = "::";
pub const MEMBER_ARROW: &str = "->";
pub const FAT_COMMA: &str = "=>";
pub const EVALUATION_MARKER: &str = "+";

pub const SUBROUTINE_KEYWORD: &str = "sub";
pub const PACKAGE_KEYWORD: &str = "package";
pub const CONSTANT_PRAGMA: &str = "constant";

pub const ORDERING_BUILTINS: &[&str] = &["sort"];

/// Builtins whose first operand may be a filehandle followed by the printed list.
pub const PRINT_LIKE: &[&str] = &["print", "printf", "say"];

/// Builtins whose first argument is a filehandle.
pub const HANDLE_BUILTINS: &[&str] = &[
    "open", "close", "binmode", "eof", "fileno", "flock", "seek", "tell", "truncate", "read",
    "sysread", "syswrite", "sysopen", "opendir", "readdir", "closedir", "select",
];

/// Builtins that may introduce a lexical handle: `open(my $fh, ...)`.
pub const OPEN_LIKE: &[&str] = &["open", "opendir", "sysopen"];

/// Builtins that produce a list, so they can follow a sort comparator.
pub const LIST_PRODUCERS: &[&str] = &["keys", "values", "map", "grep", "reverse", "split"];

pub const KEYWORDS_CONTROL: &[&str] = &[
    "if", "unless", "else", "elsif", "while", "until", "for", "foreach", "do", "return", "last",
    "next", "redo", "goto", "and", "or", "not", "xor", "eq", "ne", "lt", "gt", "le", "ge", "cmp",
    "x",
];

pub const KEYWORDS_DECLARATION: &[&str] = &[
    "my", "our", "local", "state", "sub", "package", "use", "no", "require",
];

pub const TOKEN_KEYWORDS: &[&str] = &[
    "__PACKAGE__", "__FILE__", "__LINE__", "__SUB__", "__END__", "__DATA__",
];

pub const BUILTINS: &[&str] = &[
    "print", "printf", "say", "open", "close", "binmode", "eof", "fileno", "flock", "seek",
    "tell", "truncate", "read", "sysread", "syswrite", "sysopen", "opendir", "readdir",
    "closedir", "select", "sort", "reverse", "map", "grep", "keys", "values", "each", "delete",
    "exists", "defined", "undef", "scalar", "wantarray", "ref", "bless", "die", "warn", "eval",
    "exit", "push", "pop", "shift", "unshift", "splice", "join", "split", "length", "substr",
    "index", "rindex", "lc", "uc", "lcfirst", "ucfirst", "sprintf", "chomp", "chop", "chr",
    "ord", "abs", "int", "sqrt", "time", "localtime", "gmtime", "sleep", "wait", "system",
    "exec", "caller", "pack", "unpack", "lock",
];

/// Words after which a `/` starts a pattern rather than a division.
pub const PATTERN_PRECEDERS: &[&str] = &[
    "split", "grep", "map", "if", "unless", "and", "or", "not", "return", "while", "until",
    "when",
];

pub const QUOTE_LIKE: &[&str] = &["q", "qq", "qw", "qr", "m", "s", "tr", "y"];

pub const SYMBOLS_3: &[([char; 3], &str)] = &[
    (['<', '=', '>'], "<=>"),
    (['*', '*', '='], "**="),
    (['|', '|', '='], "||="),
    (['&', '&', '='], "&&="),
    (['/', '/', '='], "//="),
    (['<', '<', '='], "<<="),
    (['>', '>', '='], ">>="),
    (['.', '.', '.'], "..."),
];

pub const SYMBOLS_2: &[([char; 2], &str)] = &[
    (['=', '>'], "=>"),
    (['-', '>'], "->"),
    ([':', ':'], "::"),
    (['=', '='], "=="),
    (['!', '='], "!="),
    (['<', '='], "<="),
    (['>', '='], ">="),
    (['&', '&'], "&&"),
    (['|', '|'], "||"),
    (['/', '/'], "//"),
    (['=', '~'], "=~"),
    (['!', '~'], "!~"),
    (['+', '+'], "++"),
    (['-', '-'], "--"),
    (['+', '='], "+="),
    (['-', '='], "-="),
    (['*', '='], "*="),
    (['/', '='], "/="),
    (['.', '='], ".="),
    (['*', '*'], "**"),
    (['.', '.'], ".."),
    (['<', '<'], "<<"),
    (['>', '>'], ">>"),
];

pub const SYMBOLS_1: &[char] = &[
    '{', '}', '(', ')', '[', ']', ',', ';', '.', ':', '=', '+', '-', '*', '/', '|', '&', '!',
    '<', '>', '?', '@', '%', '~', '^', '\\', '$',
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS_CONTROL.contains(&word)
        || KEYWORDS_DECLARATION.contains(&word)
        || TOKEN_KEYWORDS.contains(&word)
}

pub fn is_builtin(word: &str) -> bool {
    BUILTINS.contains(&word)
}

/// Words that never name a user bareword in call or value position.
pub fn is_reserved_word(word: &str) -> bool {
    is_keyword(word) || is_builtin(word)
}

pub fn is_special_block(word: &str) -> bool {
    SPECIAL_BLOCKS.contains(&word)
}

pub fn is_standard_handle(word: &str) -> bool {
    STANDARD_HANDLES.contains(&word)
}

pub fn symbol_kind(symbol: &str) -> TokenKind {
    match symbol {
        "(" | ")" | "[" | "]" | "{" | "}" => TokenKind::Delimiter,
        "," | ";" | "::" => TokenKind::Punctuation,
        _ => TokenKind::Operator,
    }
}
