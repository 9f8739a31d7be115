//! Slot-dispatched rule table for bareword occurrences.
//!
//! Classification is a pure function of the occurrence: its slot, its
//! immediate neighbors and the declaration snapshot taken before it. Any
//! declaration the occurrence introduces is returned in the [`Ruling`] and
//! recorded by the caller afterwards.

use std::fmt;

use serde::Serialize;

use crate::syntax;
use crate::token::{Position, Slot, Token};
use crate::tracker::{DeclarationKind, KindSet, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    LiteralKey,
    EvaluatedKey,
    NamespaceName,
    AmbiguousCallableOrNamespace,
    ImplicitCallableDeclaration,
    ConstantDeclaration,
    ConstantReference,
    CallableDeclaration,
    NamespaceDeclaration,
    LexicalHandleDeclaration,
    ImplicitCall,
    LiteralStringLegacy,
    BarewordCall,
    UnknownIdentifierError,
    StandardHandle,
    LegacyGlobalHandle,
    ComparatorNameReference,
}

impl Category {
    pub fn code(self) -> &'static str {
        match self {
            Category::LiteralKey => "B0101",
            Category::EvaluatedKey => "B0102",
            Category::NamespaceName => "B0103",
            Category::ConstantReference => "B0104",
            Category::StandardHandle => "B0105",
            Category::CallableDeclaration => "B0106",
            Category::NamespaceDeclaration => "B0107",
            Category::ConstantDeclaration => "B0108",
            Category::LexicalHandleDeclaration => "B0109",
            Category::ImplicitCallableDeclaration => "B0201",
            Category::ComparatorNameReference => "B0202",
            Category::LiteralStringLegacy => "B0301",
            Category::BarewordCall => "B0302",
            Category::LegacyGlobalHandle => "B0303",
            Category::AmbiguousCallableOrNamespace => "B0401",
            Category::ImplicitCall => "B0402",
            Category::UnknownIdentifierError => "B0501",
        }
    }

    pub fn is_error(self) -> bool {
        self == Category::UnknownIdentifierError
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Severity of a finding, ordered from harmless to rewrite-required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AmbiguityLevel {
    Unambiguous,
    ConventionalButRisky,
    PriorArtLegacy,
    AmbiguousRequiresRewrite,
}

impl AmbiguityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AmbiguityLevel::Unambiguous => "unambiguous",
            AmbiguityLevel::ConventionalButRisky => "conventional but risky",
            AmbiguityLevel::PriorArtLegacy => "legacy",
            AmbiguityLevel::AmbiguousRequiresRewrite => "ambiguous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub code: String,
    pub name: String,
    pub slot: Slot,
    pub position: Position,
    pub category: Category,
    pub ambiguity_level: AmbiguityLevel,
    pub rationale: String,
    pub suggested_rewrite: Option<String>,
    /// Set for constants: they never interpolate inside double-quoted strings.
    pub non_interpolating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error(
        "invalid ordering operand '{text}' at {position}: the comparator of sort must be a \
         subroutine name, a block, or a scalar holding a code reference"
    )]
    InvalidOrderingOperandSyntax { text: String, position: Position },
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidOrderingOperandSyntax { .. } => "B0502",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            AnalysisError::InvalidOrderingOperandSyntax { position, .. } => *position,
        }
    }
}

/// One slotted token as seen by the classifier.
#[derive(Debug, Clone)]
pub struct Occurrence<'a> {
    pub token: &'a Token,
    pub slot: Slot,
    pub previous: Option<&'a Token>,
    pub next: Option<&'a Token>,
    /// Declarations recorded strictly before this token.
    pub snapshot: Snapshot,
}

impl Occurrence<'_> {
    pub fn name(&self) -> &str {
        self.token.name()
    }

    fn kinds(&self) -> KindSet {
        self.snapshot.query(self.name())
    }

    fn declared_at(&self, kind: DeclarationKind) -> Option<Position> {
        self.snapshot.first_declaration(self.name(), kind)
    }

    fn next_is(&self, predicate: impl Fn(&Token) -> bool) -> bool {
        self.next.is_some_and(predicate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruling {
    pub classification: Classification,
    /// Declaration introduced by this occurrence, to be recorded after it.
    pub declares: Option<DeclarationKind>,
}

impl Ruling {
    fn new(
        occurrence: &Occurrence<'_>,
        category: Category,
        ambiguity_level: AmbiguityLevel,
        rationale: String,
    ) -> Self {
        Self {
            classification: Classification {
                code: category.code().to_string(),
                name: occurrence.name().to_string(),
                slot: occurrence.slot,
                position: occurrence.token.position,
                category,
                ambiguity_level,
                rationale,
                suggested_rewrite: None,
                non_interpolating: matches!(
                    category,
                    Category::ConstantDeclaration | Category::ConstantReference
                ),
            },
            declares: None,
        }
    }

    fn declaring(mut self, kind: DeclarationKind) -> Self {
        self.declares = Some(kind);
        self
    }

    fn rewrite(mut self, rewrite: String) -> Self {
        self.classification.suggested_rewrite = Some(rewrite);
        self
    }
}

/// Classifies one occurrence. `Ok(None)` means the token carries no bareword
/// to classify (a sort block, a code-reference scalar, or a misplaced hint).
pub fn classify(occurrence: &Occurrence<'_>) -> Result<Option<Ruling>, AnalysisError> {
    let token = occurrence.token;
    if occurrence.slot == Slot::OrderingComparator {
        return classify_comparator(occurrence);
    }
    if occurrence.slot == Slot::LexicalHandleDeclaration && token.is_scalar_variable() {
        return Ok(Some(declaration(occurrence)));
    }
    if !token.is_bareword() {
        return Ok(None);
    }

    if is_reference_slot(occurrence.slot) && occurrence.kinds().contains(DeclarationKind::Constant)
    {
        return Ok(Some(constant_reference(occurrence)));
    }

    let ruling = match occurrence.slot {
        Slot::ContainerKey => container_key(occurrence),
        Slot::MemberAccess => member_access(occurrence),
        Slot::SpecialBlock => special_block(occurrence),
        Slot::ConstantDeclaration
        | Slot::CallableDeclaration
        | Slot::NamespaceDeclaration
        | Slot::LexicalHandleDeclaration => declaration(occurrence),
        Slot::PairValue => pair_value(occurrence),
        Slot::StatementCall => statement_call(occurrence),
        Slot::IoHandle => io_handle(occurrence),
        Slot::OrderingComparator => return classify_comparator(occurrence),
    };
    Ok(Some(ruling))
}

fn is_reference_slot(slot: Slot) -> bool {
    matches!(
        slot,
        Slot::MemberAccess | Slot::PairValue
            | Slot::StatementCall
            | Slot::IoHandle
    )
}

fn constant_reference(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    let declared = occurrence
        .declared_at(DeclarationKind::Constant)
        .map(|pos| format!(" at {pos}"))
        .unwrap_or_default();
    Ruling::new(
        occurrence,
        Category::ConstantReference,
        AmbiguityLevel::Unambiguous,
        format!(
            "'{name}' was declared as a constant{declared}; it is not interpolated inside \
             double-quoted strings"
        ),
    )
}

fn container_key(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    let marked = occurrence
        .previous
        .is_some_and(|prev| prev.is_operator(syntax::EVALUATION_MARKER));
    let has_arguments = occurrence.next_is(|next| {
        !(next.is_delimiter("}")
            || next.is_operator(syntax::FAT_COMMA)
            || next.is_punctuation(",")
            || next.is_namespace_separator())
    });

    if marked {
        return Ruling::new(
            occurrence,
            Category::EvaluatedKey,
            AmbiguityLevel::Unambiguous,
            format!("unary '+' forces '{name}' to be evaluated; its result is the key"),
        );
    }
    if has_arguments {
        return Ruling::new(
            occurrence,
            Category::EvaluatedKey,
            AmbiguityLevel::Unambiguous,
            format!("'{name}' is followed by call arguments; the key is the result of the call"),
        );
    }

    let literal = Ruling::new(
        occurrence,
        Category::LiteralKey,
        AmbiguityLevel::Unambiguous,
        format!("a lone bareword key is always the literal string '{name}'"),
    );
    let shadowed = [DeclarationKind::Constant, DeclarationKind::Callable]
        .into_iter()
        .find_map(|kind| occurrence.declared_at(kind).map(|pos| (kind, pos)));
    match shadowed {
        Some((kind, pos)) => {
            let target = match kind {
                DeclarationKind::Constant => "use the constant",
                _ => "call the subroutine",
            };
            let mut ruling = literal.rewrite(format!(
                "use unary evaluation marker: {{+{name}}} or {{{name}()}} to {target}"
            ));
            ruling.classification.rationale = format!(
                "a lone bareword key is always the literal string '{name}'; the {kind} \
                 declared at {pos} is not used"
            );
            ruling
        }
        None => literal,
    }
}

fn member_access(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    if occurrence.next_is(Token::is_namespace_separator) {
        return Ruling::new(
            occurrence,
            Category::NamespaceName,
            AmbiguityLevel::Unambiguous,
            format!("trailing '::' names the package '{name}' explicitly"),
        );
    }

    let kinds = occurrence.kinds();
    let namespace = kinds.contains(DeclarationKind::Namespace);
    let callable = kinds.contains(DeclarationKind::Callable);
    let rationale = match (namespace, callable) {
        (true, false) => {
            let pos = occurrence
                .declared_at(DeclarationKind::Namespace)
                .map(|pos| format!(" at {pos}"))
                .unwrap_or_default();
            return Ruling::new(
                occurrence,
                Category::NamespaceName,
                AmbiguityLevel::Unambiguous,
                format!("'{name}' was declared as a package{pos}"),
            );
        }
        (true, true) => format!(
            "'{name}' is declared both as a package and as a subroutine; the invocant depends \
             on which one the parser prefers"
        ),
        (false, true) => format!(
            "'{name}' is a declared subroutine, so the call's result becomes the invocant \
             instead of the package '{name}'"
        ),
        (false, false) => format!(
            "'{name}' is not a known package; if a subroutine '{name}' exists when this runs, \
             its result becomes the invocant"
        ),
    };
    Ruling::new(
        occurrence,
        Category::AmbiguousCallableOrNamespace,
        AmbiguityLevel::AmbiguousRequiresRewrite,
        rationale,
    )
}

fn special_block(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    if !syntax::is_special_block(name) || !occurrence.next_is(|next| next.is_delimiter("{")) {
        return statement_call(occurrence);
    }
    Ruling::new(
        occurrence,
        Category::ImplicitCallableDeclaration,
        AmbiguityLevel::ConventionalButRisky,
        format!("'{name} {{ ... }}' declares a special block without the 'sub' keyword"),
    )
    .declaring(DeclarationKind::SpecialBlock)
}

fn declaration(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    let (category, kind) = match occurrence.slot {
        Slot::ConstantDeclaration => (Category::ConstantDeclaration, DeclarationKind::Constant),
        Slot::NamespaceDeclaration => (Category::NamespaceDeclaration, DeclarationKind::Namespace),
        Slot::LexicalHandleDeclaration => (
            Category::LexicalHandleDeclaration,
            DeclarationKind::LexicalHandle,
        ),
        _ => (Category::CallableDeclaration, DeclarationKind::Callable),
    };
    let rationale = match kind {
        DeclarationKind::Constant => format!(
            "'{name}' is declared as a constant; later barewords '{name}' refer to it and are \
             not interpolated"
        ),
        _ => format!("'{name}' is declared as a {kind}"),
    };
    Ruling::new(occurrence, category, AmbiguityLevel::Unambiguous, rationale).declaring(kind)
}

fn pair_value(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    match occurrence.declared_at(DeclarationKind::Callable) {
        Some(pos) => Ruling::new(
            occurrence,
            Category::ImplicitCall,
            AmbiguityLevel::AmbiguousRequiresRewrite,
            format!(
                "'{name}' names the subroutine declared at {pos}; the value is its result, \
                 not the string '{name}'"
            ),
        ),
        None => Ruling::new(
            occurrence,
            Category::LiteralStringLegacy,
            AmbiguityLevel::PriorArtLegacy,
            format!("no subroutine '{name}' is declared yet, so the value is the string '{name}'"),
        ),
    }
}

fn statement_call(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    match occurrence.declared_at(DeclarationKind::Callable) {
        Some(pos) => Ruling::new(
            occurrence,
            Category::BarewordCall,
            AmbiguityLevel::PriorArtLegacy,
            format!("calls the subroutine '{name}' declared at {pos} without parentheses"),
        ),
        None => Ruling::new(
            occurrence,
            Category::UnknownIdentifierError,
            AmbiguityLevel::AmbiguousRequiresRewrite,
            format!("bareword '{name}' in call position, but no subroutine '{name}' is declared"),
        ),
    }
}

fn io_handle(occurrence: &Occurrence<'_>) -> Ruling {
    let name = occurrence.name();
    if syntax::is_standard_handle(name) {
        return Ruling::new(
            occurrence,
            Category::StandardHandle,
            AmbiguityLevel::Unambiguous,
            format!("'{name}' is a standard handle"),
        );
    }
    let ruling = Ruling::new(
        occurrence,
        Category::LegacyGlobalHandle,
        AmbiguityLevel::PriorArtLegacy,
        format!("'{name}' is a package-global bareword filehandle"),
    );
    match occurrence.declared_at(DeclarationKind::LexicalHandle) {
        Some(pos) => ruling.rewrite(format!(
            "use the lexical handle declared at {pos}: write ${name} instead of {name}"
        )),
        None => ruling,
    }
}

fn classify_comparator(occurrence: &Occurrence<'_>) -> Result<Option<Ruling>, AnalysisError> {
    let token = occurrence.token;
    if token.is_delimiter("{") || token.is_scalar_variable() {
        return Ok(None);
    }
    if !token.is_bareword() {
        return Err(AnalysisError::InvalidOrderingOperandSyntax {
            text: token.text.clone(),
            position: token.position,
        });
    }

    let name = occurrence.name();
    let rationale = match occurrence.declared_at(DeclarationKind::Callable) {
        Some(pos) => format!(
            "'{name}' refers to the comparator subroutine declared at {pos}; the bare name \
             is easy to misread as a list element"
        ),
        None => format!(
            "'{name}' is taken as a comparator subroutine name, but no such subroutine is \
             declared yet; it is resolved when sort runs"
        ),
    };
    Ok(Some(Ruling::new(
        occurrence,
        Category::ComparatorNameReference,
        AmbiguityLevel::ConventionalButRisky,
        rationale,
    )))
}
