use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::{AmbiguityLevel, AnalysisError, Category, Classification};
use crate::config::Mode;
use crate::token::Position;
use crate::tracker::DuplicateBenignDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A finding that is not a bareword classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub position: Position,
}

impl Notice {
    pub fn new(
        code: &str,
        severity: Severity,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
            position,
        }
    }

    pub fn duplicate_declaration(duplicate: &DuplicateBenignDeclaration) -> Self {
        Self::new("B0601", Severity::Info, duplicate.to_string(), duplicate.position)
    }

    pub fn constant_in_string(name: &str, position: Position) -> Self {
        Self::new(
            "B0602",
            Severity::Warning,
            format!(
                "constant '{name}' is not interpolated inside this string; concatenate it or \
                 write @{{[ {name} ]}}"
            ),
            position,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortRecord {
    pub code: String,
    pub message: String,
    pub position: Position,
}

impl From<&AnalysisError> for AbortRecord {
    fn from(err: &AnalysisError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            position: err.position(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Clean,
    Advisory,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    Accepted,
    AcceptedByConvention,
    Flagged,
}

impl Group {
    pub fn of(level: AmbiguityLevel) -> Self {
        match level {
            AmbiguityLevel::Unambiguous => Group::Accepted,
            AmbiguityLevel::ConventionalButRisky => Group::AcceptedByConvention,
            AmbiguityLevel::PriorArtLegacy | AmbiguityLevel::AmbiguousRequiresRewrite => {
                Group::Flagged
            }
        }
    }
}

/// Findings that fail a unit in strict mode.
pub fn is_fatal(classification: &Classification) -> bool {
    classification.ambiguity_level == AmbiguityLevel::AmbiguousRequiresRewrite
        || classification.category.is_error()
}

/// Default rewrite for categories the reporter must never leave without one.
pub fn suggested_rewrite(category: Category, name: &str) -> Option<String> {
    let rewrite = match category {
        Category::AmbiguousCallableOrNamespace => {
            format!("append namespace separator: {name}::->method")
        }
        Category::ImplicitCall => format!("add parentheses: {name}()"),
        Category::LiteralStringLegacy => format!("quote the string: '{name}'"),
        Category::BarewordCall => format!("add parentheses: {name}();"),
        Category::UnknownIdentifierError => format!(
            "declare 'sub {name}' before this line, call it as {name}(), or quote it as '{name}'"
        ),
        Category::LegacyGlobalHandle => format!(
            "use a lexical handle: open(my $fh, ...) and pass $fh instead of {name}"
        ),
        Category::ComparatorNameReference => format!(
            "assign a reference to a named scalar instead of passing the bare name: \
             my $by_{name} = \\&{name}; sort $by_{name} LIST"
        ),
        Category::ImplicitCallableDeclaration => {
            format!("spell the declaration out: sub {name} {{ ... }}")
        }
        Category::LiteralKey
        | Category::EvaluatedKey
        | Category::NamespaceName
        | Category::ConstantDeclaration
        | Category::ConstantReference
        | Category::CallableDeclaration
        | Category::NamespaceDeclaration
        | Category::LexicalHandleDeclaration
        | Category::StandardHandle => return None,
    };
    Some(rewrite)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub mode: Mode,
    pub outcome: Outcome,
    pub classifications: Vec<Classification>,
    pub notices: Vec<Notice>,
    pub abort: Option<AbortRecord>,
}

impl UnitReport {
    pub fn buckets(&self) -> BTreeMap<AmbiguityLevel, Vec<&Classification>> {
        let mut buckets: BTreeMap<AmbiguityLevel, Vec<&Classification>> = BTreeMap::new();
        for classification in &self.classifications {
            buckets
                .entry(classification.ambiguity_level)
                .or_default()
                .push(classification);
        }
        buckets
    }

    pub fn group(&self, group: Group) -> Vec<&Classification> {
        self.classifications
            .iter()
            .filter(|c| Group::of(c.ambiguity_level) == group)
            .collect()
    }

    pub fn fatal_findings(&self) -> Vec<&Classification> {
        self.classifications.iter().filter(|c| is_fatal(c)).collect()
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed | Outcome::Aborted)
    }
}

/// Collects one unit's findings and decides its outcome.
#[derive(Debug, Clone)]
pub struct Reporter {
    mode: Mode,
    classifications: Vec<Classification>,
    notices: Vec<Notice>,
}

impl Reporter {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            classifications: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Stores a classification, filling in the default rewrite when needed.
    pub fn admit(&mut self, mut classification: Classification) -> &Classification {
        if classification.suggested_rewrite.is_none() {
            classification.suggested_rewrite =
                suggested_rewrite(classification.category, &classification.name);
        }
        let index = self.classifications.len();
        self.classifications.push(classification);
        &self.classifications[index]
    }

    pub fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    pub fn finish(self, unit: &str, abort: Option<&AnalysisError>) -> UnitReport {
        let fatal = self.classifications.iter().any(is_fatal);
        let flagged = self
            .classifications
            .iter()
            .any(|c| Group::of(c.ambiguity_level) == Group::Flagged);
        let outcome = match (abort.is_some(), self.mode) {
            (true, _) => Outcome::Aborted,
            (false, Mode::Strict) if fatal => Outcome::Failed,
            _ if fatal || flagged => Outcome::Advisory,
            _ => Outcome::Clean,
        };
        UnitReport {
            unit: unit.to_string(),
            mode: self.mode,
            outcome,
            classifications: self.classifications,
            notices: self.notices,
            abort: abort.map(AbortRecord::from),
        }
    }
}

/// Reports for several units, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub units: Vec<UnitReport>,
}

impl AnalysisSummary {
    pub fn has_failures(&self) -> bool {
        self.units.iter().any(UnitReport::is_failure)
    }

    pub fn render(&self, verbose: bool) -> String {
        let mut output = String::new();
        for (index, report) in self.units.iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            output.push_str(&render_report(report, verbose));
        }
        output
    }
}

impl FromIterator<UnitReport> for AnalysisSummary {
    fn from_iter<T: IntoIterator<Item = UnitReport>>(iter: T) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

fn label(classification: &Classification, mode: Mode) -> &'static str {
    if is_fatal(classification) {
        return match mode {
            Mode::Strict => "error",
            Mode::Permissive => "warning",
        };
    }
    match classification.ambiguity_level {
        AmbiguityLevel::Unambiguous => "info",
        AmbiguityLevel::ConventionalButRisky => "note",
        AmbiguityLevel::PriorArtLegacy | AmbiguityLevel::AmbiguousRequiresRewrite => "warning",
    }
}

pub fn render_classification(unit: &str, classification: &Classification, mode: Mode) -> String {
    let mut output = String::new();
    let pos = &classification.position;
    output.push_str(&format!(
        "{}[{}] {}:{}:{} {}: {}\n",
        label(classification, mode),
        classification.code,
        unit,
        pos.line,
        pos.column,
        classification.category,
        classification.rationale
    ));
    if let Some(rewrite) = &classification.suggested_rewrite {
        output.push_str(&format!("  help: {rewrite}\n"));
    }
    output.trim_end().to_string()
}

pub fn render_notice(unit: &str, notice: &Notice) -> String {
    format!(
        "{}[{}] {}:{}:{} {}",
        notice.severity.as_str(),
        notice.code,
        unit,
        notice.position.line,
        notice.position.column,
        notice.message
    )
}

/// Line-oriented rendering; accepted classifications only when `verbose`.
pub fn render_report(report: &UnitReport, verbose: bool) -> String {
    let mut lines = Vec::new();
    for classification in &report.classifications {
        if !verbose && Group::of(classification.ambiguity_level) == Group::Accepted {
            continue;
        }
        lines.push(render_classification(&report.unit, classification, report.mode));
    }
    for notice in &report.notices {
        lines.push(render_notice(&report.unit, notice));
    }
    if let Some(abort) = &report.abort {
        lines.push(format!(
            "error[{}] {}:{}:{} {}\n  note: analysis of this unit stopped here",
            abort.code, report.unit, abort.position.line, abort.position.column, abort.message
        ));
    }
    lines.push(format!(
        "{}: {} accepted, {} by convention, {} flagged ({}, {})",
        report.unit,
        report.group(Group::Accepted).len(),
        report.group(Group::AcceptedByConvention).len(),
        report.group(Group::Flagged).len(),
        report.mode,
        outcome_str(report.outcome)
    ));
    lines.join("\n")
}

fn outcome_str(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Clean => "clean",
        Outcome::Advisory => "advisory",
        Outcome::Failed => "failed",
        Outcome::Aborted => "aborted",
    }
}
