use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BarewordError;

pub const CONFIG_FILE_NAME: &str = "bareword.toml";

/// Whether rewrite-required findings fail the unit or are only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Strict,
    #[default]
    Permissive,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Strict => "strict",
            Mode::Permissive => "permissive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = BarewordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "strict" => Ok(Mode::Strict),
            "permissive" => Ok(Mode::Permissive),
            other => Err(BarewordError::Config(format!(
                "unknown mode '{other}' (expected strict or permissive)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BarewordToml {
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnalysisSection {
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub format: OutputFormat,
    /// Also print accepted (unambiguous) classifications in text output.
    #[serde(default)]
    pub verbose: bool,
}

pub fn parse_bareword_toml(text: &str) -> Result<BarewordToml, BarewordError> {
    toml::from_str(text).map_err(|err| BarewordError::Config(err.to_string()))
}

pub fn read_bareword_toml(path: &Path) -> Result<BarewordToml, BarewordError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text)
        .map_err(|err| BarewordError::Config(format!("failed to parse {}: {err}", path.display())))
}

/// `bareword.toml` in `dir`, if present.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}
