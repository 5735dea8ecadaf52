//! Core domain types for scrapechain pipeline runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SearchTerm
// ---------------------------------------------------------------------------

/// The operator-supplied search term. Never validated or trimmed beyond the
/// line terminator; the empty string is a valid term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: impl Into<String>) -> Self {
        Self(term.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SearchTerm {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SearchTerm {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// StageName
// ---------------------------------------------------------------------------

/// The four pipeline stages, in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    /// Search/scrape tool producing the raw data file.
    Fetch,
    /// Database loader ingesting the fetched file.
    Load,
    /// Text exporter reading the populated store.
    Export,
    /// Indexer reading the text export.
    Index,
}

impl StageName {
    /// All stages in execution order.
    pub const ALL: [StageName; 4] = [Self::Fetch, Self::Load, Self::Export, Self::Index];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Load => "load",
            Self::Export => "export",
            Self::Index => "index",
        }
    }

    /// Zero-based position in the execution order.
    pub fn position(&self) -> usize {
        match self {
            Self::Fetch => 0,
            Self::Load => 1,
            Self::Export => 2,
            Self::Index => 3,
        }
    }

    /// The stage that runs after this one, if any.
    pub fn next(&self) -> Option<StageName> {
        Self::ALL.get(self.position() + 1).copied()
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ArtifactSpec
// ---------------------------------------------------------------------------

/// A durable artifact handed from one stage to the next.
///
/// When `flag` is set the runner passes `<flag> <path>` on the stage's command
/// line. Without a flag the artifact is still declared, which lets the plan
/// validate bindings, but the stage locates it by its own convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    /// File, directory, or store locator.
    pub path: PathBuf,
    /// Command-line flag used to hand the path to the stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

impl ArtifactSpec {
    /// An artifact located by convention only.
    pub fn implicit(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flag: None,
        }
    }

    /// An artifact passed to the stage as `<flag> <path>`.
    pub fn flagged(path: impl Into<PathBuf>, flag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            flag: Some(flag.into()),
        }
    }

    /// The `[flag, path]` argument pair, if this artifact is passed explicitly.
    pub fn cli_args(&self) -> Option<[String; 2]> {
        self.flag
            .as_ref()
            .map(|flag| [flag.clone(), self.path.to_string_lossy().into_owned()])
    }
}

// ---------------------------------------------------------------------------
// StageOutcome
// ---------------------------------------------------------------------------

/// What a finished stage reported back to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    /// Exit status 0.
    Succeeded,
    /// Any other exit. `code` is `None` when the process was killed by a signal.
    Failed { code: Option<i32> },
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl From<std::process::ExitStatus> for StageOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            Self::Succeeded
        } else {
            Self::Failed {
                code: status.code(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Lifecycle of a single pipeline run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    AwaitingInput,
    Running(StageName),
    Completed,
    Aborted(StageName),
}

impl RunState {
    /// Whether the run has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted(_))
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (*self, next) {
            (Self::NotStarted, Self::AwaitingInput) => true,
            (Self::AwaitingInput, Self::Running(StageName::Fetch)) => true,
            (Self::Running(current), Self::Running(following)) => {
                current.next() == Some(following)
            }
            (Self::Running(StageName::Index), Self::Completed) => true,
            (Self::Running(current), Self::Aborted(failed)) => current == failed,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::AwaitingInput => write!(f, "awaiting-input"),
            Self::Running(stage) => write!(f, "running({stage})"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted(stage) => write!(f, "aborted({stage})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(StageName::Fetch.next(), Some(StageName::Load));
        assert_eq!(StageName::Load.next(), Some(StageName::Export));
        assert_eq!(StageName::Export.next(), Some(StageName::Index));
        assert_eq!(StageName::Index.next(), None);
        assert!(StageName::Fetch < StageName::Index);
    }

    #[test]
    fn stage_name_serializes_lowercase() {
        let json = serde_json::to_string(&StageName::Export).expect("serialize");
        assert_eq!(json, "\"export\"");
    }

    #[test]
    fn flagged_artifact_produces_cli_args() {
        let artifact = ArtifactSpec::flagged("data.json", "--filename");
        assert_eq!(
            artifact.cli_args(),
            Some(["--filename".to_string(), "data.json".to_string()])
        );
        assert_eq!(ArtifactSpec::implicit("data.json").cli_args(), None);
    }

    #[test]
    fn run_state_moves_forward_only() {
        use RunState::*;
        assert!(NotStarted.can_transition_to(AwaitingInput));
        assert!(AwaitingInput.can_transition_to(Running(StageName::Fetch)));
        assert!(Running(StageName::Fetch).can_transition_to(Running(StageName::Load)));
        assert!(Running(StageName::Index).can_transition_to(Completed));
        assert!(Running(StageName::Load).can_transition_to(Aborted(StageName::Load)));

        assert!(!Running(StageName::Load).can_transition_to(Running(StageName::Fetch)));
        assert!(!Running(StageName::Fetch).can_transition_to(Running(StageName::Export)));
        assert!(!Running(StageName::Export).can_transition_to(Completed));
        assert!(!Running(StageName::Load).can_transition_to(Aborted(StageName::Fetch)));
        assert!(!Completed.can_transition_to(NotStarted));
        assert!(!Aborted(StageName::Fetch).can_transition_to(Running(StageName::Load)));
    }

    #[test]
    fn search_term_keeps_content_verbatim() {
        let term = SearchTerm::new("  rust lang ");
        assert_eq!(term.as_str(), "  rust lang ");
        assert!(SearchTerm::new("").is_empty());
    }
}
