//! Pipeline configuration for scrapechain.
//!
//! User config lives at `~/.scrapechain/scrapechain.toml`.
//! A `--config` flag overrides the location; a missing default file falls back
//! to built-in defaults: the reddit_tool / post_db / db2txt / indexer scripts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapechainError};
use crate::types::{ArtifactSpec, StageName};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "scrapechain.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".scrapechain";

/// Data file written by `fetch` and read by `load`.
pub const DEFAULT_FETCH_OUTPUT: &str = "data.json";

/// Store populated by `load` and read by `export`.
pub const DEFAULT_STORE: &str = "postgres://localhost:5432/mydatabase";

/// Directory of text files written by `export` and read by `index`.
pub const DEFAULT_EXPORT_DIR: &str = "posts_output";

/// Index file written by `index`.
pub const DEFAULT_INDEX_OUTPUT: &str = "posts.json";

// ---------------------------------------------------------------------------
// Config structs (matching scrapechain.toml schema)
// ---------------------------------------------------------------------------

/// Top-level pipeline config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Fetch-stage parameters.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Per-stage program and artifact declarations.
    #[serde(default)]
    pub stages: StagesConfig,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Result-count limit handed to the fetch tool.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Flag used to pass the limit.
    #[serde(default = "default_limit_flag")]
    pub limit_flag: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            limit_flag: default_limit_flag(),
        }
    }
}

fn default_limit() -> u32 {
    3
}
fn default_limit_flag() -> String {
    "--limit".into()
}

/// `[stages]` section. Each `[stages.<name>]` table is laid over that stage's
/// defaults, so a table that only sets `program` keeps the default artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StagesFile")]
pub struct StagesConfig {
    pub fetch: StageConfig,
    pub load: StageConfig,
    pub export: StageConfig,
    pub index: StageConfig,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            fetch: default_fetch_stage(),
            load: default_load_stage(),
            export: default_export_stage(),
            index: default_index_stage(),
        }
    }
}

/// `[stages]` as written in the file. Unknown stage names are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StagesFile {
    #[serde(default)]
    fetch: Option<StageOverride>,
    #[serde(default)]
    load: Option<StageOverride>,
    #[serde(default)]
    export: Option<StageOverride>,
    #[serde(default)]
    index: Option<StageOverride>,
}

impl From<StagesFile> for StagesConfig {
    fn from(file: StagesFile) -> Self {
        let defaults = StagesConfig::default();
        Self {
            fetch: StageOverride::apply(file.fetch, defaults.fetch),
            load: StageOverride::apply(file.load, defaults.load),
            export: StageOverride::apply(file.export, defaults.export),
            index: StageOverride::apply(file.index, defaults.index),
        }
    }
}

/// A `[stages.<name>]` table as written; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StageOverride {
    program: Option<String>,
    args: Option<Vec<String>>,
    working_dir: Option<PathBuf>,
    input: Option<ArtifactSpec>,
    output: Option<ArtifactSpec>,
}

impl StageOverride {
    /// Lay the table over `base`. A new `program` without `args` drops the
    /// default script arguments; artifacts and working dir are inherited.
    fn apply(table: Option<Self>, base: StageConfig) -> StageConfig {
        let Some(table) = table else {
            return base;
        };

        let args = match (&table.program, table.args) {
            (_, Some(args)) => args,
            (Some(_), None) => Vec::new(),
            (None, None) => base.args,
        };

        StageConfig {
            program: table.program.unwrap_or(base.program),
            args,
            working_dir: table.working_dir.or(base.working_dir),
            input: table.input.or(base.input),
            output: table.output.or(base.output),
        }
    }
}

impl StagesConfig {
    /// The configuration for one stage.
    pub fn get(&self, name: StageName) -> &StageConfig {
        match name {
            StageName::Fetch => &self.fetch,
            StageName::Load => &self.load,
            StageName::Export => &self.export,
            StageName::Index => &self.index,
        }
    }
}

/// Resolved configuration for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Executable to run (looked up on `PATH` if not a path).
    pub program: String,

    /// Fixed leading arguments (e.g. the script path).
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the stage process. Defaults to the caller's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Artifact consumed from an earlier stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ArtifactSpec>,

    /// Artifact produced for a later stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ArtifactSpec>,
}

impl StageConfig {
    fn python(script: &str, input: Option<ArtifactSpec>, output: Option<ArtifactSpec>) -> Self {
        Self {
            program: "python3".into(),
            args: vec![script.into()],
            working_dir: None,
            input,
            output,
        }
    }
}

fn default_fetch_stage() -> StageConfig {
    StageConfig::python(
        "scripts/reddit_tool.py",
        None,
        Some(ArtifactSpec::flagged(DEFAULT_FETCH_OUTPUT, "--filename")),
    )
}
fn default_load_stage() -> StageConfig {
    StageConfig::python(
        "scripts/post_db.py",
        Some(ArtifactSpec::implicit(DEFAULT_FETCH_OUTPUT)),
        Some(ArtifactSpec::implicit(DEFAULT_STORE)),
    )
}
fn default_export_stage() -> StageConfig {
    StageConfig::python(
        "scripts/db2txt.py",
        Some(ArtifactSpec::implicit(DEFAULT_STORE)),
        Some(ArtifactSpec::implicit(DEFAULT_EXPORT_DIR)),
    )
}
fn default_index_stage() -> StageConfig {
    StageConfig::python(
        "scripts/indexer.py",
        Some(ArtifactSpec::implicit(DEFAULT_EXPORT_DIR)),
        Some(ArtifactSpec::implicit(DEFAULT_INDEX_OUTPUT)),
    )
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.scrapechain/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScrapechainError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.scrapechain/scrapechain.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the pipeline config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<PipelineConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(PipelineConfig::default());
    }

    load_config_from(&path)
}

/// Load the pipeline config from a specific file path. The file must exist.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScrapechainError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ScrapechainError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    init_config_in(&dir)
}

/// Write a default config file into `dir`, creating it if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| ScrapechainError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = PipelineConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScrapechainError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScrapechainError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
