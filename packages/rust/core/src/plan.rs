//! Pipeline plan: the validated, ordered list of stages for a run, and the
//! concrete invocations built from it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use scrapechain_shared::{
    ArtifactSpec, PipelineConfig, Result, ScrapechainError, SearchTerm, StageConfig, StageName,
};

/// One stage as resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSpec {
    pub name: StageName,
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<ArtifactSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ArtifactSpec>,
}

impl StageSpec {
    fn from_config(name: StageName, config: &StageConfig) -> Self {
        Self {
            name,
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            input: config.input.clone(),
            output: config.output.clone(),
        }
    }
}

/// A concrete process invocation for one stage of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInvocation {
    pub stage: StageName,
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl std::fmt::Display for StageInvocation {
    /// Renders the invocation as a shell-like command line. Empty and
    /// whitespace-containing arguments are single-quoted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", quote_arg(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote_arg(arg))?;
        }
        Ok(())
    }
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// The fixed four-stage plan, validated for artifact bindings.
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    stages: Vec<StageSpec>,
    limit: u32,
    limit_flag: String,
}

impl PipelinePlan {
    /// Build and validate the plan from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let stages = StageName::ALL
            .iter()
            .map(|name| StageSpec::from_config(*name, config.stages.get(*name)))
            .collect();

        let plan = Self {
            stages,
            limit: config.fetch.limit,
            limit_flag: config.fetch.limit_flag.clone(),
        };
        plan.validate()?;
        debug!(stages = plan.stages.len(), limit = plan.limit, "pipeline plan validated");
        Ok(plan)
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Result-count limit handed to `fetch`.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Build the invocation for one stage. Only `fetch` receives the term.
    pub fn invocation(&self, spec: &StageSpec, term: &SearchTerm) -> StageInvocation {
        let mut args = spec.args.clone();

        if spec.name == StageName::Fetch {
            args.push(term.as_str().to_string());
            args.push(self.limit_flag.clone());
            args.push(self.limit.to_string());
        }

        for artifact in [&spec.input, &spec.output].into_iter().flatten() {
            if let Some(pair) = artifact.cli_args() {
                args.extend(pair);
            }
        }

        StageInvocation {
            stage: spec.name,
            program: spec.program.clone(),
            args,
            working_dir: spec.working_dir.clone(),
        }
    }

    /// All invocations a run with `term` would make, in order.
    pub fn invocations(&self, term: &SearchTerm) -> Vec<StageInvocation> {
        self.stages
            .iter()
            .map(|spec| self.invocation(spec, term))
            .collect()
    }

    /// Check the plan's structural and artifact-binding rules.
    fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(ScrapechainError::validation("fetch limit must be at least 1"));
        }
        if self.limit_flag.trim().is_empty() {
            return Err(ScrapechainError::validation("fetch limit_flag must not be empty"));
        }

        let mut produced: Vec<&Path> = Vec::new();

        for spec in &self.stages {
            if spec.program.trim().is_empty() {
                return Err(ScrapechainError::validation(format!(
                    "stage `{}` has an empty program",
                    spec.name
                )));
            }

            if spec.name == StageName::Fetch {
                if spec.input.is_some() {
                    return Err(ScrapechainError::validation(
                        "stage `fetch` is the first stage and cannot declare an input",
                    ));
                }
                match &spec.output {
                    Some(ArtifactSpec { flag: Some(_), .. }) => {}
                    Some(_) => {
                        return Err(ScrapechainError::validation(
                            "stage `fetch` output must declare a flag to receive its filename",
                        ));
                    }
                    None => {
                        return Err(ScrapechainError::validation(
                            "stage `fetch` must declare an output artifact",
                        ));
                    }
                }
            }

            if let Some(input) = &spec.input {
                if !produced.contains(&input.path.as_path()) {
                    return Err(ScrapechainError::validation(format!(
                        "stage `{}` reads `{}`, which no earlier stage produces",
                        spec.name,
                        input.path.display()
                    )));
                }
            }

            if let Some(output) = &spec.output {
                produced.push(output.path.as_path());
            }
        }

        Ok(())
    }
}
