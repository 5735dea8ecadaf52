//! Stage executors: the seam between the runner and the external programs.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use scrapechain_shared::{Result, ScrapechainError, StageOutcome};

use crate::plan::StageInvocation;

/// Runs one stage invocation to completion and reports how it ended.
///
/// A stage that runs but exits non-zero is `Ok(StageOutcome::Failed { .. })`.
/// `Err` is reserved for not being able to run the stage at all.
pub trait StageExecutor {
    fn execute(
        &self,
        invocation: &StageInvocation,
    ) -> impl Future<Output = Result<StageOutcome>> + Send;
}

/// Spawns each stage as a child process sharing the caller's terminal.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl StageExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &StageInvocation) -> Result<StageOutcome> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        debug!(stage = %invocation.stage, command = %invocation, "spawning stage process");

        let status = command
            .status()
            .await
            .map_err(|e| ScrapechainError::spawn(&invocation.program, e))?;

        Ok(StageOutcome::from(status))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use scrapechain_shared::StageName;

    fn sh(script: &str) -> StageInvocation {
        StageInvocation {
            stage: StageName::Fetch,
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            working_dir: None,
        }
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let outcome = ProcessExecutor.execute(&sh("exit 0")).await.expect("run");
        assert_eq!(outcome, StageOutcome::Succeeded);
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure_with_code() {
        let outcome = ProcessExecutor.execute(&sh("exit 7")).await.expect("run");
        assert_eq!(outcome, StageOutcome::Failed { code: Some(7) });
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let invocation = StageInvocation {
            stage: StageName::Load,
            program: "scrapechain-definitely-not-installed".into(),
            args: vec![],
            working_dir: None,
        };
        let err = ProcessExecutor.execute(&invocation).await.unwrap_err();
        assert!(matches!(err, ScrapechainError::Spawn { .. }));
    }

    #[tokio::test]
    async fn working_dir_is_applied() {
        let dir = std::env::temp_dir().join(format!("sc_wd_{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create dir");

        let mut invocation = sh("touch marker");
        invocation.working_dir = Some(dir.clone());
        let outcome = ProcessExecutor.execute(&invocation).await.expect("run");

        assert!(outcome.is_success());
        assert!(dir.join("marker").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
