//! Sequential fail-fast runner: term → fetch → load → export → index.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use scrapechain_shared::{
    Result, RunId, RunState, ScrapechainError, SearchTerm, StageName, StageOutcome,
};

use crate::executor::StageExecutor;
use crate::plan::{PipelinePlan, StageInvocation};

/// One stage that was actually invoked during a run.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub invocation: StageInvocation,
    pub outcome: StageOutcome,
    pub elapsed: Duration,
}

/// Result of a pipeline run that reached a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub term: SearchTerm,
    pub started_at: DateTime<Utc>,
    /// `Completed` or `Aborted(stage)`.
    pub state: RunState,
    /// Invoked stages in order. Stages after an abort never appear.
    pub stages: Vec<StageRecord>,
    /// Every state the run passed through, starting at `NotStarted`.
    pub history: Vec<RunState>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Process exit code for this run: 0 on success, the failing stage's own
    /// code when it fits in 1..=255, otherwise 1.
    pub fn exit_code(&self) -> u8 {
        if self.succeeded() {
            return 0;
        }
        match self.stages.last().map(|record| record.outcome) {
            Some(StageOutcome::Failed { code: Some(code) }) => {
                u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }

    /// The stages this run actually invoked, in order.
    pub fn invoked_stages(&self) -> Vec<StageName> {
        self.stages
            .iter()
            .map(|record| record.invocation.stage)
            .collect()
    }
}

/// Forward-only run state holder.
#[derive(Debug)]
struct StateTracker {
    current: RunState,
    history: Vec<RunState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: RunState::NotStarted,
            history: vec![RunState::NotStarted],
        }
    }

    fn advance(&mut self, next: RunState) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(ScrapechainError::State {
                from: self.current.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.current, to = %next, "pipeline state transition");
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}

/// A validated plan bound to an executor.
pub struct Pipeline<E> {
    plan: PipelinePlan,
    executor: E,
}

impl<E: StageExecutor> Pipeline<E> {
    pub fn new(plan: PipelinePlan, executor: E) -> Self {
        Self { plan, executor }
    }

    pub fn plan(&self) -> &PipelinePlan {
        &self.plan
    }

    /// The invocations a run with `term` would make. No side effects.
    pub fn invocations(&self, term: &SearchTerm) -> Vec<StageInvocation> {
        self.plan.invocations(term)
    }

    /// Run every stage in order, stopping at the first one that does not
    /// succeed. Earlier stages' artifacts are left in place on abort.
    ///
    /// The term has already been captured by the caller, so the run passes
    /// through `AwaitingInput` without blocking.
    #[instrument(skip_all, fields(term = %term))]
    pub async fn run(&self, term: SearchTerm) -> Result<RunReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = StateTracker::new();
        let mut records: Vec<StageRecord> = Vec::new();

        info!(%run_id, "starting pipeline run");
        state.advance(RunState::AwaitingInput)?;

        for spec in self.plan.stages() {
            state.advance(RunState::Running(spec.name))?;

            let invocation = self.plan.invocation(spec, &term);
            debug!(stage = %spec.name, command = %invocation, "running stage");

            let stage_start = Instant::now();
            let outcome = self.executor.execute(&invocation).await?;
            let elapsed = stage_start.elapsed();

            records.push(StageRecord {
                invocation,
                outcome,
                elapsed,
            });

            match outcome {
                StageOutcome::Succeeded => {
                    debug!(stage = %spec.name, elapsed_ms = elapsed.as_millis(), "stage finished");
                }
                StageOutcome::Failed { code } => {
                    debug!(stage = %spec.name, ?code, "stage failed, aborting pipeline");
                    state.advance(RunState::Aborted(spec.name))?;
                    return Ok(Self::report(run_id, term, started_at, start, state, records));
                }
            }
        }

        state.advance(RunState::Completed)?;
        let report = Self::report(run_id, term, started_at, start, state, records);

        info!(
            run_id = %report.run_id,
            elapsed_ms = report.elapsed.as_millis(),
            "pipeline complete"
        );

        Ok(report)
    }

    fn report(
        run_id: RunId,
        term: SearchTerm,
        started_at: DateTime<Utc>,
        start: Instant,
        state: StateTracker,
        stages: Vec<StageRecord>,
    ) -> RunReport {
        RunReport {
            run_id,
            term,
            started_at,
            state: state.current,
            stages,
            history: state.history,
            elapsed: start.elapsed(),
        }
    }
}
