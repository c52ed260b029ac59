//! Run Workflow use case
//!
//! Drives one council run through its stages:
//!
//! ```text
//! intake -> departments_generate_memos -> secretariat_aggregate_disputes
//!        -> negotiation_rounds -> legal_review_gate -> fiscal_capacity_review_gate
//!        -> decider_finalize -> implementation_plan -> completed
//! ```
//!
//! Any [`WorkflowError`] raised by a stage moves the run to `failed` with a
//! readable `error_message`; whatever was gathered until then stays in the
//! returned and persisted snapshot.

mod disputes;
mod gates;
mod stages;

use crate::config::{ConfigValidationError, WorkflowParams};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, WorkflowProgress};
use crate::ports::run_store::{NoRunStore, RunStore, StoreError};
use crate::ports::tool_executor::{NoToolExecutor, ToolExecutorPort};
use crate::use_cases::actor_manager::{ActorManager, ManagerError, SharedActor};
use crate::use_cases::shared_store::SharedStore;
use council_domain::{
    AgentRole, Constraints, DomainError, Issue, SharedState, Stage, TraceEvent, TraceEventType,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that end a run
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{gate} failed: {reasons}")]
    GateFailed { gate: String, reasons: String },

    #[error("No actor with role {0}")]
    MissingActor(AgentRole),

    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),
}

/// Input for one council run
#[derive(Debug, Clone)]
pub struct RunWorkflowInput {
    pub issue: Issue,
    pub constraints: Constraints,
    /// Generated when absent
    pub run_id: Option<String>,
}

impl RunWorkflowInput {
    pub fn new(issue: Issue) -> Self {
        Self {
            issue,
            constraints: Constraints::default(),
            run_id: None,
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Per-run working set
struct RunContext {
    store: SharedStore,
    manager: ActorManager,
    rng: StdRng,
}

impl RunContext {
    fn actor(&self, role: AgentRole) -> Result<SharedActor, WorkflowError> {
        self.manager
            .by_role(role)
            .ok_or(WorkflowError::MissingActor(role))
    }
}

/// Use case for running a council deliberation end to end
pub struct RunWorkflowUseCase {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolExecutorPort>,
    run_store: Arc<dyn RunStore>,
    progress: Arc<dyn WorkflowProgress>,
    params: WorkflowParams,
}

impl RunWorkflowUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            tools: Arc::new(NoToolExecutor),
            run_store: Arc::new(NoRunStore),
            progress: Arc::new(NoProgress),
            params: WorkflowParams::default(),
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutorPort>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_run_store(mut self, run_store: Arc<dyn RunStore>) -> Self {
        self.run_store = run_store;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn WorkflowProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_params(mut self, params: WorkflowParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &WorkflowParams {
        &self.params
    }

    /// Run the council to a terminal state.
    ///
    /// Only invalid parameters are returned as an error; a run that fails
    /// comes back as a snapshot with `run_status == failed`.
    pub async fn execute(&self, input: RunWorkflowInput) -> Result<SharedState, WorkflowError> {
        self.params.validate()?;

        let run_id = input.run_id.unwrap_or_else(new_run_id);
        info!("Starting council run {} on '{}'", run_id, input.issue.title);

        let store = SharedStore::new(SharedState::new(run_id, input.issue, input.constraints));
        let manager = ActorManager::with_council(
            store.clone(),
            Arc::clone(&self.gateway),
            Arc::clone(&self.tools),
            &self.params,
        )
        .await;
        let rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut ctx = RunContext {
            store,
            manager,
            rng,
        };

        ctx.store.update(|s| s.start()).await;
        self.persist(&ctx.store).await;

        match self.run_stages(&mut ctx).await {
            Ok(()) => {
                ctx.store.update(|s| s.complete()).await;
                self.emit(
                    &ctx.store,
                    TraceEvent::new(Stage::Completed, TraceEventType::Completed, "Council run completed"),
                )
                .await;
                info!("Council run completed");
            }
            Err(e) => {
                error!("Council run failed: {}", e);
                let message = e.to_string();
                let stage = ctx.store.read(|s| s.current_stage).await;
                ctx.store.update(|s| s.fail(message.clone())).await;
                self.emit(&ctx.store, TraceEvent::new(stage, TraceEventType::Error, message))
                    .await;
            }
        }

        self.persist(&ctx.store).await;
        Ok(ctx.store.snapshot().await)
    }

    async fn run_stages(&self, ctx: &mut RunContext) -> Result<(), WorkflowError> {
        let mut stage = Stage::Intake;
        loop {
            self.enter_stage(&ctx.store, stage).await;
            match stage {
                Stage::Intake => self.intake(ctx).await?,
                Stage::DepartmentsGenerateMemos => self.department_memos(ctx).await?,
                Stage::SecretariatAggregateDisputes => self.aggregate(ctx).await?,
                Stage::NegotiationRounds => self.negotiation_rounds(ctx).await?,
                Stage::LegalReviewGate | Stage::FiscalCapacityReviewGate => {
                    self.review_gate(ctx, stage).await?
                }
                Stage::DeciderFinalize => self.finalize_decision(ctx).await?,
                Stage::ImplementationPlan => self.implementation_plan(ctx).await?,
                Stage::Init | Stage::Completed => {}
            }
            self.emit(
                &ctx.store,
                TraceEvent::new(
                    stage,
                    TraceEventType::StageChange,
                    format!("Leaving {}", stage.display_name()),
                )
                .with_data(json!({ "phase": "exit" })),
            )
            .await;
            self.progress.on_stage_complete(stage);
            self.persist(&ctx.store).await;

            match stage.next() {
                Some(next) if next != Stage::Completed => stage = next,
                _ => return Ok(()),
            }
        }
    }

    async fn enter_stage(&self, store: &SharedStore, stage: Stage) {
        info!("Stage: {}", stage.display_name());
        store.update(|s| s.enter_stage(stage)).await;
        self.emit(
            store,
            TraceEvent::new(
                stage,
                TraceEventType::StageChange,
                format!("Entering {}", stage.display_name()),
            )
            .with_data(json!({ "phase": "enter" })),
        )
        .await;
    }

    /// Record a trace event in the run, the run store and the progress port
    async fn emit(&self, store: &SharedStore, event: TraceEvent) {
        let recorded = event.clone();
        let run_id = store
            .update(move |s| {
                s.record_trace(recorded);
                s.run_id.clone()
            })
            .await;
        if let Err(e) = self.run_store.append_trace(&run_id, &event) {
            warn!("Could not append trace event: {}", e);
        }
        self.progress.on_event(&event);
    }

    /// Best-effort snapshot
    async fn persist(&self, store: &SharedStore) {
        let snapshot = store.snapshot().await;
        if let Err(e) = self.run_store.save_state(&snapshot) {
            warn!("Could not persist run {}: {}", snapshot.run_id, e);
        }
    }
}

fn new_run_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "run_{}_{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        &id[..8]
    )
}
