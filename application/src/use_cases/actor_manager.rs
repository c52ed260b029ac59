//! Actor manager
//!
//! Creates the council's actors, runs their cycles one at a time or in
//! bounded concurrent batches, and routes queued messages between stages.

use crate::config::WorkflowParams;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::actor::{Actor, ActorError, CycleOutcome};
use crate::use_cases::shared_store::SharedStore;
use council_domain::{AgentId, AgentRole, RoleProfile};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

/// Delivery passes per routing call; a request and its response need two.
const ROUTE_MAX_PASSES: usize = 4;

/// In-flight limit of [`ActorManager::run_batch`] unless configured
pub const DEFAULT_BATCH_LIMIT: usize = 3;

/// Errors from manager operations
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Actor not found: {0}")]
    NotFound(AgentId),

    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    #[error("Cycle task failed: {0}")]
    Join(String),
}

impl ManagerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagerError::NotFound(_))
    }
}

/// Result of one actor's cycle within a batch
#[derive(Debug)]
pub struct CycleReport {
    pub agent_id: AgentId,
    pub outcome: Result<CycleOutcome, ManagerError>,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.outcome.as_ref().is_ok_and(|o| o.is_success())
    }
}

pub type SharedActor = Arc<Mutex<Actor>>;

/// Owner of the council's actors
pub struct ActorManager {
    actors: HashMap<AgentId, SharedActor>,
    order: Vec<AgentId>,
    store: SharedStore,
    batch_limit: usize,
}

impl ActorManager {
    pub fn new(store: SharedStore) -> Self {
        Self {
            actors: HashMap::new(),
            order: Vec::new(),
            store,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    /// Create one actor per role: the six departments, the office and the
    /// decider. The decider runs on `params.decider_model`.
    pub async fn with_council(
        store: SharedStore,
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolExecutorPort>,
        params: &WorkflowParams,
    ) -> Self {
        let mut manager = Self::new(store.clone()).with_batch_limit(params.batch_concurrency);
        let roles = AgentRole::DEPARTMENTS
            .into_iter()
            .chain([AgentRole::Office, AgentRole::Decider]);
        for role in roles {
            let model = if role == AgentRole::Decider {
                params.decider_model.clone()
            } else {
                params.default_model.clone()
            };
            let actor = Actor::new(
                RoleProfile::for_role(role),
                model,
                Arc::clone(&gateway),
                Arc::clone(&tools),
                store.clone(),
            )
            .with_max_tool_iterations(params.max_tool_iterations);
            manager.register(actor).await;
        }
        info!("Created {} actors", manager.order.len());
        manager
    }

    /// Add an actor and publish its initial state
    pub async fn register(&mut self, actor: Actor) {
        let id = actor.id().clone();
        let state = actor.state().clone();
        self.store.update(move |s| s.put_agent(state)).await;
        if self.actors.insert(id.clone(), Arc::new(Mutex::new(actor))).is_none() {
            self.order.push(id);
        }
    }

    /// Actor ids in creation order
    pub fn ids(&self) -> &[AgentId] {
        &self.order
    }

    pub fn get(&self, id: &AgentId) -> Option<SharedActor> {
        self.actors.get(id).cloned()
    }

    pub fn by_role(&self, role: AgentRole) -> Option<SharedActor> {
        self.get(&AgentId::for_role(role))
    }

    /// Department actor ids in creation order
    pub fn departments(&self) -> Vec<AgentId> {
        self.order
            .iter()
            .filter(|id| {
                AgentRole::DEPARTMENTS
                    .iter()
                    .any(|role| AgentId::for_role(*role) == **id)
            })
            .cloned()
            .collect()
    }

    /// Run exactly one cycle of one actor
    pub async fn run_cycle(&self, id: &AgentId) -> Result<CycleOutcome, ManagerError> {
        let actor = self
            .get(id)
            .ok_or_else(|| ManagerError::NotFound(id.clone()))?;
        let mut actor = actor.lock().await;
        Ok(actor.run_cycle().await?)
    }

    /// Run one cycle for each id with at most `max_concurrent` in flight.
    ///
    /// Failures are reported per actor; one failing cycle never affects the
    /// others. Reports come back in the order of `ids`.
    pub async fn run_concurrent(&self, ids: &[AgentId], max_concurrent: usize) -> Vec<CycleReport> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(ids.len());

        for id in ids {
            let Some(actor) = self.get(id) else {
                handles.push((id.clone(), None));
                continue;
            };
            let semaphore = Arc::clone(&semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ManagerError::Join(e.to_string()))?;
                let mut actor = actor.lock().await;
                actor.run_cycle().await.map_err(ManagerError::from)
            });
            handles.push((id.clone(), Some(handle)));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (agent_id, handle) in handles {
            let outcome = match handle {
                None => Err(ManagerError::NotFound(agent_id.clone())),
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ManagerError::Join(e.to_string())),
                },
            };
            if let Err(e) = &outcome {
                warn!("Cycle of {} failed: {}", agent_id, e);
            }
            reports.push(CycleReport { agent_id, outcome });
        }
        reports
    }

    /// [`run_concurrent`](Self::run_concurrent) at the configured batch limit
    pub async fn run_batch(&self, ids: &[AgentId]) -> Vec<CycleReport> {
        self.run_concurrent(ids, self.batch_limit).await
    }

    /// Deliver every unanswered message to its recipient, in queue order.
    ///
    /// Replies produced along the way are delivered in later passes.
    /// Returns the number of messages delivered.
    pub async fn route_messages(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..ROUTE_MAX_PASSES {
            let pending = self.store.read(|s| s.pending_messages()).await;
            let mut delivered_this_pass = 0;

            for message in pending {
                let Some(actor) = self.get(&message.to_agent) else {
                    debug!("No actor {} for message {}", message.to_agent, message.id);
                    continue;
                };
                let mut actor = actor.lock().await;
                match actor.process_message(message).await {
                    Ok(_) => delivered_this_pass += 1,
                    Err(e) => warn!("{} could not process a message: {}", actor.id(), e),
                }
                actor.persist().await;
            }

            delivered += delivered_this_pass;
            if delivered_this_pass == 0 {
                break;
            }
        }
        if delivered > 0 {
            info!("Routed {} message(s)", delivered);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{GatewayError, LlmSession, ModelProfile};
    use crate::use_cases::test_support::{
        MEMO, RecordingTools, ScriptedGateway, memo_json, store_with_card,
    };
    use async_trait::async_trait;
    use council_domain::{AgentMessage, MessageType, Stage};
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn council(gateway: Arc<dyn LlmGateway>, store: &SharedStore) -> ActorManager {
        ActorManager::with_council(
            store.clone(),
            gateway,
            Arc::new(RecordingTools::default()),
            &WorkflowParams::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_council_has_eight_actors() {
        let store = store_with_card();
        let manager = council(Arc::new(ScriptedGateway::new()), &store).await;

        assert_eq!(manager.ids().len(), 8);
        assert_eq!(manager.departments().len(), 6);
        assert_eq!(store.read(|s| s.agents.len()).await, 8);

        let decider = manager.by_role(AgentRole::Decider).unwrap();
        assert_eq!(decider.lock().await.model().name, "qwen-max");
        assert!(manager.by_role(AgentRole::Office).is_some());
    }

    #[tokio::test]
    async fn test_run_cycle_unknown_actor() {
        let store = store_with_card();
        let manager = council(Arc::new(ScriptedGateway::new()), &store).await;

        let err = manager.run_cycle(&AgentId::new("agent_mayor")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_memo_batch_isolates_failures() {
        let store = store_with_card();
        store.update(|s| s.enter_stage(Stage::DepartmentsGenerateMemos)).await;
        let gateway = ScriptedGateway::new().reply(MEMO, &memo_json("support"));
        let manager = council(Arc::new(gateway), &store).await;

        let mut ids = manager.departments();
        ids.insert(2, AgentId::new("agent_ghost"));
        let reports = manager.run_concurrent(&ids, 6).await;

        assert_eq!(reports.len(), 7);
        assert!(reports[2].outcome.as_ref().is_err_and(|e| e.is_not_found()));
        assert_eq!(reports.iter().filter(|r| r.is_success()).count(), 6);

        let with_position = store
            .read(|s| {
                manager
                    .departments()
                    .iter()
                    .filter(|id| s.agents.get(*id).is_some_and(|a| a.position.is_some()))
                    .count()
            })
            .await;
        assert_eq!(with_position, 6);
        assert_eq!(store.read(|s| s.memos.len()).await, 6);
    }

    /// Gateway whose sessions panic for one department
    struct PanicsFor {
        marker: &'static str,
        inner: ScriptedGateway,
    }

    #[async_trait]
    impl LlmGateway for PanicsFor {
        async fn create_session_with_system_prompt(
            &self,
            model: &ModelProfile,
            system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            if system_prompt.contains(self.marker) {
                panic!("boom");
            }
            self.inner.create_session_with_system_prompt(model, system_prompt).await
        }
    }

    #[tokio::test]
    async fn test_panicking_cycle_does_not_sink_the_batch() {
        let store = store_with_card();
        store.update(|s| s.enter_stage(Stage::DepartmentsGenerateMemos)).await;
        let gateway = PanicsFor {
            marker: "Ministry of Finance",
            inner: ScriptedGateway::new().reply(MEMO, &memo_json("support")),
        };
        let manager = council(Arc::new(gateway), &store).await;

        let ids = manager.departments();
        let reports = manager.run_concurrent(&ids, 6).await;

        assert_eq!(reports.len(), 6);
        let finance = AgentId::for_role(AgentRole::Finance);
        for report in &reports {
            if report.agent_id == finance {
                assert!(matches!(report.outcome, Err(ManagerError::Join(_))));
            } else {
                assert!(report.is_success(), "{} failed", report.agent_id);
            }
        }
        assert_eq!(store.read(|s| s.memos.len()).await, 5);

        // the other actors stay usable after the panic
        assert!(manager.run_cycle(&AgentId::for_role(AgentRole::Legal)).await.is_ok());
    }

    /// Gateway that records the peak number of requests in flight
    #[derive(Default)]
    struct SlowGateway {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    struct SlowSession {
        model: ModelProfile,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmSession for SlowSession {
        fn model(&self) -> &ModelProfile {
            &self.model
        }

        async fn send(&self, _content: &str) -> Result<String, GatewayError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("Noted.".to_string())
        }
    }

    #[async_trait]
    impl LlmGateway for SlowGateway {
        async fn create_session_with_system_prompt(
            &self,
            model: &ModelProfile,
            _system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            Ok(Box::new(SlowSession {
                model: model.clone(),
                in_flight: Arc::clone(&self.in_flight),
                peak: Arc::clone(&self.peak),
            }))
        }
    }

    #[tokio::test]
    async fn test_run_concurrent_respects_limit() {
        let store = store_with_card();
        store.update(|s| s.enter_stage(Stage::DepartmentsGenerateMemos)).await;
        let gateway = Arc::new(SlowGateway::default());
        let peak = Arc::clone(&gateway.peak);
        let manager = council(gateway, &store).await;

        let reports = manager.run_concurrent(&manager.departments(), 2).await;

        assert_eq!(reports.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_run_batch_uses_configured_limit() {
        let store = store_with_card();
        store.update(|s| s.enter_stage(Stage::DepartmentsGenerateMemos)).await;
        let gateway = Arc::new(SlowGateway::default());
        let peak = Arc::clone(&gateway.peak);
        let params = WorkflowParams::default().with_batch_concurrency(1);
        let manager = ActorManager::with_council(
            store.clone(),
            gateway,
            Arc::new(RecordingTools::default()),
            &params,
        )
        .await;

        let reports = manager.run_batch(&manager.departments()).await;

        assert_eq!(reports.len(), 6);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_route_messages_delivers_request_and_reply() {
        let store = store_with_card();
        let manager = council(Arc::new(ScriptedGateway::new()), &store).await;

        let office = manager.by_role(AgentRole::Office).unwrap();
        office
            .lock()
            .await
            .communicate(
                AgentId::for_role(AgentRole::Finance),
                MessageType::Request,
                "Send the cost estimate",
                Map::new(),
            )
            .await
            .unwrap();

        let delivered = manager.route_messages().await;
        assert_eq!(delivered, 2);

        let queue: Vec<AgentMessage> = store.read(|s| s.message_queue.clone()).await;
        assert_eq!(queue.len(), 2);
        assert!(queue.iter().all(|m| m.responded()));
        assert_eq!(queue[1].message_type, MessageType::Response);
        assert_eq!(manager.route_messages().await, 0);
    }
}
