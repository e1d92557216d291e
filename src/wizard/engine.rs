//! WizardEngine: walks the step graph, accumulates answers, and schedules
//! the delayed clear after a completed run is acknowledged.
//!
//! All transitions take the engine lock for their whole duration, so no
//! observer ever sees a half-applied transition. The only deferred work is
//! the session clear scheduled by [`WizardEngine::reset`], which runs as a
//! tokio task and is cancelled by any later accepted intent or by dropping
//! the engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{GraphError, NavigationError};

use super::graph::{Step, StepGraph, StepId, StepKind};
use super::session::SessionData;
use super::state::NavigationState;

/// Outcome of an accepted navigation intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The current step changed.
    Moved { from: StepId, to: StepId },
    /// `proceed` on a step with no successor; the completion handler ran.
    Completed { step_id: StepId },
    /// Nothing to do (e.g. `back` at the initial step).
    Unchanged,
}

/// Which branch activating an option took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionActivation {
    Navigated(Transition),
    /// The option is disabled and links to an external page.
    OpenLink(String),
    /// The option is disabled and has no link.
    Ignored,
}

/// Events published to rendering-layer subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    StepChanged {
        from: StepId,
        to: StepId,
        progress: u32,
        at: DateTime<Utc>,
    },
    /// `reset` was requested; the session clears after `delay_ms`.
    ResetScheduled { delay_ms: u64, at: DateTime<Utc> },
    /// A scheduled reset was superseded before it fired.
    ResetCancelled { at: DateTime<Utc> },
    /// The session was cleared and the wizard is back at the initial step.
    ResetApplied { at: DateTime<Utc> },
    Completed { step_id: StepId, at: DateTime<Utc> },
    DataUpdated { keys: Vec<String>, at: DateTime<Utc> },
}

/// Immutable copy of the engine state.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub session_id: Uuid,
    pub current_step_id: StepId,
    pub history: Vec<StepId>,
    pub data: SessionData,
    pub progress: u32,
    pub completion_acknowledged: bool,
    pub can_go_back: bool,
}

type CompletionHandler = Arc<dyn Fn(&str) + Send + Sync>;

struct EngineInner {
    nav: NavigationState,
    data: SessionData,
    completion_acknowledged: bool,
    /// Bumped whenever a pending clear is scheduled or cancelled.
    reset_epoch: u64,
    pending_reset: Option<JoinHandle<()>>,
}

impl EngineInner {
    /// Cancel a scheduled clear. Returns true if one was pending.
    fn cancel_pending_reset(&mut self) -> bool {
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
        self.completion_acknowledged = false;
        match self.pending_reset.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn apply_reset(&mut self, initial_step_id: &str) {
        self.nav.restart(initial_step_id);
        self.data.clear();
        self.completion_acknowledged = false;
        self.pending_reset = None;
    }
}

/// Finite-state machine driving a wizard run over a validated [`StepGraph`].
pub struct WizardEngine {
    session_id: Uuid,
    graph: Arc<StepGraph>,
    config: EngineConfig,
    inner: Arc<Mutex<EngineInner>>,
    events: broadcast::Sender<WizardEvent>,
    on_complete: Option<CompletionHandler>,
}

fn lock(inner: &Mutex<EngineInner>) -> MutexGuard<'_, EngineInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WizardEngine {
    /// Create an engine positioned at the graph's initial step.
    ///
    /// The graph is validated first; a dangling reference or missing initial
    /// step is returned as an error rather than silently substituted.
    pub fn new(graph: StepGraph, config: EngineConfig) -> Result<Self, GraphError> {
        graph.validate()?;
        let (events, _rx) = broadcast::channel(config.event_capacity.max(1));
        let session_id = Uuid::new_v4();
        tracing::info!(
            session_id = %session_id,
            initial_step = %graph.initial_step_id,
            steps = graph.steps.len(),
            "Wizard session started"
        );
        Ok(Self {
            session_id,
            inner: Arc::new(Mutex::new(EngineInner {
                nav: NavigationState::new(graph.initial_step_id.clone()),
                data: SessionData::new(),
                completion_acknowledged: false,
                reset_epoch: 0,
                pending_reset: None,
            })),
            graph: Arc::new(graph),
            config,
            events,
            on_complete: None,
        })
    }

    /// Register the callback invoked with the final step id on completion.
    pub fn with_completion_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(handler));
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    /// Subscribe to wizard events.
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    pub fn current_step_id(&self) -> StepId {
        lock(&self.inner).nav.current().to_string()
    }

    /// The step the rendering layer should display.
    pub fn current_step(&self) -> Result<&Step, NavigationError> {
        let id = self.current_step_id();
        self.graph.step(&id).ok_or(NavigationError::UnknownStep(id))
    }

    /// Snapshot of the accumulated answers.
    pub fn data(&self) -> SessionData {
        lock(&self.inner).data.clone()
    }

    pub fn progress(&self) -> u32 {
        lock(&self.inner).nav.progress(self.config.progress_step_weight)
    }

    pub fn completion_acknowledged(&self) -> bool {
        lock(&self.inner).completion_acknowledged
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let inner = lock(&self.inner);
        WizardSnapshot {
            session_id: self.session_id,
            current_step_id: inner.nav.current().to_string(),
            history: inner.nav.history().to_vec(),
            data: inner.data.clone(),
            progress: inner.nav.progress(self.config.progress_step_weight),
            completion_acknowledged: inner.completion_acknowledged,
            can_go_back: inner.nav.can_go_back(),
        }
    }

    /// Answer the current question and move to `next_step_id`.
    ///
    /// If the question declares a value binding and a value is supplied, the
    /// (coerced) value is written to the bound session field.
    pub fn select_option(
        &self,
        next_step_id: &str,
        value: Option<&str>,
    ) -> Result<Transition, NavigationError> {
        let mut inner = lock(&self.inner);
        self.select_locked(&mut inner, next_step_id, value)
    }

    /// Activate an option of the current question by id.
    ///
    /// Enabled options navigate; disabled options open their link if they
    /// have one and are otherwise ignored.
    pub fn activate_option(&self, option_id: &str) -> Result<OptionActivation, NavigationError> {
        let mut inner = lock(&self.inner);
        let current = self.step_of(&inner)?;
        let option = current
            .option(option_id)
            .ok_or_else(|| NavigationError::UnknownOption {
                step: current.id.clone(),
                option: option_id.to_string(),
            })?;

        if option.disabled {
            return Ok(match &option.url {
                Some(url) => OptionActivation::OpenLink(url.clone()),
                None => OptionActivation::Ignored,
            });
        }
        self.select_locked(&mut inner, &option.next_step_id, Some(&option.value))
            .map(OptionActivation::Navigated)
    }

    /// Move past an instruction or custom step.
    ///
    /// A step without a successor completes the wizard: the completion
    /// handler is invoked with the current step id and state is unchanged.
    pub fn proceed(&self) -> Result<Transition, NavigationError> {
        let mut inner = lock(&self.inner);
        let current = self.step_of(&inner)?;

        let next = match &current.kind {
            StepKind::Instruction { next_step_id, .. } | StepKind::Custom { next_step_id, .. } => {
                next_step_id.clone()
            }
            StepKind::Result { .. } => None,
            StepKind::Question { .. } => {
                return Err(NavigationError::InvalidIntent {
                    intent: "continue",
                    kind: current.kind.name(),
                    step: current.id.clone(),
                });
            }
        };

        match next {
            Some(next) => {
                if !self.graph.contains(&next) {
                    return Err(NavigationError::UnknownStep(next));
                }
                self.cancel_reset_locked(&mut inner);
                Ok(self.advance_locked(&mut inner, &next))
            }
            None => {
                self.cancel_reset_locked(&mut inner);
                let step_id = current.id.clone();
                drop(inner);

                tracing::info!(session_id = %self.session_id, step = %step_id, "Wizard completed");
                if let Some(handler) = &self.on_complete {
                    handler(&step_id);
                }
                let _ = self.events.send(WizardEvent::Completed {
                    step_id: step_id.clone(),
                    at: Utc::now(),
                });
                Ok(Transition::Completed { step_id })
            }
        }
    }

    /// Return to the previously visited step. No-op at the initial step.
    pub fn back(&self) -> Transition {
        let mut inner = lock(&self.inner);
        self.cancel_reset_locked(&mut inner);

        let from = inner.nav.current().to_string();
        let Some(to) = inner.nav.retreat().map(str::to_string) else {
            return Transition::Unchanged;
        };
        let progress = inner.nav.progress(self.config.progress_step_weight);
        tracing::debug!(session_id = %self.session_id, from = %from, to = %to, "Stepped back");
        let _ = self.events.send(WizardEvent::StepChanged {
            from: from.clone(),
            to: to.clone(),
            progress,
            at: Utc::now(),
        });
        Transition::Moved { from, to }
    }

    /// Merge answers collected by a custom step into the session.
    pub fn update_data(&self, patch: &SessionData) {
        let mut inner = lock(&self.inner);
        self.cancel_reset_locked(&mut inner);
        inner.data.merge(patch);

        let keys: Vec<String> = patch.iter().map(|(k, _)| k.to_string()).collect();
        tracing::debug!(session_id = %self.session_id, keys = ?keys, "Session data updated");
        let _ = self.events.send(WizardEvent::DataUpdated {
            keys,
            at: Utc::now(),
        });
    }

    /// Acknowledge completion and schedule the session clear.
    ///
    /// `completion_acknowledged` is raised immediately; after the configured
    /// delay history and data are cleared and the wizard returns to its
    /// initial step. A second `reset` restarts the delay. Outside a tokio
    /// runtime the clear is applied immediately.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        self.cancel_reset_locked(&mut inner);
        inner.completion_acknowledged = true;

        let delay = self.config.reset_delay;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                session_id = %self.session_id,
                "No async runtime available; clearing session without delay"
            );
            inner.apply_reset(&self.graph.initial_step_id);
            drop(inner);
            let _ = self.events.send(WizardEvent::ResetApplied { at: Utc::now() });
            return;
        };

        let epoch = inner.reset_epoch;
        let task = ScheduledClear {
            inner: Arc::downgrade(&self.inner),
            epoch,
            delay,
            initial_step_id: self.graph.initial_step_id.clone(),
            events: self.events.clone(),
            session_id: self.session_id,
        };
        inner.pending_reset = Some(runtime.spawn(task.run()));

        tracing::info!(
            session_id = %self.session_id,
            delay_ms = delay.as_millis() as u64,
            "Reset scheduled"
        );
        let _ = self.events.send(WizardEvent::ResetScheduled {
            delay_ms: delay.as_millis() as u64,
            at: Utc::now(),
        });
    }

    /// Whether a scheduled clear is waiting to fire.
    pub fn reset_pending(&self) -> bool {
        lock(&self.inner)
            .pending_reset
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn step_of(&self, inner: &EngineInner) -> Result<&Step, NavigationError> {
        let id = inner.nav.current();
        self.graph
            .step(id)
            .ok_or_else(|| NavigationError::UnknownStep(id.to_string()))
    }

    fn select_locked(
        &self,
        inner: &mut EngineInner,
        next_step_id: &str,
        value: Option<&str>,
    ) -> Result<Transition, NavigationError> {
        let current = self.step_of(inner)?;
        let StepKind::Question { writes_to, .. } = &current.kind else {
            return Err(NavigationError::InvalidIntent {
                intent: "select an option",
                kind: current.kind.name(),
                step: current.id.clone(),
            });
        };
        if !self.graph.contains(next_step_id) {
            return Err(NavigationError::UnknownStep(next_step_id.to_string()));
        }

        self.cancel_reset_locked(inner);
        if let (Some(binding), Some(value)) = (writes_to, value)
            && !value.is_empty()
        {
            let stored = binding.coerce(value);
            tracing::debug!(
                session_id = %self.session_id,
                step = %current.id,
                field = %binding.field,
                value = %stored,
                "Answer recorded"
            );
            inner.data.set(binding.field.clone(), stored);
        }
        Ok(self.advance_locked(inner, next_step_id))
    }

    fn cancel_reset_locked(&self, inner: &mut EngineInner) {
        if inner.cancel_pending_reset() {
            tracing::debug!(session_id = %self.session_id, "Pending reset cancelled");
            let _ = self.events.send(WizardEvent::ResetCancelled { at: Utc::now() });
        }
    }

    fn advance_locked(&self, inner: &mut EngineInner, next: &str) -> Transition {
        let from = inner.nav.current().to_string();
        inner.nav.advance(next);
        let progress = inner.nav.progress(self.config.progress_step_weight);
        tracing::info!(
            session_id = %self.session_id,
            from = %from,
            to = %next,
            progress,
            "Step advanced"
        );
        let _ = self.events.send(WizardEvent::StepChanged {
            from: from.clone(),
            to: next.to_string(),
            progress,
            at: Utc::now(),
        });
        Transition::Moved {
            from,
            to: next.to_string(),
        }
    }
}

impl Drop for WizardEngine {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        if let Some(handle) = inner.pending_reset.take() {
            handle.abort();
        }
    }
}

/// The deferred half of `reset`.
struct ScheduledClear {
    inner: Weak<Mutex<EngineInner>>,
    epoch: u64,
    delay: Duration,
    initial_step_id: StepId,
    events: broadcast::Sender<WizardEvent>,
    session_id: Uuid,
}

impl ScheduledClear {
    async fn run(self) {
        tokio::time::sleep(self.delay).await;

        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        {
            let mut inner = lock(&inner);
            // Superseded by a later intent while we slept.
            if inner.reset_epoch != self.epoch {
                return;
            }
            inner.apply_reset(&self.initial_step_id);
        }
        tracing::info!(session_id = %self.session_id, "Session cleared");
        let _ = self.events.send(WizardEvent::ResetApplied { at: Utc::now() });
    }
}
