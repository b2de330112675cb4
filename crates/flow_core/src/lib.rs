//! Multi-step onboarding form controller: step sequencing, async submission,
//! and ambient visual state shared with the presentation layer.

use std::{collections::HashSet, future::Future, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use shared::{
    domain::{Accent, CompletionContent, CompletionPhase, StepContent, StepId, StepStatus},
    error::FlowError,
};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

/// Opaque asynchronous operation backing a step (or the completion step).
///
/// The answer is the step's current input text; button-prompted steps receive
/// an empty string.
#[async_trait]
pub trait SubmitAction: Send + Sync {
    async fn submit(&self, answer: &str) -> Result<()>;
}

/// Lifts an async closure into a [`SubmitAction`].
pub fn submit_fn<F, Fut>(f: F) -> Arc<dyn SubmitAction>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    struct FnAction<G>(G);

    #[async_trait]
    impl<G> SubmitAction for FnAction<G>
    where
        G: Fn(String) -> BoxFuture<'static, Result<()>> + Send + Sync,
    {
        async fn submit(&self, answer: &str) -> Result<()> {
            (self.0)(answer.to_owned()).await
        }
    }

    let boxed = move |answer: String| -> BoxFuture<'static, Result<()>> { Box::pin(f(answer)) };
    Arc::new(FnAction(boxed))
}

/// One entry of the step registry: renderable content plus its submit action.
///
/// Immutable after construction; the controller only ever reads it.
#[derive(Clone)]
pub struct StepDefinition {
    content: StepContent,
    action: Arc<dyn SubmitAction>,
}

impl StepDefinition {
    pub fn new(content: StepContent, action: Arc<dyn SubmitAction>) -> Self {
        Self { content, action }
    }

    pub fn content(&self) -> &StepContent {
        &self.content
    }
}

/// Terminal step shown after every indexed step has succeeded.
pub struct CompletionStep {
    content: CompletionContent,
    action: Arc<dyn SubmitAction>,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
}

impl CompletionStep {
    pub fn new(content: CompletionContent, action: Arc<dyn SubmitAction>) -> Self {
        Self {
            content,
            action,
            on_complete: None,
        }
    }

    /// One-shot callback fired after the transition to the completed visual.
    pub fn with_on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

/// Per-step mutable state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepState {
    pub status: StepStatus,
    pub answer: String,
}

impl StepState {
    fn idle() -> Self {
        Self {
            status: StepStatus::Idle,
            answer: String::new(),
        }
    }
}

/// Notifications for presentation layers that render asynchronously to the
/// controller (status badges, step expansion, completion visuals).
#[derive(Debug, Clone)]
pub enum FlowEvent {
    StepStatusChanged {
        index: usize,
        id: StepId,
        status: StepStatus,
    },
    /// The current index moved; equals the step count once the form finished.
    Advanced {
        index: usize,
    },
    FormCompleted,
    CompletionPhaseChanged(CompletionPhase),
    Error(String),
}

struct FormState {
    runtime: Vec<StepState>,
    current: usize,
    completion_phase: CompletionPhase,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
}

/// Sequencer for a linear onboarding form.
///
/// Owns per-step runtime state and the two ambient visual fields (active
/// accent, keyboard visibility). The controller is the sole writer of the
/// accent on step transitions; the presentation layer writes the keyboard
/// flag on focus changes, and the controller force-clears it on every submit.
pub struct FormController {
    steps: Box<[StepDefinition]>,
    completion_content: CompletionContent,
    completion_action: Arc<dyn SubmitAction>,
    inner: Mutex<FormState>,
    accent: watch::Sender<Accent>,
    keyboard: watch::Sender<bool>,
    events: broadcast::Sender<FlowEvent>,
}

impl FormController {
    /// Builds a controller whose initial accent is the first step's accent
    /// (or the neutral value for an empty registry).
    pub fn new(steps: Vec<StepDefinition>, completion: CompletionStep) -> Arc<Self> {
        let start = steps
            .first()
            .map(|step| step.content.accent)
            .unwrap_or_else(Accent::clear);
        Self::with_start_accent(steps, completion, start)
    }

    /// Same as [`FormController::new`] with a custom start accent, for flows
    /// entered from a splash screen that themes the handoff itself.
    pub fn with_start_accent(
        steps: Vec<StepDefinition>,
        completion: CompletionStep,
        start_accent: Accent,
    ) -> Arc<Self> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.content.id) {
                warn!(step_id = ?step.content.id, "duplicate step id in registry");
            }
        }

        let runtime = steps.iter().map(|_| StepState::idle()).collect();
        let (accent, _) = watch::channel(start_accent);
        let (keyboard, _) = watch::channel(false);
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            steps: steps.into_boxed_slice(),
            completion_content: completion.content,
            completion_action: completion.action,
            inner: Mutex::new(FormState {
                runtime,
                current: 0,
                completion_phase: CompletionPhase::Pending,
                on_complete: completion.on_complete,
            }),
            accent,
            keyboard,
            events,
        })
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_content(&self, index: usize) -> Option<&StepContent> {
        self.steps.get(index).map(|step| &step.content)
    }

    pub fn step_contents(&self) -> impl Iterator<Item = &StepContent> {
        self.steps.iter().map(|step| &step.content)
    }

    pub fn completion_content(&self) -> &CompletionContent {
        &self.completion_content
    }

    pub async fn current_index(&self) -> usize {
        self.inner.lock().await.current
    }

    pub async fn is_finished(&self) -> bool {
        let state = self.inner.lock().await;
        state.current >= self.steps.len()
    }

    pub async fn step_state(&self, index: usize) -> Option<StepState> {
        self.inner.lock().await.runtime.get(index).cloned()
    }

    pub async fn step_states(&self) -> Vec<StepState> {
        self.inner.lock().await.runtime.clone()
    }

    pub async fn completion_phase(&self) -> CompletionPhase {
        self.inner.lock().await.completion_phase
    }

    /// Writes the current step's answer slot; called on every keystroke.
    ///
    /// The slot is read, not cleared, at submission time. No-op once the
    /// form has finished.
    pub async fn set_answer(&self, answer: impl Into<String>) {
        let answer = answer.into();
        let mut state = self.inner.lock().await;
        let index = state.current;
        if let Some(runtime) = state.runtime.get_mut(index) {
            runtime.answer = answer;
        }
    }

    pub fn accent(&self) -> Accent {
        *self.accent.borrow()
    }

    /// Override for the ambient accent, e.g. a custom start gradient.
    pub fn set_accent(&self, accent: Accent) {
        self.accent.send_replace(accent);
    }

    pub fn subscribe_accent(&self) -> watch::Receiver<Accent> {
        self.accent.subscribe()
    }

    pub fn keyboard_visible(&self) -> bool {
        *self.keyboard.borrow()
    }

    /// Presentation-layer write-back for focus changes.
    pub fn set_keyboard_visible(&self, visible: bool) {
        self.keyboard.send_replace(visible);
    }

    pub fn subscribe_keyboard(&self) -> watch::Receiver<bool> {
        self.keyboard.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    /// Submits the current step through its stored action.
    ///
    /// Ignored when the form has already finished (stale taps from a lagging
    /// UI) and while the current step is still loading. Text prompts reject
    /// an empty answer before any state is touched. On success the step is
    /// marked, the index advances and the accent moves to the next step (or
    /// clears after the final step) in one batch; on failure the step is
    /// marked `Error`, stays current and remains resubmittable.
    pub async fn submit_current_step(&self) -> std::result::Result<(), FlowError> {
        let (index, step_id, action, answer) = {
            let mut state = self.inner.lock().await;
            let index = state.current;
            let Some(step) = self.steps.get(index) else {
                debug!(index, "submit ignored: form already finished");
                return Ok(());
            };
            if !state.runtime[index].status.accepts_submission() {
                debug!(index, "submit ignored: step not accepting submissions");
                return Ok(());
            }
            if step.content.prompt.is_text() && state.runtime[index].answer.is_empty() {
                return Err(FlowError::EmptyAnswer);
            }
            state.runtime[index].status = StepStatus::Loading;
            (
                index,
                step.content.id,
                Arc::clone(&step.action),
                state.runtime[index].answer.clone(),
            )
        };

        // Submission always dismisses any active input focus, whether or not
        // the current step is a text prompt.
        self.keyboard.send_replace(false);
        let _ = self.events.send(FlowEvent::StepStatusChanged {
            index,
            id: step_id,
            status: StepStatus::Loading,
        });
        debug!(index, "submitting step");

        let outcome = action.submit(&answer).await;

        let mut state = self.inner.lock().await;
        match outcome {
            Ok(()) => {
                state.runtime[index].status = StepStatus::Success;
                state.current = index + 1;
                let finished = state.current >= self.steps.len();
                if finished {
                    self.accent.send_replace(Accent::clear());
                } else {
                    self.accent
                        .send_replace(self.steps[state.current].content.accent);
                }
                let next = state.current;
                drop(state);

                info!(index, finished, "step succeeded");
                let _ = self.events.send(FlowEvent::StepStatusChanged {
                    index,
                    id: step_id,
                    status: StepStatus::Success,
                });
                let _ = self.events.send(FlowEvent::Advanced { index: next });
                if finished {
                    let _ = self.events.send(FlowEvent::FormCompleted);
                }
            }
            Err(err) => {
                state.runtime[index].status = StepStatus::Error;
                drop(state);

                warn!(index, error = %err, "step submission failed");
                let _ = self.events.send(FlowEvent::StepStatusChanged {
                    index,
                    id: step_id,
                    status: StepStatus::Error,
                });
                let _ = self.events.send(FlowEvent::Error(err.to_string()));
            }
        }
        Ok(())
    }

    /// Runs the completion step's finalize action.
    ///
    /// Ignored until every indexed step has succeeded, while finalization is
    /// already running and once it is done. A failed attempt parks the phase
    /// at `Failed` and may be retried by calling this again. The one-shot
    /// completion callback fires exactly once, after the transition to the
    /// completed visual.
    pub async fn finalize(&self) {
        {
            let mut state = self.inner.lock().await;
            if state.current < self.steps.len() {
                debug!("finalize ignored: steps still in progress");
                return;
            }
            if !state.completion_phase.accepts_finalize() {
                debug!(phase = ?state.completion_phase, "finalize ignored");
                return;
            }
            state.completion_phase = CompletionPhase::Finalizing;
        }
        let _ = self
            .events
            .send(FlowEvent::CompletionPhaseChanged(CompletionPhase::Finalizing));
        debug!("finalizing flow");

        let outcome = self.completion_action.submit("").await;

        let mut state = self.inner.lock().await;
        match outcome {
            Ok(()) => {
                state.completion_phase = CompletionPhase::Done;
                let callback = state.on_complete.take();
                drop(state);

                info!("flow finalized");
                let _ = self
                    .events
                    .send(FlowEvent::CompletionPhaseChanged(CompletionPhase::Done));
                if let Some(callback) = callback {
                    callback();
                }
            }
            Err(err) => {
                state.completion_phase = CompletionPhase::Failed;
                drop(state);

                warn!(error = %err, "finalize failed");
                let _ = self
                    .events
                    .send(FlowEvent::CompletionPhaseChanged(CompletionPhase::Failed));
                let _ = self.events.send(FlowEvent::Error(err.to_string()));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
