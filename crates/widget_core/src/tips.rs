use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use render_bridge::TipsView;
use shared::options::TipsOptions;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::messages::{IdleSource, MessagePool};

pub const BASELINE_PRIORITY: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipsConfig {
    pub transition: Duration,
    pub notify_priority: i32,
    pub idle_interval: Duration,
    pub idle_duration: Duration,
    pub idle_priority: i32,
}

impl From<&TipsOptions> for TipsConfig {
    fn from(options: &TipsOptions) -> Self {
        Self {
            transition: options.transition(),
            notify_priority: options.notify_priority,
            idle_interval: options.idle.interval(),
            idle_duration: options.idle.duration(),
            idle_priority: options.idle.priority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    Stopped,
    Running,
    Exhausted,
}

struct TipsState {
    config: TipsConfig,
    source: IdleSource,
    content: Option<String>,
    priority: i32,
    generation: u64,
    hide_timer: Option<JoinHandle<()>>,
    hold_generation: u64,
    hold_timer: Option<JoinHandle<()>>,
    idle: IdleState,
    idle_wanted: bool,
    idle_run: u64,
    idle_task: Option<JoinHandle<()>>,
}

impl TipsState {
    fn stop_idle_task(&mut self) {
        self.idle_run += 1;
        if let Some(task) = self.idle_task.take() {
            task.abort();
        }
        if self.idle == IdleState::Running {
            self.idle = IdleState::Stopped;
        }
    }
}

/// Views are invoked with the state lock held and must not call back into
/// [`Tips`].
pub struct Tips {
    view: Arc<dyn TipsView>,
    state: Mutex<TipsState>,
}

impl Tips {
    pub fn new(view: Arc<dyn TipsView>, config: TipsConfig, source: IdleSource) -> Arc<Self> {
        Arc::new(Self {
            view,
            state: Mutex::new(TipsState {
                config,
                source,
                content: None,
                priority: BASELINE_PRIORITY,
                generation: 0,
                hide_timer: None,
                hold_generation: 0,
                hold_timer: None,
                idle: IdleState::Stopped,
                idle_wanted: false,
                idle_run: 0,
                idle_task: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TipsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn content(&self) -> Option<String> {
        self.lock().content.clone()
    }

    pub fn priority(&self) -> i32 {
        self.lock().priority
    }

    pub fn idle_state(&self) -> IdleState {
        self.lock().idle
    }

    pub fn set_style(&self, style: &BTreeMap<String, String>) {
        self.view.apply_style(style);
    }

    pub fn set_pool(&self, pool: MessagePool) {
        self.lock().source.set_pool(pool);
    }

    /// Displays `text` unless a higher-priority message is showing. Returns
    /// whether the message was accepted.
    pub fn show(self: &Arc<Self>, text: impl Into<String>, duration: Duration, priority: i32) -> bool {
        let mut state = self.lock();
        self.show_locked(&mut state, text.into(), duration, priority)
    }

    fn show_locked(
        self: &Arc<Self>,
        state: &mut TipsState,
        text: String,
        duration: Duration,
        priority: i32,
    ) -> bool {
        if priority < state.priority {
            debug!(
                priority,
                current = state.priority,
                "tips: rejected lower-priority message"
            );
            return false;
        }
        if let Some(timer) = state.hide_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.priority = priority;
        self.view.show(&text, priority);
        state.content = Some(text);

        let generation = state.generation;
        let tips = Arc::clone(self);
        state.hide_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tips.expire(generation);
        }));
        true
    }

    fn expire(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        state.hide_timer = None;
        state.content = None;
        state.priority = BASELINE_PRIORITY;
        self.view.hide();
    }

    pub fn notify(self: &Arc<Self>, text: impl Into<String>, duration: Duration) -> bool {
        let priority = self.lock().config.notify_priority;
        self.notify_with_priority(text, duration, priority)
    }

    pub fn notify_with_priority(
        self: &Arc<Self>,
        text: impl Into<String>,
        duration: Duration,
        priority: i32,
    ) -> bool {
        let resume_after = {
            let mut state = self.lock();
            state.stop_idle_task();
            if let Some(timer) = state.hold_timer.take() {
                timer.abort();
            }
            state.hold_generation += 1;
            let hold = state.hold_generation;
            let resume_after = duration + state.config.transition;
            let tips = Arc::clone(self);
            state.hold_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(resume_after).await;
                tips.release_hold(hold);
            }));
            resume_after
        };
        debug!(?resume_after, "tips: idle scheduler held for notification");
        self.show(text, duration, priority)
    }

    fn release_hold(self: &Arc<Self>, hold: u64) {
        let mut state = self.lock();
        if state.hold_generation != hold {
            return;
        }
        state.hold_timer = None;
        if state.idle_wanted {
            self.spawn_idle(&mut state);
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        if let Some(timer) = state.hide_timer.take() {
            timer.abort();
        }
        if let Some(timer) = state.hold_timer.take() {
            timer.abort();
        }
        state.hold_generation += 1;
        state.generation += 1;
        state.idle_wanted = false;
        state.stop_idle_task();
        state.content = None;
        state.priority = BASELINE_PRIORITY;
        self.view.hide();
    }

    pub fn start_idle(self: &Arc<Self>) {
        let mut state = self.lock();
        state.idle_wanted = true;
        if state.hold_timer.is_some() {
            debug!("tips: idle start deferred until notification hold ends");
            return;
        }
        self.spawn_idle(&mut state);
    }

    fn spawn_idle(self: &Arc<Self>, state: &mut TipsState) {
        if state.idle != IdleState::Stopped {
            return;
        }
        state.idle_run += 1;
        state.idle = IdleState::Running;
        let run = state.idle_run;
        let tips = Arc::clone(self);
        state.idle_task = Some(tokio::spawn(async move { tips.run_idle(run).await }));
    }

    async fn run_idle(self: Arc<Self>, run: u64) {
        loop {
            let (interval, source) = {
                let state = self.lock();
                if state.idle_run != run {
                    return;
                }
                (state.config.idle_interval, state.source.clone())
            };
            tokio::time::sleep(interval).await;

            let message = source.next_message().await;
            let duration = {
                let mut state = self.lock();
                if state.idle_run != run {
                    return;
                }
                let Some(text) = message else {
                    state.idle = IdleState::Exhausted;
                    state.idle_task = None;
                    info!("tips: idle message source is empty; scheduler stopped");
                    return;
                };
                let (duration, priority) = (state.config.idle_duration, state.config.idle_priority);
                self.show_locked(&mut state, text, duration, priority);
                duration
            };
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
#[path = "tests/tips_tests.rs"]
mod tests;
