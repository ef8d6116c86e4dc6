use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use render_bridge::{StatusFrame, StatusView};
use shared::options::StatusOptions;
use tokio::task::JoinHandle;
use tracing::debug;

pub type StatusCallback = Arc<dyn Fn() + Send + Sync>;

struct HoverBinding {
    enter: StatusCallback,
    leave: StatusCallback,
}

struct StatusState {
    labels: StatusOptions,
    frame: StatusFrame,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    click: Option<StatusCallback>,
    hover: Option<HoverBinding>,
}

impl StatusState {
    fn cancel_pending(&mut self) {
        self.generation += 1;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

pub struct StatusOverlay {
    view: Arc<dyn StatusView>,
    state: Mutex<StatusState>,
}

impl StatusOverlay {
    pub fn new(view: Arc<dyn StatusView>, labels: StatusOptions) -> Arc<Self> {
        let frame = StatusFrame {
            style: labels.style.clone(),
            ..StatusFrame::default()
        };
        Arc::new(Self {
            view,
            state: Mutex::new(StatusState {
                labels,
                frame,
                generation: 0,
                pending: None,
                click: None,
                hover: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StatusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self, state: &StatusState) {
        self.view.render(&state.frame);
    }

    pub fn frame(&self) -> StatusFrame {
        self.lock().frame.clone()
    }

    pub fn labels(&self) -> StatusOptions {
        self.lock().labels.clone()
    }

    pub fn open(self: &Arc<Self>, message: impl Into<String>, color: Option<&str>, delay: Duration) {
        let message = message.into();
        let color = color.map(str::to_string);
        self.schedule(delay, move |state| {
            state.frame.visible = true;
            state.frame.text = message;
            state.frame.color = color.unwrap_or_else(|| state.labels.color.clone());
            state.frame.loading = false;
            state.frame.error = false;
        });
    }

    /// Optionally replaces the text right away, then hides after `delay`.
    pub fn close(self: &Arc<Self>, message: Option<&str>, color: Option<&str>, delay: Duration) {
        if let Some(message) = message {
            let mut state = self.lock();
            state.frame.text = message.to_string();
            if let Some(color) = color {
                state.frame.color = color.to_string();
            }
            self.render(&state);
        }
        self.schedule(delay, |state| {
            state.frame.visible = false;
            state.frame.loading = false;
            state.frame.error = false;
        });
    }

    pub fn popup(self: &Arc<Self>, message: impl Into<String>, color: Option<&str>, duration: Duration) {
        self.open(message, color, Duration::ZERO);
        self.close(None, None, duration);
    }

    fn schedule<F>(self: &Arc<Self>, delay: Duration, apply: F)
    where
        F: FnOnce(&mut StatusState) + Send + 'static,
    {
        let mut state = self.lock();
        state.cancel_pending();
        if delay.is_zero() {
            apply(&mut state);
            self.render(&state);
            return;
        }
        let generation = state.generation;
        let overlay = Arc::clone(self);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = overlay.lock();
            if state.generation != generation {
                return;
            }
            state.pending = None;
            apply(&mut state);
            overlay.render(&state);
        }));
    }

    /// Loading supersedes any pending open/close and any click binding.
    pub fn show_loading(&self) {
        let mut state = self.lock();
        state.cancel_pending();
        state.click = None;
        state.frame = StatusFrame {
            visible: true,
            text: state.labels.loading.clone(),
            color: state.labels.color.clone(),
            loading: true,
            error: false,
            style: state.labels.style.clone(),
        };
        self.render(&state);
    }

    pub fn hide_loading(&self) {
        let mut state = self.lock();
        if !state.frame.loading {
            return;
        }
        state.frame.loading = false;
        self.render(&state);
    }

    pub fn loading_error(&self, retry: StatusCallback) {
        let mut state = self.lock();
        state.cancel_pending();
        state.click = Some(retry);
        state.frame = StatusFrame {
            visible: true,
            text: state.labels.load_error.clone(),
            color: state.labels.error_color.clone(),
            loading: false,
            error: true,
            style: state.labels.style.clone(),
        };
        self.render(&state);
    }

    pub fn rest(&self, wake: Option<StatusCallback>) {
        let mut state = self.lock();
        state.cancel_pending();
        state.click = wake;
        state.frame = StatusFrame {
            visible: true,
            text: state.labels.rest.clone(),
            color: state.labels.color.clone(),
            loading: false,
            error: false,
            style: state.labels.style.clone(),
        };
        self.render(&state);
    }

    pub fn on_click(&self, callback: StatusCallback) {
        self.lock().click = Some(callback);
    }

    pub fn clear_click(&self) {
        self.lock().click = None;
    }

    pub fn on_hover(&self, enter: StatusCallback, leave: StatusCallback) {
        self.lock().hover = Some(HoverBinding { enter, leave });
    }

    pub fn clear_hover(&self) {
        self.lock().hover = None;
    }

    pub fn click(&self) -> bool {
        let callback = self.lock().click.clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => {
                debug!("status: click with no binding");
                false
            }
        }
    }

    pub fn hover_enter(&self) {
        let callback = self.lock().hover.as_ref().map(|hover| Arc::clone(&hover.enter));
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn hover_leave(&self) {
        let callback = self.lock().hover.as_ref().map(|hover| Arc::clone(&hover.leave));
        if let Some(callback) = callback {
            callback();
        }
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
