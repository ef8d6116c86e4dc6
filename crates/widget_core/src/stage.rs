use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use render_bridge::{Slide, StageLayout, StageView};
use shared::{events::WidgetEvent, options::StageOptions};
use tracing::debug;

use crate::event_bus::EventBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Hidden,
    Entering,
    Shown,
    Exiting,
}

struct StageState {
    phase: StagePhase,
    layout: StageLayout,
}

/// Visual container for the model. Slides resolve only once the view reports
/// the animation finished, then publish `stageSlideIn` / `stageSlideOut`.
pub struct Stage {
    view: Arc<dyn StageView>,
    bus: Arc<EventBus>,
    transition: Duration,
    state: Mutex<StageState>,
}

impl Stage {
    pub fn new(view: Arc<dyn StageView>, bus: Arc<EventBus>, options: &StageOptions) -> Arc<Self> {
        Arc::new(Self {
            view,
            bus,
            transition: options.transition(),
            state: Mutex::new(StageState {
                phase: StagePhase::Hidden,
                layout: StageLayout {
                    visible: false,
                    width: options.width,
                    height: options.height,
                    position: (0.0, 0.0),
                    model_name: None,
                    style: options.style.clone(),
                },
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_layout(&self, update: impl FnOnce(&mut StageLayout)) {
        let mut state = self.lock();
        update(&mut state.layout);
        self.view.layout(&state.layout);
    }

    pub fn phase(&self) -> StagePhase {
        self.lock().phase
    }

    pub fn size(&self) -> (u32, u32) {
        let state = self.lock();
        (state.layout.width, state.layout.height)
    }

    pub async fn enter_transition(&self) {
        {
            let mut state = self.lock();
            state.phase = StagePhase::Entering;
            state.layout.visible = true;
            self.view.layout(&state.layout);
        }
        self.view.animate(Slide::In, self.transition).await;
        self.lock().phase = StagePhase::Shown;
        debug!("stage: slide in complete");
        self.bus.emit(&WidgetEvent::StageSlideIn);
    }

    pub async fn exit_transition(&self) {
        self.lock().phase = StagePhase::Exiting;
        self.view.animate(Slide::Out, self.transition).await;
        {
            let mut state = self.lock();
            state.phase = StagePhase::Hidden;
            state.layout.visible = false;
            self.view.layout(&state.layout);
        }
        debug!("stage: slide out complete");
        self.bus.emit(&WidgetEvent::StageSlideOut);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.update_layout(|layout| {
            layout.width = width;
            layout.height = height;
        });
    }

    pub fn set_position(&self, x: f32, y: f32) {
        self.update_layout(|layout| layout.position = (x, y));
    }

    pub fn set_style(&self, style: BTreeMap<String, String>) {
        self.update_layout(|layout| layout.style.extend(style));
    }

    pub fn set_active_model(&self, name: Option<String>) {
        self.update_layout(|layout| layout.model_name = name);
    }

    pub fn reattach_anchors(&self) {
        self.view.attach_anchors();
    }
}
