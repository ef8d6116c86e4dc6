use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use render_bridge::{
    ModelHandle, ModelLoader, ModelSettings, RenderEngine, Slide, StageLayout, StageView,
    StatusFrame, StatusView, TipsView,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipsEvent {
    Show(String, i32),
    Hide,
}

#[derive(Default)]
pub struct RecordingTipsView {
    events: Mutex<Vec<TipsEvent>>,
    style: Mutex<BTreeMap<String, String>>,
}

impl RecordingTipsView {
    pub fn style(&self) -> BTreeMap<String, String> {
        self.style.lock().expect("tips style").clone()
    }

    pub fn events(&self) -> Vec<TipsEvent> {
        self.events.lock().expect("tips events").clone()
    }

    pub fn shown(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TipsEvent::Show(text, _) => Some(text),
                TipsEvent::Hide => None,
            })
            .collect()
    }
}

impl TipsView for RecordingTipsView {
    fn show(&self, text: &str, priority: i32) {
        self.events
            .lock()
            .expect("tips events")
            .push(TipsEvent::Show(text.to_string(), priority));
    }

    fn hide(&self) {
        self.events.lock().expect("tips events").push(TipsEvent::Hide);
    }

    fn apply_style(&self, style: &BTreeMap<String, String>) {
        self.style.lock().expect("tips style").extend(style.clone());
    }
}

#[derive(Default)]
pub struct RecordingStatusView {
    frames: Mutex<Vec<StatusFrame>>,
}

impl RecordingStatusView {
    pub fn frames(&self) -> Vec<StatusFrame> {
        self.frames.lock().expect("status frames").clone()
    }

    pub fn last(&self) -> StatusFrame {
        self.frames().last().cloned().unwrap_or_default()
    }
}

impl StatusView for RecordingStatusView {
    fn render(&self, frame: &StatusFrame) {
        self.frames
            .lock()
            .expect("status frames")
            .push(frame.clone());
    }
}

#[derive(Default)]
pub struct RecordingStageView {
    slides: Mutex<Vec<Slide>>,
    layouts: Mutex<Vec<StageLayout>>,
    anchors: AtomicUsize,
}

impl RecordingStageView {
    pub fn slides(&self) -> Vec<Slide> {
        self.slides.lock().expect("slides").clone()
    }

    pub fn last_layout(&self) -> StageLayout {
        self.layouts
            .lock()
            .expect("layouts")
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StageView for RecordingStageView {
    async fn animate(&self, slide: Slide, duration: Duration) {
        self.slides.lock().expect("slides").push(slide);
        tokio::time::sleep(duration).await;
    }

    fn layout(&self, layout: &StageLayout) {
        self.layouts.lock().expect("layouts").push(layout.clone());
    }

    fn attach_anchors(&self) {
        self.anchors.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct StubLoader {
    fail: AtomicBool,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl StubLoader {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            delay: Duration::from_millis(200),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let loader = Self::new();
        loader.set_failing(true);
        loader
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("loader calls").clone()
    }
}

#[async_trait]
impl ModelLoader for StubLoader {
    async fn load(&self, path: &str) -> Result<ModelHandle> {
        self.calls
            .lock()
            .expect("loader calls")
            .push(path.to_string());
        tokio::time::sleep(self.delay).await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("asset missing: {path}"));
        }
        Ok(ModelHandle {
            path: path.to_string(),
            width: 280,
            height: 250,
            hit_areas: vec!["head".into(), "body".into()],
        })
    }
}

#[derive(Default)]
pub struct RecordingEngine {
    mounts: Mutex<Vec<String>>,
    resizes: Mutex<Vec<(u32, u32)>>,
    settings: Mutex<Vec<ModelSettings>>,
    environment_error: Option<String>,
}

impl RecordingEngine {
    pub fn broken_environment(reason: &str) -> Self {
        Self {
            environment_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn mounts(&self) -> Vec<String> {
        self.mounts.lock().expect("mounts").clone()
    }

    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.resizes.lock().expect("resizes").clone()
    }

    pub fn last_settings(&self) -> Option<ModelSettings> {
        self.settings.lock().expect("settings").last().cloned()
    }
}

impl RenderEngine for RecordingEngine {
    fn check_environment(&self) -> Result<()> {
        match &self.environment_error {
            Some(reason) => Err(anyhow!(reason.clone())),
            None => Ok(()),
        }
    }

    fn mount(&self, model: &ModelHandle) {
        self.mounts
            .lock()
            .expect("mounts")
            .push(model.path.clone());
    }

    fn apply_settings(&self, settings: &ModelSettings) {
        self.settings
            .lock()
            .expect("settings")
            .push(settings.clone());
    }

    fn resize(&self, width: u32, height: u32) {
        self.resizes.lock().expect("resizes").push((width, height));
    }
}
