use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
    time::Duration,
};

use rand::Rng;
use render_bridge::{ModelLoader, RenderEngine, StageView, StatusView, TipsView};
use shared::{
    domain::{ClothesIndex, Selection, Viewport, ViewportClass},
    events::{EventChannel, WidgetEvent},
    options::{InitialStatus, MessageOptions, MobileOptions, WidgetOptions},
};
use storage::{KeyValueStore, SelectionStore};
use tracing::{debug, info, warn};

use crate::{
    event_bus::EventBus,
    messages::{local_welcome_message, pick_random, IdleSource, MessagePool, RemoteWordOfTheDay, WordOfTheDay},
    model::ModelManager,
    stage::Stage,
    status::{StatusCallback, StatusOverlay},
    tips::{Tips, TipsConfig},
};

pub struct WidgetDependencies {
    pub loader: Arc<dyn ModelLoader>,
    pub engine: Arc<dyn RenderEngine>,
    pub stage_view: Arc<dyn StageView>,
    pub status_view: Arc<dyn StatusView>,
    pub tips_view: Arc<dyn TipsView>,
    pub store: Arc<dyn KeyValueStore>,
    /// Overrides the endpoint configured under `tips.idle.word_of_the_day`.
    pub word_of_the_day: Option<Arc<dyn WordOfTheDay>>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowKind {
    Initial,
    Switch,
}

pub struct Orchestrator {
    bus: Arc<EventBus>,
    tips: Arc<Tips>,
    status: Arc<StatusOverlay>,
    stage: Arc<Stage>,
    models: ModelManager,
    store: SelectionStore,
    messages: Arc<RwLock<MessageOptions>>,
    mobile: MobileOptions,
    initial_status: InitialStatus,
    global_style: Mutex<BTreeMap<String, String>>,
    selection: Mutex<Selection>,
    viewport: Mutex<Viewport>,
    /// Serializes workflows; queued switches run in request order.
    transitions: tokio::sync::Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn random_other_index(len: usize, current: usize) -> usize {
    if len < 2 {
        return 0;
    }
    let pick = rand::thread_rng().gen_range(0..len - 1);
    if pick >= current {
        pick + 1
    } else {
        pick
    }
}

impl Orchestrator {
    pub async fn new(options: WidgetOptions, deps: WidgetDependencies) -> Arc<Self> {
        let bus = EventBus::new();

        let mut source = IdleSource::new(MessagePool::Literal(options.tips.idle.messages.clone()));
        let word_of_the_day = deps.word_of_the_day.or_else(|| {
            let endpoint = options.tips.idle.word_of_the_day.as_deref()?;
            match RemoteWordOfTheDay::new(endpoint) {
                Ok(remote) => Some(Arc::new(remote) as Arc<dyn WordOfTheDay>),
                Err(err) => {
                    warn!("widget: word of the day disabled: {err}");
                    None
                }
            }
        });
        if let Some(provider) = word_of_the_day {
            source = source.with_word_of_the_day(provider);
        }

        let tips = Tips::new(deps.tips_view, TipsConfig::from(&options.tips), source);
        tips.set_style(&options.tips.style);
        let status = StatusOverlay::new(deps.status_view, options.status.clone());
        let stage = Stage::new(deps.stage_view, Arc::clone(&bus), &options.stage);
        stage.set_style(options.style.clone());
        let models = ModelManager::new(deps.loader, deps.engine, options.models.clone());
        let store = SelectionStore::new(deps.store);

        let restored = match store.load().await {
            Ok(selection) if models.catalog().contains(selection) => selection,
            Ok(selection) => {
                debug!(
                    model = selection.model.0,
                    clothes = selection.clothes.0,
                    "widget: persisted selection out of range, using default"
                );
                Selection::default()
            }
            Err(err) => {
                warn!("widget: failed to restore selection: {err:#}");
                Selection::default()
            }
        };
        models.set_selection(restored);
        stage.set_active_model(models.active_entry().map(|entry| entry.name.clone()));

        let messages = Arc::new(RwLock::new(options.tips.messages.clone()));
        {
            let tips = Arc::clone(&tips);
            let messages = Arc::clone(&messages);
            bus.on(EventChannel::StageSlideIn, move |_| {
                let (text, duration, priority) = {
                    let messages = messages.read().unwrap_or_else(PoisonError::into_inner);
                    (
                        local_welcome_message(&messages),
                        messages.welcome_duration(),
                        messages.welcome_priority,
                    )
                };
                if let Some(text) = text {
                    tips.notify_with_priority(text, duration, priority);
                }
            });
        }

        Arc::new(Self {
            bus,
            tips,
            status,
            stage,
            models,
            store,
            messages,
            mobile: options.mobile,
            initial_status: options.initial_status,
            global_style: Mutex::new(options.style),
            selection: Mutex::new(restored),
            viewport: Mutex::new(deps.viewport),
            transitions: tokio::sync::Mutex::new(()),
        })
    }

    pub fn tips(&self) -> &Arc<Tips> {
        &self.tips
    }

    pub fn status(&self) -> &Arc<StatusOverlay> {
        &self.status
    }

    pub fn selection(&self) -> Selection {
        *lock(&self.selection)
    }

    pub fn viewport(&self) -> Viewport {
        *lock(&self.viewport)
    }

    pub fn on<F>(&self, channel: EventChannel, callback: F)
    where
        F: Fn(&WidgetEvent) + Send + Sync + 'static,
    {
        self.bus.on(channel, callback);
    }

    pub fn is_mobile_hidden(&self) -> bool {
        !self.mobile.display
            && self.viewport().classify(self.mobile.breakpoint) == ViewportClass::Mobile
    }

    pub async fn start(self: &Arc<Self>) {
        info!(version = env!("CARGO_PKG_VERSION"), "widget: starting");
        if let Err(err) = self.models.engine().check_environment() {
            warn!("widget: environment check failed: {err:#}");
        }
        match self.initial_status {
            InitialStatus::Sleep => {
                info!("widget: initial status is sleep");
                self.status.rest(Some(self.reload_callback()));
            }
            InitialStatus::Active => {
                let _transition = self.transitions.lock().await;
                self.run_workflow(WorkflowKind::Initial).await;
            }
        }
    }

    pub async fn sleep(self: &Arc<Self>) {
        let _transition = self.transitions.lock().await;
        info!("widget: going to sleep");
        self.tips.clear();
        self.stage.exit_transition().await;
        self.status.rest(Some(self.reload_callback()));
    }

    pub async fn reload(self: &Arc<Self>) {
        let _transition = self.transitions.lock().await;
        self.run_workflow(WorkflowKind::Switch).await;
    }

    pub async fn switch_to_random(self: &Arc<Self>) {
        let _transition = self.transitions.lock().await;
        let len = self.models.catalog().len();
        if len > 0 {
            let index = random_other_index(len, self.selection().model.0);
            self.apply_selection(Selection::new(index, 0)).await;
        }
        self.run_workflow(WorkflowKind::Switch).await;
    }

    pub async fn switch_to_next(self: &Arc<Self>) {
        let _transition = self.transitions.lock().await;
        if let Some(next) = self.models.catalog().next_index(self.selection().model) {
            self.apply_selection(Selection::model(next)).await;
        }
        self.run_workflow(WorkflowKind::Switch).await;
    }

    pub async fn switch_by_index(self: &Arc<Self>, index: usize, clothes: Option<usize>) {
        let _transition = self.transitions.lock().await;
        let selection = Selection::new(index, clothes.unwrap_or(0));
        if !self.models.catalog().contains(selection) {
            debug!(index, ?clothes, "widget: ignoring out-of-range selection");
            return;
        }
        self.apply_selection(selection).await;
        self.run_workflow(WorkflowKind::Switch).await;
    }

    pub async fn switch_by_name(self: &Arc<Self>, name: &str, clothes: Option<usize>) {
        let Some(index) = self.models.catalog().find_by_name(name) else {
            debug!(name, "widget: ignoring unknown model name");
            return;
        };
        self.switch_by_index(index.0, clothes).await;
    }

    pub async fn switch_to_next_clothes(self: &Arc<Self>) {
        let _transition = self.transitions.lock().await;
        let current = self.selection();
        let variants = self.models.catalog().variant_count(current.model);
        if variants <= 1 {
            let (text, duration) = {
                let messages = self.messages.read().unwrap_or_else(PoisonError::into_inner);
                (messages.no_clothes.clone(), messages.copy_duration())
            };
            self.tips.notify(text, duration);
            return;
        }
        let next = Selection {
            model: current.model,
            clothes: ClothesIndex((current.clothes.0 + 1) % variants),
        };
        self.apply_selection(next).await;
        self.run_workflow(WorkflowKind::Switch).await;
    }

    /// The only mutation path for the selection. Local state and dependent
    /// components are updated before the first suspension point.
    async fn apply_selection(&self, selection: Selection) {
        *lock(&self.selection) = selection;
        self.models.set_selection(selection);
        self.stage
            .set_active_model(self.models.active_entry().map(|entry| entry.name.clone()));
        if let Err(err) = self.store.save(selection).await {
            warn!(
                model = selection.model.0,
                clothes = selection.clothes.0,
                "widget: failed to persist selection: {err:#}"
            );
        }
    }

    async fn run_workflow(self: &Arc<Self>, kind: WorkflowKind) {
        let selection = self.selection();
        info!(
            model = selection.model.0,
            clothes = selection.clothes.0,
            ?kind,
            "widget: transition started"
        );

        self.tips.clear();
        if kind == WorkflowKind::Switch {
            let switching = self.status.labels().switching;
            self.status.open(switching, None, Duration::ZERO);
        }
        self.stage.exit_transition().await;

        if self.models.catalog().is_empty() {
            warn!("widget: model catalog is empty; nothing to load");
            self.status.close(None, None, Duration::ZERO);
            return;
        }
        if self.is_mobile_hidden() {
            info!("widget: hidden on mobile viewport");
            self.status.rest(None);
            return;
        }

        self.status.show_loading();
        let model = match self.models.load().await {
            Ok(model) => model,
            Err(err) => {
                warn!("widget: {err:#}");
                self.status.loading_error(self.reload_callback());
                return;
            }
        };

        let (width, height) = (model.width, model.height);
        self.models.mount(model);
        self.stage.reattach_anchors();
        self.stage.resize(width, height);
        self.models.resize_surface(width, height);
        self.status.hide_loading();
        self.status.close(None, None, Duration::ZERO);

        self.stage.enter_transition().await;
        self.tips.start_idle();

        let model_name = self
            .models
            .active_entry()
            .map(|entry| entry.name.clone())
            .unwrap_or_default();
        info!(model = %model_name, "widget: model loaded");
        self.bus.emit(&WidgetEvent::Load {
            selection,
            model_name,
        });
    }

    fn reload_callback(self: &Arc<Self>) -> StatusCallback {
        let widget = Arc::downgrade(self);
        Arc::new(move || {
            if let Some(widget) = widget.upgrade() {
                widget.spawn_reload();
            }
        })
    }

    fn spawn_reload(self: Arc<Self>) {
        tokio::spawn(async move { self.reload().await });
    }

    pub async fn on_viewport_resize(self: &Arc<Self>, viewport: Viewport) {
        let breakpoint = self.mobile.breakpoint;
        let previous = std::mem::replace(&mut *lock(&self.viewport), viewport);
        if previous.classify(breakpoint) == viewport.classify(breakpoint) {
            return;
        }
        info!(
            width = viewport.width,
            class = ?viewport.classify(breakpoint),
            "widget: viewport class changed"
        );
        self.reload().await;
    }

    pub fn on_copy(&self) {
        let (text, duration) = {
            let messages = self.messages.read().unwrap_or_else(PoisonError::into_inner);
            (pick_random(&messages.copy), messages.copy_duration())
        };
        if let Some(text) = text {
            self.tips.notify(text, duration);
        }
    }

    pub fn on_visibility_return(&self) {
        let (text, duration) = {
            let messages = self.messages.read().unwrap_or_else(PoisonError::into_inner);
            (messages.return_visit.clone(), messages.copy_duration())
        };
        if !text.is_empty() {
            self.tips.notify(text, duration);
        }
    }

    pub fn say(&self, text: impl Into<String>, duration: Duration) -> bool {
        self.tips.notify(text, duration)
    }

    pub fn say_with_priority(&self, text: impl Into<String>, duration: Duration, priority: i32) -> bool {
        self.tips.notify_with_priority(text, duration, priority)
    }

    pub async fn stage_slide_in(&self) {
        self.stage.enter_transition().await;
    }

    pub async fn stage_slide_out(&self) {
        self.stage.exit_transition().await;
    }

    pub fn set_scale(&self, scale: f32) {
        self.models.set_scale(scale);
    }

    pub fn set_position(&self, x: f32, y: f32) {
        self.models.set_position(x, y);
    }

    pub fn set_stage_position(&self, x: f32, y: f32) {
        self.stage.set_position(x, y);
    }

    pub fn set_hit_areas_visible(&self, visible: bool) {
        self.models.set_hit_areas_visible(visible);
    }

    pub fn set_stage_style(&self, style: BTreeMap<String, String>) {
        self.stage.set_style(style);
    }

    pub fn set_global_style(&self, style: BTreeMap<String, String>) {
        lock(&self.global_style).extend(style.clone());
        self.stage.set_style(style);
    }

    pub fn global_style(&self) -> BTreeMap<String, String> {
        lock(&self.global_style).clone()
    }

    pub fn set_idle_messages(&self, messages: Vec<String>) {
        self.tips.set_pool(MessagePool::Literal(messages));
    }

    pub fn set_message_pool(&self, pool: MessagePool) {
        self.tips.set_pool(pool);
    }

    pub fn set_message_options(&self, messages: MessageOptions) {
        *self.messages.write().unwrap_or_else(PoisonError::into_inner) = messages;
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
