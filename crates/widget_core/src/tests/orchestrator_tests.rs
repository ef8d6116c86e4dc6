use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use render_bridge::Slide;
use shared::{
    domain::{ModelCatalog, ModelEntry},
    options::StatusOptions,
};
use storage::{MemoryStore, CLOTHES_INDEX_KEY, MODEL_INDEX_KEY};

use super::*;
use crate::{
    messages::PoolProvider,
    test_support::{
        RecordingEngine, RecordingStageView, RecordingStatusView, RecordingTipsView, StubLoader,
    },
};

const DESKTOP: Viewport = Viewport {
    width: 1280,
    height: 800,
};
const PHONE: Viewport = Viewport {
    width: 375,
    height: 667,
};

struct Harness {
    widget: Arc<Orchestrator>,
    loader: Arc<StubLoader>,
    engine: Arc<RecordingEngine>,
    stage: Arc<RecordingStageView>,
    status: Arc<RecordingStatusView>,
    tips: Arc<RecordingTipsView>,
    store: MemoryStore,
}

impl Harness {
    async fn persisted(&self) -> (Option<String>, Option<String>) {
        (
            self.store.get(MODEL_INDEX_KEY).await.expect("model key"),
            self.store.get(CLOTHES_INDEX_KEY).await.expect("clothes key"),
        )
    }
}

struct Setup {
    options: WidgetOptions,
    loader: StubLoader,
    engine: RecordingEngine,
    store: MemoryStore,
    viewport: Viewport,
}

impl Setup {
    fn new(options: WidgetOptions) -> Self {
        Self {
            options,
            loader: StubLoader::new(),
            engine: RecordingEngine::default(),
            store: MemoryStore::new(),
            viewport: DESKTOP,
        }
    }

    async fn build(self) -> Harness {
        let loader = Arc::new(self.loader);
        let engine = Arc::new(self.engine);
        let stage = Arc::new(RecordingStageView::default());
        let status = Arc::new(RecordingStatusView::default());
        let tips = Arc::new(RecordingTipsView::default());
        let widget = Orchestrator::new(
            self.options,
            WidgetDependencies {
                loader: loader.clone(),
                engine: engine.clone(),
                stage_view: stage.clone(),
                status_view: status.clone(),
                tips_view: tips.clone(),
                store: Arc::new(self.store.clone()),
                word_of_the_day: None,
                viewport: self.viewport,
            },
        )
        .await;
        Harness {
            widget,
            loader,
            engine,
            stage,
            status,
            tips,
            store: self.store,
        }
    }
}

fn options(entries: Vec<ModelEntry>) -> WidgetOptions {
    WidgetOptions {
        models: ModelCatalog::new(entries),
        ..WidgetOptions::default()
    }
}

fn three_models() -> WidgetOptions {
    options(vec![
        ModelEntry::new("A", "a.model"),
        ModelEntry::with_variants("B", vec!["b0.model".into(), "b1.model".into()]),
        ModelEntry::new("C", "c.model"),
    ])
}

async fn harness(options: WidgetOptions) -> Harness {
    Setup::new(options).build().await
}

fn count_loads(widget: &Orchestrator) -> Arc<AtomicUsize> {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    widget.on(EventChannel::Load, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    loads
}

#[tokio::test(start_paused = true)]
async fn switch_by_name_runs_full_workflow() {
    let h = harness(options(vec![ModelEntry::new("A", "a.model")])).await;
    let loaded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&loaded);
    h.widget.on(EventChannel::Load, move |event| {
        if let WidgetEvent::Load { model_name, .. } = event {
            sink.lock().expect("loaded").push(model_name.clone());
        }
    });

    h.widget.switch_by_name("A", None).await;

    assert_eq!(h.stage.slides(), vec![Slide::Out, Slide::In]);
    assert_eq!(h.loader.calls(), vec!["a.model"]);
    assert_eq!(h.engine.mounts(), vec!["a.model"]);
    assert_eq!(h.engine.resizes(), vec![(280, 250)]);
    assert_eq!(h.stage.anchor_count(), 1);
    assert_eq!(h.persisted().await, (Some("0".into()), Some("0".into())));
    assert!(!h.status.last().visible);
    assert_eq!(*loaded.lock().expect("loaded"), vec!["A".to_string()]);

    let layout = h.stage.last_layout();
    assert!(layout.visible);
    assert_eq!((layout.width, layout.height), (280, 250));
    assert_eq!(layout.model_name.as_deref(), Some("A"));
}

#[tokio::test(start_paused = true)]
async fn switch_by_index_persists_and_defaults_clothes() {
    let h = harness(three_models()).await;

    h.widget.switch_by_index(2, None).await;
    assert_eq!(h.widget.selection(), Selection::new(2, 0));
    assert_eq!(h.persisted().await, (Some("2".into()), Some("0".into())));

    h.widget.switch_by_index(1, Some(1)).await;
    assert_eq!(h.widget.selection(), Selection::new(1, 1));
    assert_eq!(h.persisted().await, (Some("1".into()), Some("1".into())));
    assert_eq!(h.loader.calls(), vec!["c.model", "b1.model"]);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_requests_are_ignored() {
    let h = harness(three_models()).await;

    h.widget.switch_by_index(7, None).await;
    h.widget.switch_by_index(0, Some(3)).await;
    h.widget.switch_by_name("missing", None).await;

    assert_eq!(h.widget.selection(), Selection::default());
    assert!(h.stage.slides().is_empty());
    assert!(h.loader.calls().is_empty());
    assert_eq!(h.persisted().await, (None, None));
}

#[tokio::test(start_paused = true)]
async fn switch_by_name_picks_first_match() {
    let h = harness(options(vec![
        ModelEntry::new("A", "a.model"),
        ModelEntry::new("Twin", "t0.model"),
        ModelEntry::new("Twin", "t1.model"),
    ]))
    .await;

    h.widget.switch_by_name("Twin", None).await;
    assert_eq!(h.widget.selection(), Selection::new(1, 0));
}

#[tokio::test(start_paused = true)]
async fn random_never_repeats_current_model() {
    let h = harness(three_models()).await;

    for _ in 0..12 {
        let before = h.widget.selection();
        h.widget.switch_to_random().await;
        let after = h.widget.selection();
        assert_ne!(after.model, before.model);
        assert_eq!(after.clothes, ClothesIndex(0));
    }
}

#[tokio::test(start_paused = true)]
async fn random_with_single_entry_reloads_it() {
    let h = harness(options(vec![ModelEntry::new("A", "a.model")])).await;

    h.widget.switch_to_random().await;
    assert_eq!(h.widget.selection(), Selection::default());
    assert_eq!(h.loader.calls(), vec!["a.model"]);
}

#[tokio::test(start_paused = true)]
async fn next_wraps_around_catalog() {
    let h = harness(options(vec![
        ModelEntry::new("A", "a.model"),
        ModelEntry::new("B", "b.model"),
    ]))
    .await;

    h.widget.switch_to_next().await;
    assert_eq!(h.widget.selection().model.0, 1);
    h.widget.switch_to_next().await;
    assert_eq!(h.widget.selection().model.0, 0);
    assert_eq!(h.loader.calls(), vec!["b.model", "a.model"]);
}

#[tokio::test(start_paused = true)]
async fn next_clothes_cycles_variants() {
    let h = harness(three_models()).await;
    h.widget.switch_by_index(1, None).await;

    h.widget.switch_to_next_clothes().await;
    assert_eq!(h.widget.selection(), Selection::new(1, 1));
    h.widget.switch_to_next_clothes().await;
    assert_eq!(h.widget.selection(), Selection::new(1, 0));
    assert_eq!(h.loader.calls(), vec!["b0.model", "b1.model", "b0.model"]);
}

#[tokio::test(start_paused = true)]
async fn next_clothes_without_variants_only_notifies() {
    let h = harness(three_models()).await;

    h.widget.switch_to_next_clothes().await;

    assert!(h.loader.calls().is_empty());
    assert!(h.stage.slides().is_empty());
    assert!(h
        .tips
        .shown()
        .contains(&MessageOptions::default().no_clothes));
}

#[tokio::test(start_paused = true)]
async fn load_failure_shows_error_and_click_retries() {
    let h = Setup {
        loader: StubLoader::failing(),
        ..Setup::new(options(vec![ModelEntry::new("A", "a.model")]))
    }
    .build()
    .await;
    let loads = count_loads(&h.widget);

    h.widget.switch_to_next().await;

    let frame = h.status.last();
    assert!(frame.error);
    assert_eq!(frame.text, StatusOptions::default().load_error);
    assert_eq!(h.stage.slides(), vec![Slide::Out]);
    assert!(h.engine.mounts().is_empty());
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    h.loader.set_failing(false);
    assert!(h.widget.status().click());
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.stage.slides(), vec![Slide::Out, Slide::Out, Slide::In]);
    assert_eq!(h.loader.calls(), vec!["a.model", "a.model"]);
    assert_eq!(h.engine.mounts(), vec!["a.model"]);
    assert!(!h.status.last().error);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn mobile_hidden_rests_without_loading() {
    let h = Setup {
        viewport: PHONE,
        ..Setup::new(three_models())
    }
    .build()
    .await;
    assert!(h.widget.is_mobile_hidden());

    h.widget.switch_to_next().await;

    assert_eq!(h.status.last().text, StatusOptions::default().rest);
    assert!(h.loader.calls().is_empty());
    assert_eq!(h.stage.slides(), vec![Slide::Out]);
    // Selection still moves; only the load is skipped.
    assert_eq!(h.widget.selection().model.0, 1);
}

#[tokio::test(start_paused = true)]
async fn crossing_breakpoint_reloads() {
    let h = Setup {
        viewport: PHONE,
        ..Setup::new(three_models())
    }
    .build()
    .await;

    h.widget.on_viewport_resize(Viewport::new(400, 700)).await;
    assert!(h.stage.slides().is_empty());

    h.widget.on_viewport_resize(DESKTOP).await;
    assert!(!h.widget.is_mobile_hidden());
    assert_eq!(h.loader.calls(), vec!["a.model"]);
    assert_eq!(h.stage.slides(), vec![Slide::Out, Slide::In]);

    h.widget.on_viewport_resize(Viewport::new(1024, 768)).await;
    assert_eq!(h.loader.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn mobile_display_option_keeps_widget_visible() {
    let mut opts = three_models();
    opts.mobile.display = true;
    let h = Setup {
        viewport: PHONE,
        ..Setup::new(opts)
    }
    .build()
    .await;

    h.widget.start().await;
    assert_eq!(h.loader.calls(), vec!["a.model"]);
}

#[tokio::test(start_paused = true)]
async fn initial_start_skips_switching_banner() {
    let h = harness(three_models()).await;

    h.widget.start().await;

    let switching = StatusOptions::default().switching;
    assert!(h.status.frames().iter().all(|frame| frame.text != switching));
    assert_eq!(h.engine.mounts(), vec!["a.model"]);

    h.widget.reload().await;
    assert!(h.status.frames().iter().any(|frame| frame.text == switching));
}

#[tokio::test(start_paused = true)]
async fn sleeping_widget_wakes_on_click() {
    let mut opts = three_models();
    opts.initial_status = InitialStatus::Sleep;
    let h = harness(opts).await;

    h.widget.start().await;
    assert_eq!(h.status.last().text, StatusOptions::default().rest);
    assert!(h.loader.calls().is_empty());

    assert!(h.widget.status().click());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.engine.mounts(), vec!["a.model"]);
}

#[tokio::test(start_paused = true)]
async fn broken_environment_is_not_fatal() {
    let h = Setup {
        engine: RecordingEngine::broken_environment("no webgl"),
        ..Setup::new(three_models())
    }
    .build()
    .await;

    h.widget.start().await;
    assert_eq!(h.engine.mounts(), vec!["a.model"]);
}

#[tokio::test(start_paused = true)]
async fn restores_persisted_selection() {
    let store = MemoryStore::new();
    store.set(MODEL_INDEX_KEY, "1").await.expect("seed");
    store.set(CLOTHES_INDEX_KEY, "1").await.expect("seed");
    let h = Setup {
        store,
        ..Setup::new(three_models())
    }
    .build()
    .await;

    assert_eq!(h.widget.selection(), Selection::new(1, 1));
    h.widget.start().await;
    assert_eq!(h.loader.calls(), vec!["b1.model"]);
}

#[tokio::test(start_paused = true)]
async fn stale_persisted_selection_falls_back_to_first_model() {
    let store = MemoryStore::new();
    store.set(MODEL_INDEX_KEY, "9").await.expect("seed");
    let h = Setup {
        store,
        ..Setup::new(three_models())
    }
    .build()
    .await;

    assert_eq!(h.widget.selection(), Selection::default());
}

#[tokio::test(start_paused = true)]
async fn empty_catalog_aborts_after_exit() {
    let h = harness(options(Vec::new())).await;

    h.widget.switch_to_next().await;
    h.widget.switch_to_random().await;

    assert_eq!(h.stage.slides(), vec![Slide::Out, Slide::Out]);
    assert!(h.loader.calls().is_empty());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!h.status.last().visible);
    assert!(!h.widget.status().frame().visible);
}

#[tokio::test(start_paused = true)]
async fn welcome_follows_enter_transition() {
    let h = harness(three_models()).await;

    h.widget.start().await;

    let welcome = local_welcome_message(&MessageOptions::default()).expect("welcome");
    let priority = MessageOptions::default().welcome_priority;
    assert_eq!(h.widget.tips().priority(), priority);
    assert!(h.tips.shown().contains(&welcome));
}

#[tokio::test(start_paused = true)]
async fn workflow_clears_pinned_tip() {
    let h = harness(three_models()).await;
    assert!(h.widget.say_with_priority("pinned", Duration::from_secs(60), 99));

    h.widget.switch_to_next().await;

    assert_ne!(h.widget.tips().content().as_deref(), Some("pinned"));
    assert_ne!(h.widget.tips().priority(), 99);
}

#[tokio::test(start_paused = true)]
async fn copy_and_return_visit_notify() {
    let h = harness(three_models()).await;
    let defaults = MessageOptions::default();

    h.widget.on_copy();
    let shown = h.tips.shown();
    assert!(defaults.copy.contains(shown.last().expect("copy tip")));

    tokio::time::sleep(Duration::from_secs(10)).await;
    h.widget.on_visibility_return();
    assert_eq!(h.tips.shown().last(), Some(&defaults.return_visit));
}

#[tokio::test(start_paused = true)]
async fn overlapping_switches_run_in_order() {
    let h = harness(three_models()).await;

    let first = tokio::spawn({
        let widget = Arc::clone(&h.widget);
        async move { widget.switch_to_next().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.widget.switch_by_index(2, None).await;
    first.await.expect("first switch");

    assert_eq!(h.widget.selection(), Selection::new(2, 0));
    assert_eq!(h.loader.calls(), vec!["b0.model", "c.model"]);
    assert_eq!(
        h.stage.slides(),
        vec![Slide::Out, Slide::In, Slide::Out, Slide::In]
    );
}

#[tokio::test(start_paused = true)]
async fn settings_forward_to_mounted_model() {
    let h = harness(three_models()).await;
    h.widget.start().await;

    h.widget.set_scale(2.0);
    h.widget.set_position(4.0, 8.0);
    h.widget.set_hit_areas_visible(true);

    let settings = h.engine.last_settings().expect("settings");
    assert_eq!(settings.scale, 2.0);
    assert_eq!(settings.position, (4.0, 8.0));
    assert!(settings.hit_areas_visible);
}

#[tokio::test(start_paused = true)]
async fn global_style_merges_into_stage() {
    let h = harness(three_models()).await;

    h.widget
        .set_global_style(BTreeMap::from([("z-index".to_string(), "10".to_string())]));
    h.widget
        .set_stage_style(BTreeMap::from([("left".to_string(), "0".to_string())]));

    let layout = h.stage.last_layout();
    assert_eq!(layout.style.get("z-index").map(String::as_str), Some("10"));
    assert_eq!(layout.style.get("left").map(String::as_str), Some("0"));
    assert_eq!(h.widget.global_style().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sleep_hides_until_woken() {
    let h = harness(three_models()).await;
    h.widget.start().await;

    h.widget.sleep().await;
    assert_eq!(h.stage.slides(), vec![Slide::Out, Slide::In, Slide::Out]);
    assert_eq!(h.status.last().text, StatusOptions::default().rest);
    assert_eq!(h.widget.tips().content(), None);

    assert!(h.widget.status().click());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.engine.mounts(), vec!["a.model", "a.model"]);
}

#[tokio::test(start_paused = true)]
async fn stage_position_is_independent_of_model_position() {
    let h = harness(three_models()).await;
    h.widget.start().await;

    h.widget.set_stage_position(12.0, -6.0);
    h.widget.set_position(1.0, 2.0);

    assert_eq!(h.stage.last_layout().position, (12.0, -6.0));
    assert_eq!(
        h.engine.last_settings().map(|settings| settings.position),
        Some((1.0, 2.0))
    );
}

#[tokio::test(start_paused = true)]
async fn status_and_tips_styles_reach_their_views() {
    let mut opts = three_models();
    opts.status.style = BTreeMap::from([("font-size".to_string(), "12px".to_string())]);
    opts.tips.style = BTreeMap::from([("width".to_string(), "250px".to_string())]);
    let h = harness(opts).await;

    h.widget.start().await;

    assert_eq!(
        h.tips.style().get("width").map(String::as_str),
        Some("250px")
    );
    let frames = h.status.frames();
    assert!(!frames.is_empty());
    assert!(frames
        .iter()
        .all(|frame| frame.style.get("font-size").map(String::as_str) == Some("12px")));
}

#[tokio::test(start_paused = true)]
async fn runtime_message_options_apply_to_later_notices() {
    let h = harness(three_models()).await;
    h.widget.set_message_options(MessageOptions {
        copy: vec!["copied!".to_string()],
        return_visit: "back again".to_string(),
        ..MessageOptions::default()
    });

    h.widget.on_copy();
    assert_eq!(h.tips.shown().last().map(String::as_str), Some("copied!"));

    tokio::time::sleep(Duration::from_secs(10)).await;
    h.widget.on_visibility_return();
    assert_eq!(h.tips.shown().last().map(String::as_str), Some("back again"));
}

#[tokio::test(start_paused = true)]
async fn idle_pool_can_be_replaced_at_runtime() {
    let mut opts = three_models();
    opts.tips.idle.interval_ms = 1_000;
    let h = harness(opts).await;

    h.widget.set_idle_messages(vec!["fresh idle".to_string()]);
    h.widget.tips().start_idle();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(h.tips.shown(), vec!["fresh idle"]);

    h.widget.tips().clear();
    let provider: PoolProvider = Arc::new(|| async { vec!["from provider".to_string()] }.boxed());
    h.widget.set_message_pool(MessagePool::Provider(provider));
    h.widget.tips().start_idle();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(h.tips.shown().last().map(String::as_str), Some("from provider"));
}

#[tokio::test(start_paused = true)]
async fn stage_slides_are_exposed_and_publish_events() {
    let h = harness(three_models()).await;
    let slides = Arc::new(AtomicUsize::new(0));
    for channel in [EventChannel::StageSlideIn, EventChannel::StageSlideOut] {
        let counter = Arc::clone(&slides);
        h.widget.on(channel, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    h.widget.stage_slide_in().await;
    h.widget.stage_slide_out().await;

    assert_eq!(h.stage.slides(), vec![Slide::In, Slide::Out]);
    assert_eq!(slides.load(Ordering::SeqCst), 2);
}
