use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use render_bridge::{ModelHandle, ModelLoader, ModelSettings, RenderEngine};
use shared::domain::{ModelCatalog, ModelEntry, Selection};
use tracing::info;

use crate::error::WidgetError;

struct ModelState {
    selection: Selection,
    settings: ModelSettings,
    mounted: Option<ModelHandle>,
}

pub struct ModelManager {
    loader: Arc<dyn ModelLoader>,
    engine: Arc<dyn RenderEngine>,
    catalog: ModelCatalog,
    state: Mutex<ModelState>,
}

impl ModelManager {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        engine: Arc<dyn RenderEngine>,
        catalog: ModelCatalog,
    ) -> Self {
        Self {
            loader,
            engine,
            catalog,
            state: Mutex::new(ModelState {
                selection: Selection::default(),
                settings: ModelSettings::default(),
                mounted: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &Arc<dyn RenderEngine> {
        &self.engine
    }

    pub fn selection(&self) -> Selection {
        self.lock().selection
    }

    pub fn set_selection(&self, selection: Selection) {
        self.lock().selection = selection;
    }

    pub fn active_entry(&self) -> Option<&ModelEntry> {
        self.catalog.get(self.selection().model)
    }

    pub async fn load(&self) -> Result<ModelHandle, WidgetError> {
        if self.catalog.is_empty() {
            return Err(WidgetError::EmptyCatalog);
        }
        let selection = self.selection();
        let path = self
            .catalog
            .asset_path(selection)
            .ok_or(WidgetError::NoAsset {
                model: selection.model.0,
                clothes: selection.clothes.0,
            })?
            .to_string();
        info!(
            model = selection.model.0,
            clothes = selection.clothes.0,
            %path,
            "model: loading asset"
        );
        self.loader
            .load(&path)
            .await
            .map_err(|source| WidgetError::LoadFailed { path, source })
    }

    pub fn mount(&self, model: ModelHandle) {
        let mut state = self.lock();
        self.engine.mount(&model);
        self.engine.apply_settings(&state.settings);
        state.mounted = Some(model);
    }

    pub fn resize_surface(&self, width: u32, height: u32) {
        self.engine.resize(width, height);
    }

    fn update_settings(&self, update: impl FnOnce(&mut ModelSettings)) {
        let mut state = self.lock();
        update(&mut state.settings);
        if state.mounted.is_some() {
            self.engine.apply_settings(&state.settings);
        }
    }

    pub fn set_scale(&self, scale: f32) {
        self.update_settings(|settings| settings.scale = scale);
    }

    pub fn set_position(&self, x: f32, y: f32) {
        self.update_settings(|settings| settings.position = (x, y));
    }

    pub fn set_hit_areas_visible(&self, visible: bool) {
        self.update_settings(|settings| settings.hit_areas_visible = visible);
    }
}
