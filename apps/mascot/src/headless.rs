//! Terminal renderings of the widget's views. Everything the browser would
//! draw is reported through `tracing` instead.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use render_bridge::{
    ModelHandle, ModelLoader, ModelSettings, RenderEngine, Slide, StageLayout, StageView,
    StatusFrame, StatusView, TipsView,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ModelDescriptor {
    width: u32,
    height: u32,
    #[serde(default)]
    hit_areas: Vec<String>,
}

/// Loads model descriptor JSON files relative to `root`.
pub struct FileModelLoader {
    root: PathBuf,
}

impl FileModelLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ModelLoader for FileModelLoader {
    async fn load(&self, path: &str) -> anyhow::Result<ModelHandle> {
        let file = self.root.join(path);
        let raw = tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("failed to read model descriptor '{}'", file.display()))?;
        let descriptor: ModelDescriptor = serde_json::from_str(&raw)
            .with_context(|| format!("invalid model descriptor '{}'", file.display()))?;
        Ok(ModelHandle {
            path: path.to_string(),
            width: descriptor.width,
            height: descriptor.height,
            hit_areas: descriptor.hit_areas,
        })
    }
}

pub struct ConsoleEngine;

impl RenderEngine for ConsoleEngine {
    fn mount(&self, model: &ModelHandle) {
        info!(path = %model.path, hit_areas = ?model.hit_areas, "engine: mounted");
    }

    fn apply_settings(&self, settings: &ModelSettings) {
        info!(
            scale = settings.scale,
            x = settings.position.0,
            y = settings.position.1,
            hit_areas = settings.hit_areas_visible,
            "engine: settings"
        );
    }

    fn resize(&self, width: u32, height: u32) {
        info!(width, height, "engine: surface resized");
    }
}

pub struct ConsoleStage;

#[async_trait]
impl StageView for ConsoleStage {
    async fn animate(&self, slide: Slide, duration: Duration) {
        info!(?slide, ?duration, "stage: sliding");
        tokio::time::sleep(duration).await;
    }

    fn layout(&self, layout: &StageLayout) {
        info!(
            visible = layout.visible,
            width = layout.width,
            height = layout.height,
            model = layout.model_name.as_deref().unwrap_or("-"),
            "stage: layout"
        );
    }

    fn attach_anchors(&self) {
        info!("stage: anchors attached");
    }
}

pub struct ConsoleStatus;

impl StatusView for ConsoleStatus {
    fn render(&self, frame: &StatusFrame) {
        if frame.visible {
            info!(
                text = %frame.text,
                color = %frame.color,
                loading = frame.loading,
                error = frame.error,
                style = ?frame.style,
                "status: shown"
            );
        } else {
            info!("status: hidden");
        }
    }
}

pub struct ConsoleTips;

impl TipsView for ConsoleTips {
    fn show(&self, text: &str, priority: i32) {
        info!(priority, "tips: {text}");
    }

    fn hide(&self) {
        info!("tips: hidden");
    }

    fn apply_style(&self, style: &BTreeMap<String, String>) {
        info!(?style, "tips: style");
    }
}
