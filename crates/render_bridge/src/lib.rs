//! Capabilities the widget consumes from its host: model loading, the render
//! engine, and the visual surfaces for the stage, status overlay and tips.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;

/// Drawable produced by a [`ModelLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub hit_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub scale: f32,
    pub position: (f32, f32),
    pub hit_areas_visible: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: (0.0, 0.0),
            hit_areas_visible: false,
        }
    }
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, path: &str) -> anyhow::Result<ModelHandle>;
}

pub trait RenderEngine: Send + Sync {
    fn check_environment(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn mount(&self, model: &ModelHandle);
    fn apply_settings(&self, settings: &ModelSettings);
    fn resize(&self, width: u32, height: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slide {
    In,
    Out,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageLayout {
    pub visible: bool,
    pub width: u32,
    pub height: u32,
    pub position: (f32, f32),
    pub model_name: Option<String>,
    pub style: BTreeMap<String, String>,
}

#[async_trait]
pub trait StageView: Send + Sync {
    /// Resolves only after the slide animation has fully completed.
    async fn animate(&self, slide: Slide, duration: Duration);
    fn layout(&self, layout: &StageLayout);
    /// Re-anchors tips and menu to the current stage element.
    fn attach_anchors(&self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFrame {
    pub visible: bool,
    pub text: String,
    pub color: String,
    pub loading: bool,
    pub error: bool,
    pub style: BTreeMap<String, String>,
}

pub trait StatusView: Send + Sync {
    fn render(&self, frame: &StatusFrame);
}

pub trait TipsView: Send + Sync {
    fn show(&self, text: &str, priority: i32);
    fn hide(&self);
    fn apply_style(&self, style: &BTreeMap<String, String>);
}
