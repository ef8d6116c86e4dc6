use serde::{Deserialize, Serialize};

use crate::domain::Selection;

/// Named lifecycle channels a host page can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventChannel {
    StageSlideIn,
    StageSlideOut,
    Load,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WidgetEvent {
    StageSlideIn,
    StageSlideOut,
    Load {
        selection: Selection,
        model_name: String,
    },
}

impl WidgetEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            Self::StageSlideIn => EventChannel::StageSlideIn,
            Self::StageSlideOut => EventChannel::StageSlideOut,
            Self::Load { .. } => EventChannel::Load,
        }
    }
}
