pub mod error;
pub mod event_bus;
pub mod messages;
pub mod model;
pub mod orchestrator;
pub mod stage;
pub mod status;
pub mod tips;

pub use error::WidgetError;
pub use event_bus::EventBus;
pub use messages::{IdleSource, MessagePool, RemoteWordOfTheDay, WordOfTheDay};
pub use model::ModelManager;
pub use orchestrator::{Orchestrator, WidgetDependencies};
pub use stage::{Stage, StagePhase};
pub use status::{StatusCallback, StatusOverlay};
pub use tips::{IdleState, Tips, TipsConfig};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
