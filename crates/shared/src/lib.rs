pub mod domain;
pub mod events;
pub mod options;
