// Container engine integration: CLI selection, inspect parsing, logs

pub mod compose;
pub mod container;
pub mod logs;

pub use compose::ComposeProgram;
pub use container::{ContainerRecord, PortBinding};
