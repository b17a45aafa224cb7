pub mod event;
pub mod level;
pub mod progress;
pub mod step;
pub mod store;
pub mod world;
