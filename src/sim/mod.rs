pub mod event;
pub mod level;
pub mod observer;
pub mod step;
pub mod world;
