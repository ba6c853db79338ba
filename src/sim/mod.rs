pub mod cave;
pub mod event;
pub mod moves;
pub mod session;
pub mod step;
pub mod world;
