pub mod cli;
pub mod display;
pub mod engine;
pub mod error;
pub mod exhaustion;
pub mod params;
pub mod summary;
