pub mod client;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod hex;
pub mod legion;
pub mod moves;
pub mod occupancy;
pub mod pathfinding;
pub mod render;
pub mod rng;
pub mod turn_log;
pub mod types;
pub mod world;
