//! Beacon Runner: an on-line learning agent that explores a raster arena,
//! avoids walls and chases beacons, trained one backprop step per tick.

pub mod agent;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod history;
pub mod monitor;
pub mod network;
pub mod reward;
pub mod sensor;
pub mod simulation;
pub mod sweep;
pub mod utils;
pub mod world;

pub use agent::{Agent, AgentState, PerformanceMetrics};
pub use config::SimConfig;
pub use error::{CoreError, NetworkError, Result};
pub use network::{Network, NetworkState, StateImport, TrainingSample};
pub use simulation::Simulation;
pub use world::{Action, World};
