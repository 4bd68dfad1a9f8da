//! Process-wide runtime state: server phase machine and shutdown wiring.

mod state;

pub use state::{
    ServerPhase, is_shutdown, phase, register_server, set_phase, setup_shutdown_handler,
};
