// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod conveyor;
pub mod device;
pub mod engine;
pub mod evaluation;
pub mod game_state;
pub mod landmarks;
pub mod logging;
pub mod rating;
pub mod rating_flash;
pub mod results;
pub mod round_clock;
pub mod runtime;
pub mod score;
pub mod signer;
pub mod song;
pub mod util;
