pub mod cli;
pub mod errors;
pub mod loader;

pub use cli::{LayoutArgs, LayoutOutcome, list_machines, run_inspect, run_layout};
pub use errors::FrontendError;
pub use loader::load_decklist;
