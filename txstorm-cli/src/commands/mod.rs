pub mod config;
pub mod run;

pub use config::{handle_config_generate, handle_config_validate};
pub use run::handle_run;
