pub mod args;
mod r#impl;
mod structs;
pub mod validators;

pub use r#impl::{get_config, init_config_from};
pub use structs::*;
pub use validators::validate_config;
