pub mod config;
pub mod layout;
pub mod lightbox_toml;
pub mod logger;

pub use config::*;
pub use layout::Layout;
pub use lightbox_toml::{LightboxToml, apply_file_to_settings, load_lightbox_toml};
pub use logger::setup_logging;
