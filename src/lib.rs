pub mod actions;
pub mod config_files;
pub mod logging;
pub mod settings;
pub mod signs;
