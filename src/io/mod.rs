pub mod config_io;
pub mod history_io;
pub mod lock;
pub mod project_io;
pub mod store_io;
