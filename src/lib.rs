pub mod cli;
pub mod engine;
pub mod host;
pub mod io;
pub mod logging;
pub mod model;
pub mod ops;
pub mod parse;
pub mod util;
