pub mod capture;
pub mod config;
pub mod error;
pub mod keys;
pub mod output;
pub mod process;
pub mod profile;
pub mod prompt;
pub mod session;
pub mod term;
pub mod ui;

pub use error::*;
