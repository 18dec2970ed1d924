pub mod branch;
pub mod config;
pub mod credentials;
pub mod git;
pub mod linear;
pub mod tui;
