pub mod config;
pub mod console;
pub mod ding;
pub mod runner;
