pub mod cli;
pub mod commands;
pub mod compare;
pub mod database;
pub mod fingerprint;
pub mod utils;
