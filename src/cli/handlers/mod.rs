// src/cli/handlers/mod.rs

pub mod commons;
pub mod config;
pub mod env;
pub mod info;
pub mod run;
pub mod tool;
