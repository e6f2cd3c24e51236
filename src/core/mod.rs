// src/core/mod.rs

pub mod catalog;
pub mod paths;
pub mod settings;
pub mod suggest;
pub mod translator;
