// src/applications/handlers/mod.rs

pub mod applications;
pub mod import;
