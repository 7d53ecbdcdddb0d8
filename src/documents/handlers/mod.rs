// src/documents/handlers/mod.rs

pub mod documents;
pub mod extraction;
pub mod review;
