// src/admin/handlers/mod.rs

pub mod dashboard;
pub mod invitations;
pub mod settings;
pub mod users;
