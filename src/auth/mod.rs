// src/auth/mod.rs

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::User;
pub use routes::auth_routes;
