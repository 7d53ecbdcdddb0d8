// src/profile/mod.rs

pub mod handlers;
pub mod merger;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use merger::{merge_profile, ExtractedProfileFields, ProfileFields};
pub use routes::profile_routes;
