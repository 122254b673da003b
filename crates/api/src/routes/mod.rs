pub mod admin;
pub mod assistant;
pub mod auth;
pub mod courses;
pub mod health;
pub mod instructors;
pub mod models;
pub mod payments;
