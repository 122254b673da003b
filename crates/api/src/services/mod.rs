pub mod account;
pub mod admin;
pub mod assistant;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod guards;
pub mod instructors;
pub mod lessons;
pub mod payments;
pub mod reviews;

#[cfg(test)]
pub mod test_utils;

pub use error::*;
