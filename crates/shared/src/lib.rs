pub mod domain;
pub mod error;
pub mod events;
pub mod media;

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
