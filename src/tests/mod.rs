#![warn(clippy::all, clippy::pedantic)]

pub mod challenge_tests;
pub mod shop_tests;
pub mod store_tests;

// Import test utilities
pub mod test_utils;
