//! Test Module
//!
//! Test suite for the chat bot core.
//!
//! ## Test Categories
//! - `brain_tests`: classification pipeline over a real feed-forward network
//! - `actor_tests`: ChatBot actor behavior, deadlines and concurrency
//! - `integration_tests`: full deployment on disk, from settings to journal

pub mod fixtures;
pub mod integration_tests;
