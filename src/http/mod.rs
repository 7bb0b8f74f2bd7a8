//! HTTP plumbing shared by the tracker and the dashboard
//!
//! - [`client::ResilientClient`]: JSON request client with a linear
//!   retry policy
//! - [`client::RetryPolicy`]: attempt count and base delay

pub mod client;

pub use client::{ResilientClient, RetryPolicy};
