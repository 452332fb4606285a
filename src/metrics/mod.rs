//! Descriptive port metrics.
//!
//! Each calculator validates its dataset before any arithmetic, logs the
//! statistics it computes, and logs then returns any failure.

pub mod dwell;
pub mod eoq;
pub mod occupancy;
pub mod turnaround;
pub mod utility;
