//! Model definitions for portal readings and fetch results.
//!
//! This module provides the core data structures passed between the
//! pipeline stages and handed to the consumer at the end of each cycle.

pub mod reading;
pub mod types;

// Re-export commonly used items at the module level
pub use reading::{FetchResult, Reading};
pub use types::{Commodity, Credentials, RawPage};
