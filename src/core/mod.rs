//! Service plumbing: forecast runtime, scheduler and HTTP API

pub mod http;
pub mod runtime;
pub mod scheduler;

pub use http::*;
pub use runtime::*;
pub use scheduler::*;
