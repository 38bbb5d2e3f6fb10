//! Browser extension store clients and submission orchestration for Skylift
//!
//! This crate uploads extension ZIPs to the browser vendors' stores, waits
//! for their validation, and submits the result for review.
//!
//! ## Supported Stores
//!
//! - **Chrome**: Chrome Web Store (API v2 and v1.1)
//! - **Firefox**: addons.mozilla.org (API v5)
//! - **Edge**: Microsoft Edge Add-ons (API 1.0 and 1.1)
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use skylift_stores::{submit, HttpAdapterFactory, TracingReporter};
//!
//! let factory = HttpAdapterFactory::new(config.poll)?;
//! let results = submit(&config, &factory, Arc::new(TracingReporter)).await?;
//! let failures = skylift_stores::failure_count(&results);
//! ```

pub mod error;
pub mod http;
pub mod poll;
pub mod registry;
pub mod status;
pub mod submit;
pub mod traits;
pub mod types;

pub mod chrome;
pub mod edge;
pub mod firefox;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, StoreError, SubmitError};
pub use poll::PollOptions;
pub use registry::{HttpAdapterFactory, StoreRegistry};
pub use status::{CollectingReporter, ReporterSet, StatusSink, SubmitEvent, SubmitReporter, TracingReporter};
pub use submit::{run_all, submit};
pub use traits::{AdapterFactory, StoreAdapter};
pub use types::*;
