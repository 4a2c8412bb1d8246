//! Data model shared between the Kampaign service and its clients.
//!
//! Everything here is plain serde data: contact rows, attachment metadata,
//! per-recipient outcomes, campaign records, job status and request payloads.

pub mod jobs;
pub mod model;
pub mod requests;
