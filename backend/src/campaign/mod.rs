//! # Campaign Dispatch Engine
//!
//! Everything needed to turn one campaign request into one message per
//! contact:
//!
//! - `render`: `{placeholder}` substitution against a contact row.
//! - `attachments`: staging of uploaded files and per-contact resolution of
//!   broadcast and rule-matched attachments.
//! - `transport`: the `MailTransport` seam (SMTP via lettre, or a dry-run
//!   transport that only logs).
//! - `dispatch`: the sequential send loop producing one `RecipientOutcome` per
//!   contact.
//! - `logbook`: JSONL persistence of outcomes and progress reporting.
//! - `record`: campaign identifiers, slugs and the final dispatch result.
//! - `validate`: the pre-flight gate run before any contact is processed.
//!
//! The HTTP layer in `services::campaign` wires these together.

pub mod attachments;
pub mod dispatch;
pub mod logbook;
pub mod record;
pub mod render;
pub mod transport;
pub mod validate;
