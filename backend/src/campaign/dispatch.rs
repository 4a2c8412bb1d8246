//! # Dispatch Loop
//!
//! Sends one message per contact, strictly in input order and one at a time.
//! For each contact the loop:
//!
//! 1. renders subject and body,
//! 2. resolves the attachment list,
//! 3. reads the recipient address from the recipient column,
//! 4. awaits the transport,
//! 5. classifies the result as sent or failed,
//! 6. hands the outcome to the sink before moving to the next contact.
//!
//! A failing contact never stops the loop and nothing is retried here. The
//! counters in `DispatchSummary` are derived from the outcome list afterwards.

use crate::campaign::attachments::{AttachmentPlan, FileLookup};
use crate::campaign::logbook::OutcomeSink;
use crate::campaign::render::render;
use crate::campaign::transport::{MailTransport, OutgoingMessage, SendReceipt, TransportError};
use chrono::Utc;
use common::model::contact::ContactRow;
use common::model::outcome::{Outcome, RecipientOutcome};
use log::{info, warn};
use serde::Serialize;

/// Everything the loop needs besides its collaborators.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub contacts: &'a [ContactRow],
    pub subject: &'a str,
    pub body: &'a str,
    pub recipient_header: &'a str,
    pub sender: &'a str,
    pub attachments: &'a AttachmentPlan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[RecipientOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |summary, entry| {
            if entry.outcome.is_sent() {
                Self {
                    sent: summary.sent + 1,
                    ..summary
                }
            } else {
                Self {
                    failed: summary.failed + 1,
                    ..summary
                }
            }
        })
    }

    pub fn total(&self) -> usize {
        self.sent + self.failed
    }
}

/// Runs the send loop over every contact and returns the outcomes in contact
/// order. Always yields exactly one outcome per contact.
pub async fn dispatch(
    request: &DispatchRequest<'_>,
    files: &dyn FileLookup,
    transport: &dyn MailTransport,
    sink: &mut dyn OutcomeSink,
) -> Vec<RecipientOutcome> {
    let total = request.contacts.len();
    let mut outcomes = Vec::with_capacity(total);

    for (position, contact) in request.contacts.iter().enumerate() {
        let outcome = deliver(request, contact, files, transport).await;

        match &outcome.outcome {
            Outcome::Sent { .. } => info!("[{}/{}] sent to {}", position + 1, total, outcome.recipient),
            Outcome::Failed { error, .. } => warn!(
                "[{}/{}] delivery to {:?} failed: {}",
                position + 1,
                total,
                outcome.recipient,
                error
            ),
        }
        if let Err(e) = sink.record(position, total, &outcome).await {
            warn!("Could not record outcome for {:?}: {}", outcome.recipient, e);
        }
        outcomes.push(outcome);
    }

    outcomes
}

async fn deliver(
    request: &DispatchRequest<'_>,
    contact: &ContactRow,
    files: &dyn FileLookup,
    transport: &dyn MailTransport,
) -> RecipientOutcome {
    let attachments = request.attachments.resolve(contact, files);
    let names: Vec<String> = attachments.iter().map(|a| a.filename.clone()).collect();
    let recipient = contact.text(request.recipient_header).unwrap_or_default();

    let message = OutgoingMessage {
        from: request.sender.to_string(),
        to: recipient.clone(),
        subject: render(request.subject, contact),
        html: render(request.body, contact),
        attachments,
    };
    let result = transport.send(&message).await;

    RecipientOutcome {
        outcome: classify(&recipient, result, names),
        recipient,
        timestamp: Utc::now(),
    }
}

/// A thrown error and a receipt listing the recipient as rejected are both
/// failures.
fn classify(
    recipient: &str,
    result: Result<SendReceipt, TransportError>,
    attachments: Vec<String>,
) -> Outcome {
    match result {
        Err(e) => Outcome::Failed {
            attachments,
            error: e.to_string(),
        },
        Ok(receipt) if receipt.rejects(recipient) => Outcome::Failed {
            attachments,
            error: receipt.rejection_reason(),
        },
        Ok(_) => Outcome::Sent { attachments },
    }
}
