//! Attachment staging and per-recipient resolution.
//!
//! Uploaded files are written once into a temporary directory before the send
//! loop starts and are only read while it runs. The directory is removed when
//! the `StagedFiles` value is released or dropped, whatever the outcome of the
//! dispatch.
//!
//! For each contact the final attachment list is: every broadcast attachment
//! in upload order, then, when custom rules are enabled, one file per rule
//! whose rendered pattern names an uploaded file, in rule order.

use crate::campaign::render::render;
use common::model::attachment::{AttachmentDescriptor, AttachmentMode, AttachmentRule};
use common::model::contact::ContactRow;
use log::warn;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tempfile::TempDir;
use thiserror::Error;

/// Name → content association for the files uploaded with a campaign.
pub trait FileLookup: Send + Sync {
    /// Content of the file called `name`, or `None` when it is not available.
    fn content(&self, name: &str) -> Option<Vec<u8>>;
}

impl FileLookup for HashMap<String, Vec<u8>> {
    fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// The attachment configuration of one campaign, shared by all contacts.
#[derive(Debug, Clone, Default)]
pub struct AttachmentPlan {
    broadcast: Vec<AttachmentDescriptor>,
    custom_enabled: bool,
    rules: Vec<AttachmentRule>,
}

impl AttachmentPlan {
    pub fn new(
        attachments: &[AttachmentDescriptor],
        custom_enabled: bool,
        rules: &[AttachmentRule],
    ) -> Self {
        Self {
            broadcast: attachments
                .iter()
                .filter(|a| a.mode == AttachmentMode::Broadcast)
                .cloned()
                .collect(),
            custom_enabled,
            rules: rules.to_vec(),
        }
    }

    pub fn resolve(&self, contact: &ContactRow, files: &dyn FileLookup) -> Vec<ResolvedAttachment> {
        resolve_attachments(contact, &self.broadcast, self.custom_enabled, &self.rules, files)
    }
}

/// Computes the ordered attachment list for one contact.
///
/// Personalized descriptors in `attachments` are ignored here; those files are
/// only reachable through `rules`. Files whose content cannot be found are
/// skipped. Two rules rendering to the same name attach the file twice.
pub fn resolve_attachments(
    contact: &ContactRow,
    attachments: &[AttachmentDescriptor],
    custom_enabled: bool,
    rules: &[AttachmentRule],
    files: &dyn FileLookup,
) -> Vec<ResolvedAttachment> {
    let broadcast = attachments
        .iter()
        .filter(|a| a.mode == AttachmentMode::Broadcast)
        .filter_map(|a| {
            files.content(&a.file_name).map(|content| ResolvedAttachment {
                filename: a.file_name.clone(),
                content,
            })
        });

    let mut resolved: Vec<ResolvedAttachment> = broadcast.collect();
    if !custom_enabled {
        return resolved;
    }

    for rule in rules {
        let expected = render(&rule.pattern, contact);
        if let Some(content) = files.content(&expected) {
            resolved.push(ResolvedAttachment {
                filename: expected,
                content,
            });
        }
    }
    resolved
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("invalid attachment file name: {0:?}")]
    InvalidName(String),
    #[error("failed to stage attachment: {0}")]
    Io(#[from] io::Error),
}

/// Uploaded attachment files held on disk for the duration of one dispatch.
#[derive(Debug)]
pub struct StagedFiles {
    dir: TempDir,
    files: HashMap<String, PathBuf>,
}

impl StagedFiles {
    pub fn new() -> Result<Self, StagingError> {
        let dir = tempfile::Builder::new().prefix("kampaign-").tempdir()?;
        Ok(Self {
            dir,
            files: HashMap::new(),
        })
    }

    /// Opens a writer for the upload called `name`. A second upload with the
    /// same name replaces the first.
    pub fn create(&mut self, name: &str) -> Result<BufWriter<File>, StagingError> {
        if !is_plain_file_name(name) {
            return Err(StagingError::InvalidName(name.to_string()));
        }
        let path = self.dir.path().join(name);
        let file = File::create(&path)?;
        self.files.insert(name.to_string(), path);
        Ok(BufWriter::new(file))
    }

    pub fn stage(&mut self, name: &str, content: &[u8]) -> Result<(), StagingError> {
        use std::io::Write;

        let mut writer = self.create(name)?;
        writer.write_all(content)?;
        writer.flush()?;
        Ok(())
    }

    /// Size in bytes of a staged file.
    pub fn size(&self, name: &str) -> Option<u64> {
        let path = self.files.get(name)?;
        fs::metadata(path).ok().map(|m| m.len())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Deletes every staged file.
    pub fn release(self) -> io::Result<()> {
        self.dir.close()
    }
}

impl FileLookup for StagedFiles {
    fn content(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.files.get(name)?;
        match fs::read(path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!("Staged attachment {} could not be read: {}", name, e);
                None
            }
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
