//! Campaign identity and the final dispatch result.
//!
//! An identity is created before the loop starts so that log lines can carry
//! the campaign id and slug; it is finalized into a `CampaignDispatchResult`
//! once every contact has been processed.

use crate::campaign::dispatch::DispatchSummary;
use chrono::{DateTime, Utc};
use common::model::campaign::CampaignDispatchResult;
use common::model::contact::ContactRow;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Slug used when a campaign name has no usable characters.
pub const FALLBACK_SLUG: &str = "campaign";

/// Number of id characters appended to the slug.
const SUFFIX_LEN: usize = 8;

/// Combining diacritical marks left behind by NFKD decomposition.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Lower-cased, hyphen-separated form of `name`, or `"campaign"` when nothing
/// is left.
///
/// Accented Latin letters lose their accents (`Café` becomes `cafe`); every
/// other character outside `[a-z0-9]` separates words and is dropped, so names
/// written only in other scripts or symbols fall back.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .nfkd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect();

    let slug = folded
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Location of the JSONL log for a campaign slug.
pub fn log_location(log_root: &Path, slug: &str) -> PathBuf {
    log_root.join(format!("{}.log", slug))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignIdentity {
    pub id: String,
    /// `<slugified name>-<first 8 characters of id>`, unique per dispatch.
    pub slug: String,
    pub name: String,
    pub total_recipients: usize,
    pub started_at: DateTime<Utc>,
    pub log_location: PathBuf,
}

impl CampaignIdentity {
    pub fn new(
        name: &str,
        contacts: &[ContactRow],
        started_at: DateTime<Utc>,
        log_root: &Path,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let slug = format!("{}-{}", slugify(name), &id[..SUFFIX_LEN]);
        let log_location = log_location(log_root, &slug);

        Self {
            id,
            slug,
            name: name.to_string(),
            total_recipients: contacts.len(),
            started_at,
            log_location,
        }
    }

    pub fn finalize(
        &self,
        summary: DispatchSummary,
        completed_at: DateTime<Utc>,
    ) -> CampaignDispatchResult {
        CampaignDispatchResult {
            campaign_id: self.id.clone(),
            campaign_slug: self.slug.clone(),
            sent_count: summary.sent,
            failed_count: summary.failed,
            completed_at,
            log_location: self.log_location.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Q1 2025 Product Launch!!", "q1-2025-product-launch")]
    #[case("  --Hello   World--  ", "hello-world")]
    #[case("Café Crème", "cafe-creme")]
    #[case("Año Nuevo", "ano-nuevo")]
    #[case("already-a-slug", "already-a-slug")]
    #[case("", "campaign")]
    #[case("!!!", "campaign")]
    #[case("Привет", "campaign")]
    #[case("東京", "campaign")]
    #[case("🚀 Launch", "launch")]
    #[case("Straße Sale", "stra-e-sale")]
    #[case("Ｑ１ Ｒｅｐｏｒｔ", "q1-report")]
    fn slugifies_campaign_names(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slugify(name), expected);
    }

    #[test]
    fn slug_has_no_leading_trailing_or_repeated_hyphens() {
        let slug = slugify("--Big   --  Sale ?? 50% off--");

        assert!(!slug.starts_with('-'));
        assert!(!slug.ends_with('-'));
        assert!(!slug.contains("--"));
        assert_eq!(slug, slug.to_lowercase());
    }

    #[test]
    fn identity_slug_is_unique_for_repeated_names() {
        let root = Path::new("logs/campaigns");
        let first = CampaignIdentity::new("Newsletter", &[], Utc::now(), root);
        let second = CampaignIdentity::new("Newsletter", &[], Utc::now(), root);

        assert_ne!(first.id, second.id);
        assert_ne!(first.slug, second.slug);
        assert!(first.slug.starts_with("newsletter-"));
        assert_eq!(first.slug.len(), "newsletter-".len() + SUFFIX_LEN);
        assert!(first.id.starts_with(&first.slug["newsletter-".len()..]));
    }

    #[test]
    fn log_location_derives_from_slug_only() {
        let root = Path::new("logs/campaigns");
        let identity = CampaignIdentity::new("Launch", &[], Utc::now(), root);

        assert_eq!(identity.log_location, log_location(root, &identity.slug));
        assert_eq!(
            identity.log_location,
            PathBuf::from(format!("logs/campaigns/{}.log", identity.slug))
        );
    }

    #[test]
    fn finalize_copies_counts_and_identifiers() {
        let contacts: Vec<ContactRow> = vec![ContactRow::new(); 3];
        let identity = CampaignIdentity::new("Launch", &contacts, Utc::now(), Path::new("logs"));
        let completed_at = Utc::now();

        let result = identity.finalize(DispatchSummary { sent: 2, failed: 1 }, completed_at);

        assert_eq!(identity.total_recipients, 3);
        assert_eq!(result.campaign_id, identity.id);
        assert_eq!(result.campaign_slug, identity.slug);
        assert_eq!(result.sent_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.completed_at, completed_at);
        assert_eq!(result.log_location, identity.log_location.to_string_lossy());
    }
}
