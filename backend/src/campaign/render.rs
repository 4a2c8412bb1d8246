use common::model::contact::ContactRow;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// `{key}` where key is any run of characters other than `}`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern compiles"));

/// Substitutes every `{header}` token in `template` with the contact's value.
///
/// Whitespace inside the braces is ignored for lookup. Tokens whose header is
/// missing, or whose value is null or empty, are left in the output verbatim.
/// Substituted values are not scanned again.
pub fn render(template: &str, contact: &ContactRow) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            contact
                .text(caps[1].trim())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedPreview {
    pub subject: String,
    pub html: String,
}

/// Renders subject and body for one contact. Without a contact there is
/// nothing to preview and both parts come back empty.
pub fn preview(subject: &str, body: &str, contact: Option<&ContactRow>) -> RenderedPreview {
    match contact {
        Some(contact) => RenderedPreview {
            subject: render(subject, contact),
            html: render(body, contact),
        },
        None => RenderedPreview::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn contact(pairs: &[(&str, &str)]) -> ContactRow {
        pairs.iter().copied().collect()
    }

    #[rstest]
    #[case::substitutes("Hi {name}!", "Hi Alice!")]
    #[case::trims_inner_whitespace("Hi { name }!", "Hi Alice!")]
    #[case::repeated_tokens("{name} and {name}", "Alice and Alice")]
    #[case::missing_key_kept("Dear {title} {name}", "Dear {title} Alice")]
    #[case::empty_value_kept("Team: {team}", "Team: {team}")]
    #[case::no_tokens("Plain text", "Plain text")]
    #[case::unclosed_brace("Hi {name", "Hi {name")]
    #[case::empty_braces("{}", "{}")]
    #[case::nested_braces("{{name}}", "{{name}}")]
    fn renders_tokens(#[case] template: &str, #[case] expected: &str) {
        let row = contact(&[("name", "Alice"), ("team", "")]);

        assert_eq!(render(template, &row), expected);
    }

    #[test]
    fn null_values_leave_the_token_intact() {
        let row: ContactRow = serde_json::from_str(r#"{"name": null, "seats": 3}"#).unwrap();

        assert_eq!(render("{name} has {seats} seats", &row), "{name} has 3 seats");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let row = contact(&[("name", "{email}"), ("email", "a@x.com")]);

        assert_eq!(render("Hello {name}", &row), "Hello {email}");
    }

    #[test]
    fn per_contact_bodies_differ_only_where_values_exist() {
        let alice = contact(&[("email", "a@x.com"), ("name", "Alice")]);
        let bob = contact(&[("email", "b@x.com"), ("name", "")]);

        assert_eq!(render("Hi {name}!", &alice), "Hi Alice!");
        assert_eq!(render("Hi {name}!", &bob), "Hi {name}!");
    }

    #[test]
    fn preview_without_contact_is_empty() {
        assert_eq!(preview("Hello {name}", "<p>{name}</p>", None), RenderedPreview::default());
    }

    #[test]
    fn preview_renders_subject_and_body() {
        let row = contact(&[("name", "Alice")]);

        let rendered = preview("Hello {name}", "<p>{name}</p>", Some(&row));

        assert_eq!(rendered.subject, "Hello Alice");
        assert_eq!(rendered.html, "<p>Alice</p>");
    }
}
