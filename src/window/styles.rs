use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `url(` followed by an optional quote and a root-relative path.
/// Protocol-relative `//host/...` urls are left alone.
static ROOT_RELATIVE_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"url\((\s*["']?)/([^/])"#).ok());

/// One stylesheet of the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    /// Source of a linked sheet.
    pub href: Option<String>,
    /// Serialized rules, `None` when the platform refuses access (cross-origin sheets).
    pub rules: Option<Vec<String>>,
}

impl StyleSheet {
    pub fn inline(rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            href: None,
            rules: Some(rules.into_iter().map(Into::into).collect()),
        }
    }

    pub fn linked(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            rules: None,
        }
    }
}

/// Snapshot of the host document taken when the popup opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostDocument {
    pub origin: String,
    pub pathname: String,
    pub stylesheets: Vec<StyleSheet>,
}

/// A style element to declare in the popup's document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleImport {
    Inline { rules: Vec<String> },
    Linked { href: String },
}

/// Export the host's style rules for the popup.
///
/// Readable sheets are cloned rule by rule with root-relative `url(...)` paths
/// anchored at the host's origin and path. Unreadable sheets are re-declared
/// by reference.
pub fn export_styles(document: &HostDocument) -> Vec<StyleImport> {
    let base = format!("{}{}", document.origin, document.pathname);
    document
        .stylesheets
        .iter()
        .filter_map(|sheet| match (&sheet.rules, &sheet.href) {
            (Some(rules), _) => Some(StyleImport::Inline {
                rules: rules.iter().map(|rule| absolutize_urls(rule, &base)).collect(),
            }),
            (None, Some(href)) => Some(StyleImport::Linked { href: href.clone() }),
            (None, None) => None,
        })
        .collect()
}

/// Rewrite `url("/path")` to `url("{base}path")`.
pub fn absolutize_urls(rule: &str, base: &str) -> String {
    let Some(pattern) = ROOT_RELATIVE_URL.as_ref() else {
        return rule.to_string();
    };
    pattern
        .replace_all(rule, |caps: &Captures<'_>| {
            format!("url({}{}{}", &caps[1], base, &caps[2])
        })
        .into_owned()
}
