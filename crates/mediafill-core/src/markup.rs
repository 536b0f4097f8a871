//! Rich markup scanning
//!
//! Finds `ATTR="id"` (or `ATTR='id'`) occurrences in markup and rewrites the
//! resolved ones to `src="url"`. Scanning is attribute-based, not a parse:
//! the tag carrying the attribute is irrelevant.

use crate::error::ConfigError;
use crate::resolver::ResolutionMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Marker attribute recognized when none is configured
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-ref";

static DEFAULT_SCANNER: Lazy<MarkupScanner> = Lazy::new(|| MarkupScanner {
    attribute: DEFAULT_MARKER_ATTRIBUTE.to_owned(),
    pattern: Regex::new(&pattern_for(DEFAULT_MARKER_ATTRIBUTE))
        .expect("default marker pattern should compile"),
});

fn pattern_for(attribute: &str) -> String {
    format!(r#"{}=["']([^"']+)["']"#, regex::escape(attribute))
}

/// Compiled scanner for one marker attribute
#[derive(Debug, Clone)]
pub struct MarkupScanner {
    attribute: String,
    pattern: Regex,
}

impl Default for MarkupScanner {
    fn default() -> Self {
        DEFAULT_SCANNER.clone()
    }
}

impl MarkupScanner {
    /// Scanner for `attribute`
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidMarkerAttribute`] for an empty attribute name.
    pub fn new(attribute: &str) -> Result<Self, ConfigError> {
        if attribute.is_empty() {
            return Err(ConfigError::InvalidMarkerAttribute(attribute.to_owned()));
        }
        Ok(Self {
            attribute: attribute.to_owned(),
            pattern: Regex::new(&pattern_for(attribute))?,
        })
    }

    /// Recognized attribute name
    #[inline]
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Identifiers referenced by `text`, in order of appearance
    pub fn identifiers<'s, 't: 's>(&'s self, text: &'t str) -> impl Iterator<Item = &'t str> + 's {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|id| id.as_str()))
    }

    /// Replace each successfully resolved occurrence with `src="url"`
    ///
    /// Unresolved or failed occurrences are left byte-for-byte unchanged;
    /// text without any replacement is returned borrowed.
    pub fn rewrite<'t>(&self, text: &'t str, resolutions: &ResolutionMap) -> Cow<'t, str> {
        self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let resolved = caps
                .get(1)
                .and_then(|id| resolutions.get(id.as_str()))
                .filter(|record| record.success);
            match resolved {
                Some(record) => format!(r#"src="{}""#, record.url),
                None => caps[0].to_owned(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolutionRecord;
    use pretty_assertions::assert_eq;

    fn resolutions() -> ResolutionMap {
        ResolutionMap::from([
            ("img1".to_owned(), ResolutionRecord::resolved("https://cdn/a.png")),
            ("vid1".to_owned(), ResolutionRecord::failed()),
        ])
    }

    #[test]
    fn identifiers_in_order_with_either_quote() {
        let scanner = MarkupScanner::default();
        let text = r#"<img data-ref="a"><video data-ref='b'></video><img data-ref="a">"#;
        let ids: Vec<&str> = scanner.identifiers(text).collect();
        assert_eq!(ids, vec!["a", "b", "a"]);
    }

    #[test]
    fn identifiers_outlive_the_scanner() {
        let text = String::from(r#"<img data-helf="kept">"#);
        let ids: Vec<&str> = {
            let scanner = MarkupScanner::new("data-helf").unwrap();
            scanner.identifiers(&text).collect()
        };
        assert_eq!(ids, vec!["kept"]);
    }

    #[test]
    fn rewrite_replaces_only_successful_resolutions() {
        let scanner = MarkupScanner::default();
        let text = r#"<p>x</p><img data-ref="img1"><video data-ref="vid1"></video><i data-ref="zz">"#;
        assert_eq!(
            scanner.rewrite(text, &resolutions()),
            r#"<p>x</p><img src="https://cdn/a.png"><video data-ref="vid1"></video><i data-ref="zz">"#
        );
    }

    #[test]
    fn untouched_text_is_borrowed() {
        let scanner = MarkupScanner::default();
        let text = "<p>plain</p>";
        assert!(matches!(scanner.rewrite(text, &resolutions()), Cow::Borrowed(_)));
        assert_eq!(scanner.identifiers("data-ref=\"\"").count(), 0);
    }

    #[test]
    fn custom_attribute_is_escaped() {
        let scanner = MarkupScanner::new("data-helf").unwrap();
        assert_eq!(scanner.attribute(), "data-helf");
        let ids: Vec<&str> = scanner
            .identifiers(r#"<img data-helf="rich"><img data-ref="other">"#)
            .collect();
        assert_eq!(ids, vec!["rich"]);

        let dotted = MarkupScanner::new("x.ref").unwrap();
        assert_eq!(dotted.identifiers(r#"xaref="no" x.ref="yes""#).collect::<Vec<_>>(), vec!["yes"]);
    }

    #[test]
    fn empty_attribute_is_rejected() {
        assert!(matches!(
            MarkupScanner::new(""),
            Err(ConfigError::InvalidMarkerAttribute(_))
        ));
    }
}
