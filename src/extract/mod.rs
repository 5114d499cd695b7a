//! Email and phone extraction engine
//!
//! Extracts and validates email addresses and phone numbers from page
//! content. Validation filters placeholder addresses, auto-sender prefixes,
//! and strings that only look like emails (asset filenames, for instance).

use crate::config::ExtractionConfig;
use regex::Regex;
use std::collections::HashSet;

/// File extensions that disqualify an email-shaped match
///
/// Prevents matches like `image.jpg@2x.png` from srcset attributes.
const FILE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".bmp", ".ico", ".pdf", ".doc", ".docx",
    ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar", ".gz", ".mp4", ".avi", ".mov",
    ".mp3", ".wav", ".css", ".js", ".html", ".xml", ".json", ".txt", ".woff", ".woff2", ".ttf",
    ".eot",
];

/// Contact pattern matcher with per-run validation settings
pub struct ContactExtractor {
    email_pattern: Regex,
    mailto_pattern: Regex,
    phone_pattern: Regex,
    script_pattern: Regex,
    style_pattern: Regex,
    tag_pattern: Regex,
    min_email_length: usize,
    max_email_length: usize,
    excluded_patterns: Vec<String>,
}

impl ContactExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            email_pattern: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("email pattern is valid"),
            mailto_pattern: Regex::new(
                r"(?i)mailto:([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})",
            )
            .expect("mailto pattern is valid"),
            // Optional country code, area code, prefix, line, optional extension
            phone_pattern: Regex::new(
                r"(?:(?:\+|00)([1-9]\d{0,2}))?[-. (]*(\d{3})[-. )]*(\d{3})[-. ]*(\d{4})(?: *x(\d+))?",
            )
            .expect("phone pattern is valid"),
            script_pattern: Regex::new(r"(?is)<script[^>]*>.*?</script>")
                .expect("script pattern is valid"),
            style_pattern: Regex::new(r"(?is)<style[^>]*>.*?</style>")
                .expect("style pattern is valid"),
            tag_pattern: Regex::new(r"<[^>]+>").expect("tag pattern is valid"),
            min_email_length: config.min_email_length,
            max_email_length: config.max_email_length,
            excluded_patterns: config.excluded_patterns.clone(),
        }
    }

    /// Extracts emails and phones from raw HTML content
    ///
    /// mailto: links are harvested from the raw markup; plain-text matching
    /// runs after script and style blocks are stripped.
    pub fn extract_from_html(&self, html: &str) -> (Vec<String>, Vec<String>) {
        let without_scripts = self.script_pattern.replace_all(html, " ");
        let without_styles = self.style_pattern.replace_all(&without_scripts, " ");
        let text = self.tag_pattern.replace_all(&without_styles, " ");

        let mut emails = Vec::new();
        for capture in self.mailto_pattern.captures_iter(html) {
            if let Some(address) = capture.get(1) {
                emails.push(address.as_str().to_string());
            }
        }
        emails.extend(self.extract_emails(&text));

        let emails = dedup_preserving_order(
            emails
                .into_iter()
                .filter(|e| self.is_valid_email(e))
                .map(|e| e.to_lowercase()),
        );

        let phones = self.extract_phones(&text);

        (emails, phones)
    }

    /// Extracts validated, lowercased email addresses from plain text
    pub fn extract_emails(&self, text: &str) -> Vec<String> {
        dedup_preserving_order(
            self.email_pattern
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .filter(|e| self.is_valid_email(e))
                .map(|e| e.to_lowercase()),
        )
    }

    /// Extracts phone numbers from plain text
    ///
    /// Matched groups are rejoined with `-`; matches with fewer than 10
    /// digits are dropped to avoid picking up dates and IDs.
    pub fn extract_phones(&self, text: &str) -> Vec<String> {
        let mut phones = Vec::new();

        for capture in self.phone_pattern.captures_iter(text) {
            let parts: Vec<&str> = (1..=5)
                .filter_map(|i| capture.get(i))
                .map(|m| m.as_str())
                .collect();

            // At least area code, prefix, and line
            if parts.len() < 3 {
                continue;
            }

            let phone = parts.join("-");
            let digit_count = phone.chars().filter(|c| c.is_ascii_digit()).count();
            if digit_count >= 10 {
                phones.push(phone);
            }
        }

        dedup_preserving_order(phones.into_iter())
    }

    /// Validates an email address candidate
    pub fn is_valid_email(&self, email: &str) -> bool {
        if email.len() < self.min_email_length || email.len() > self.max_email_length {
            return false;
        }

        let lowered = email.to_lowercase();
        if self
            .excluded_patterns
            .iter()
            .any(|pattern| lowered.contains(pattern.as_str()))
        {
            return false;
        }

        if email.matches('@').count() != 1 {
            return false;
        }

        if email.contains("..") || email.starts_with('.') || email.ends_with('.') {
            return false;
        }

        let (local, domain) = match lowered.split_once('@') {
            Some(parts) => parts,
            None => return false,
        };

        if local.is_empty() || !domain.contains('.') {
            return false;
        }

        // Asset filenames masquerading as addresses
        if FILE_EXTENSIONS
            .iter()
            .any(|ext| local.ends_with(ext) || domain.ends_with(ext))
        {
            return false;
        }

        true
    }
}

/// Extracts the domain portion of an email address
pub fn email_domain(email: &str) -> Option<String> {
    email
        .split_once('@')
        .map(|(_, domain)| domain.to_lowercase())
}

fn dedup_preserving_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn extractor() -> ContactExtractor {
        ContactExtractor::new(&ExtractionConfig::default())
    }

    #[test]
    fn test_extract_simple_email() {
        let emails = extractor().extract_emails("Reach us at sales@acme.io today");
        assert_eq!(emails, vec!["sales@acme.io"]);
    }

    #[test]
    fn test_emails_lowercased_and_deduped() {
        let emails = extractor().extract_emails("Sales@Acme.io and sales@acme.io");
        assert_eq!(emails, vec!["sales@acme.io"]);
    }

    #[test]
    fn test_placeholder_emails_rejected() {
        let ex = extractor();
        assert!(!ex.is_valid_email("info@example.com"));
        assert!(!ex.is_valid_email("noreply@acme.io"));
        assert!(!ex.is_valid_email("no-reply@acme.io"));
    }

    #[test]
    fn test_filename_emails_rejected() {
        let ex = extractor();
        assert!(!ex.is_valid_email("logo.png@acme.io"));
        assert!(!ex.is_valid_email("user@image.jpeg"));
    }

    #[test]
    fn test_structural_email_checks() {
        let ex = extractor();
        assert!(!ex.is_valid_email("a@b.c")); // below minimum length
        assert!(!ex.is_valid_email("double..dot@acme.io"));
        assert!(!ex.is_valid_email(".leading@acme.io"));
    }

    #[test]
    fn test_mailto_harvested_from_markup() {
        let html = r#"<a href="mailto:Owner@Acme.io">contact</a>"#;
        let (emails, _) = extractor().extract_from_html(html);
        assert_eq!(emails, vec!["owner@acme.io"]);
    }

    #[test]
    fn test_script_content_ignored() {
        let html = r#"<script>var e = "tracker@acme.io";</script><p>hello</p>"#;
        let (emails, _) = extractor().extract_from_html(html);
        assert!(emails.is_empty());
    }

    #[test]
    fn test_extract_us_phone_formats() {
        let ex = extractor();
        assert_eq!(ex.extract_phones("Call (555) 555-0123 now"), vec!["555-555-0123"]);
        assert_eq!(ex.extract_phones("+1 555 555 0199"), vec!["1-555-555-0199"]);
    }

    #[test]
    fn test_phone_extension_captured() {
        let phones = extractor().extract_phones("Office: 555-555-0123 x42");
        assert_eq!(phones, vec!["555-555-0123-42"]);
    }

    #[test]
    fn test_short_digit_runs_rejected() {
        assert!(extractor().extract_phones("Room 101, floor 3").is_empty());
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("Sales@Acme.IO"), Some("acme.io".to_string()));
        assert_eq!(email_domain("not-an-email"), None);
    }
}
