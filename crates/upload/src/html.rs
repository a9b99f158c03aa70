// Text sanitising for rendered tables and stored comments

use std::sync::OnceLock;

use regex::Regex;

/// Escape text for inclusion in HTML.
pub fn escape(s: &str) -> String {
    if !s.contains(&['&', '<', '>', '"', '\''][..]) {
        return s.to_string();
    }
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Remove markup tags, keeping the text between them.
pub fn strip_tags(s: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| {
        // Tags, comments and unterminated trailing tags
        Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z!?/][^>]*(>|$)").expect("valid tag regex")
    });
    re.replace_all(s, "").into_owned()
}
