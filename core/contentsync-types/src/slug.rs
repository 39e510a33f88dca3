//! Slug and key normalization.
//!
//! Slugs are compared in normalized form on both sides of a sync so that
//! `"About Us"`, `"about-us"` and `"/about-us/"` all name the same item.

/// Normalizes a title or path fragment into a URL slug.
///
/// Lowercases, turns whitespace, `.` and `/` into `-`, drops anything outside
/// `[a-z0-9_-]`, collapses dash runs and trims dashes from both ends.
pub fn normalize_slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = true;

    for c in input.trim().chars().flat_map(char::to_lowercase) {
        let mapped = match c {
            'a'..='z' | '0'..='9' | '_' => Some(c),
            '-' | '.' | '/' => Some('-'),
            c if c.is_whitespace() => Some('-'),
            _ => None,
        };
        match mapped {
            Some('-') => {
                if !last_dash {
                    out.push('-');
                    last_dash = true;
                }
            }
            Some(c) => {
                out.push(c);
                last_dash = false;
            }
            None => {}
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Normalizes an internal key (content type, status): lowercase `[a-z0-9_-]` only.
pub fn sanitize_key(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-'))
        .collect()
}
