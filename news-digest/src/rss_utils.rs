//! Helpers shared by the fetcher, summarizer and composer

/// Slug used when a column name normalizes to nothing
pub const DEFAULT_SLUG: &str = "news";

/// Punctuation removed from column names before they become file names
const SLUG_STRIPPED: &[char] = &[
    '，', '、', '。', '！', '？', '：', '；', '“', '”', '"', '\'', '`',
];

/// Normalize a column name into a filesystem-safe slug.
///
/// Whitespace runs and slash runs become single hyphens, a fixed set of
/// punctuation is dropped, hyphens are trimmed from both ends and the result
/// is lower-cased. Non-ASCII letters are kept as they are.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.trim().chars() {
        if SLUG_STRIPPED.contains(&c) {
            continue;
        }
        if c.is_whitespace() || c == '/' || c == '\\' {
            pending_hyphen = true;
            continue;
        }
        if pending_hyphen {
            slug.push('-');
            pending_hyphen = false;
        }
        slug.extend(c.to_lowercase());
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() || slug.chars().all(|c| c == '.') {
        DEFAULT_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Text processing utilities
pub mod text {
    /// Collapse every whitespace run into a single space and trim.
    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Keep at most `max_chars` characters. Never splits a character.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_index, _)) => text[..byte_index].to_string(),
            None => text.to_string(),
        }
    }

    /// Remove markup tags and decode the handful of entities feeds commonly
    /// leave in summaries.
    pub fn strip_html(text: &str) -> String {
        let mut plain = String::with_capacity(text.len());
        let mut in_tag = false;

        for c in text.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    plain.push(' ');
                }
                _ if !in_tag => plain.push(c),
                _ => {}
            }
        }

        plain
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    /// Drop `<think>...</think>` blocks some reasoning models prepend to
    /// their answer, then trim.
    pub fn strip_reasoning(text: &str) -> String {
        let mut rest = text;
        let mut cleaned = String::with_capacity(text.len());

        while let Some(start) = rest.find("<think>") {
            cleaned.push_str(&rest[..start]);
            match rest[start..].find("</think>") {
                Some(end) => rest = &rest[start + end + "</think>".len()..],
                None => {
                    rest = "";
                }
            }
        }
        cleaned.push_str(rest);

        cleaned.trim().to_string()
    }
}

/// URL utilities for RSS feeds
pub mod url {
    use url::Url;

    /// Validate RSS feed URL format
    pub fn is_valid_rss_url(url_str: &str) -> bool {
        if let Ok(url) = Url::parse(url_str) {
            url.scheme() == "http" || url.scheme() == "https"
        } else {
            false
        }
    }
}

/// Time formatting used in file names and front matter
pub mod time {
    use chrono::{DateTime, TimeZone};

    /// `YYYY-MM-DD`, the date part of every output file name.
    pub fn file_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        at.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD HH:mm`, the front matter `date` value.
    pub fn front_matter_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        at.format("%Y-%m-%d %H:%M").to_string()
    }

    /// `HHmm`, the time-of-day suffix of dump file names.
    pub fn hour_minute<Tz: TimeZone>(at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        at.format("%H%M").to_string()
    }
}
