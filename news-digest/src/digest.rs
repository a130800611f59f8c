use crate::rss_utils::slugify;
use crate::rss_utils::time::{file_date, front_matter_date};
use crate::types::{DigestConfig, DigestError, DigestSection, FrontMatter, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const INDEX_DIR: &str = ".index";

/// What a compose call did to the digest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    Created { path: PathBuf, sections: usize },
    Appended { path: PathBuf, sections: usize },
    /// Every incoming article is already in the file; nothing was written.
    NothingNew { path: PathBuf },
}

impl ComposeOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created { path, .. } | Self::Appended { path, .. } | Self::NothingNew { path } => {
                path
            }
        }
    }

    pub fn sections_written(&self) -> usize {
        match self {
            Self::Created { sections, .. } | Self::Appended { sections, .. } => *sections,
            Self::NothingNew { .. } => 0,
        }
    }
}

/// Links already emitted into one digest file, stored next to the news
/// directory so re-runs do not depend on parsing Markdown alone.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DigestIndex {
    links: Vec<String>,
}

/// Creates and extends the per-day, per-column Markdown digests.
pub struct DigestComposer {
    config: DigestConfig,
}

impl DigestComposer {
    pub fn new(config: DigestConfig) -> Self {
        Self { config }
    }

    pub fn digest_path(&self, date: &str, slug: &str) -> PathBuf {
        self.config.news_dir.join(format!("{}-{}.md", date, slug))
    }

    fn index_path(&self, date: &str, slug: &str) -> PathBuf {
        self.config
            .news_dir
            .join(INDEX_DIR)
            .join(format!("{}-{}.json", date, slug))
    }

    pub fn front_matter(&self, column: &str, at: &DateTime<Local>) -> FrontMatter {
        FrontMatter {
            date: front_matter_date(at),
            title: self.config.with_title.then(|| column.to_string()),
            author: self.config.author.clone(),
        }
    }

    /// Link keys (see [`link_key`]) already present in the digest for this
    /// column and day. Empty when the file is missing or empty, whatever the
    /// link index says.
    pub fn known_links(&self, column: &str, at: &DateTime<Local>) -> Result<HashSet<String>> {
        let (date, slug) = (file_date(at), slugify(column));
        let path = self.digest_path(&date, &slug);

        let mut known = HashSet::new();
        if let Some(markdown) = read_if_exists(&path)?.filter(|content| !content.is_empty()) {
            known.extend(scan_links(&markdown));
            known.extend(self.read_index(&date, &slug).links);
        }
        Ok(known)
    }

    /// Create the day's digest or append the sections it does not have yet.
    ///
    /// Bytes already in the file are never rewritten. Sections whose link is
    /// already present, or repeated within `sections`, are dropped.
    pub fn compose(
        &self,
        column: &str,
        at: &DateTime<Local>,
        sections: &[DigestSection],
    ) -> Result<ComposeOutcome> {
        let (date, slug) = (file_date(at), slugify(column));
        let path = self.digest_path(&date, &slug);

        let existing = read_if_exists(&path)?.filter(|content| !content.is_empty());

        // The index only describes a digest that is still on disk
        let mut known: HashSet<String> = HashSet::new();
        if let Some(content) = &existing {
            known.extend(self.read_index(&date, &slug).links);
            known.extend(scan_links(content));
        }

        let mut fresh = Vec::new();
        for section in sections {
            let key = link_key(&section.link);
            if known.insert(key.clone()) {
                fresh.push((key, section));
            } else {
                debug!("Already in {}: {}", path.display(), section.link);
            }
        }

        if fresh.is_empty() {
            info!("{}: nothing new to write", path.display());
            return Ok(ComposeOutcome::NothingNew { path });
        }

        let body: String = fresh.iter().map(|(_, section)| render_section(section)).collect();

        let outcome = match existing {
            None => {
                fs::create_dir_all(&self.config.news_dir)
                    .map_err(|e| DigestError::io(&self.config.news_dir, e))?;

                let mut document = render_front_matter(&self.front_matter(column, at));
                document.push_str(&body);
                fs::write(&path, document).map_err(|e| DigestError::io(&path, e))?;

                info!("Created {} with {} articles", path.display(), fresh.len());
                ComposeOutcome::Created {
                    path: path.clone(),
                    sections: fresh.len(),
                }
            }
            Some(content) => {
                let mut addition = String::from(separator_after(&content));
                addition.push_str(&body);

                let mut file = OpenOptions::new()
                    .append(true)
                    .open(&path)
                    .map_err(|e| DigestError::io(&path, e))?;
                file.write_all(addition.as_bytes())
                    .map_err(|e| DigestError::io(&path, e))?;

                info!("Appended {} articles to {}", fresh.len(), path.display());
                ComposeOutcome::Appended {
                    path: path.clone(),
                    sections: fresh.len(),
                }
            }
        };

        // The Markdown is already on disk; a stale index only costs a rescan.
        let mut index = match &outcome {
            ComposeOutcome::Appended { .. } => self.read_index(&date, &slug),
            _ => DigestIndex::default(),
        };
        index.links.extend(fresh.into_iter().map(|(key, _)| key));
        if let Err(e) = self.write_index(&date, &slug, &index) {
            warn!("Failed to update link index for {}: {}", path.display(), e);
        }

        Ok(outcome)
    }

    fn read_index(&self, date: &str, slug: &str) -> DigestIndex {
        let path = self.index_path(date, slug);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable link index {}: {}", path.display(), e);
                DigestIndex::default()
            }),
            Err(_) => DigestIndex::default(),
        }
    }

    fn write_index(&self, date: &str, slug: &str, index: &DigestIndex) -> Result<()> {
        let path = self.index_path(date, slug);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(index)?;
        fs::write(&path, json).map_err(|e| DigestError::io(&path, e))
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DigestError::io(path, e)),
    }
}

/// Blank-line separation between the existing content and the first
/// appended heading.
fn separator_after(content: &str) -> &'static str {
    if content.ends_with("\n\n") {
        ""
    } else if content.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    }
}

/// Form of a link as it appears inside a rendered heading. Used as the
/// identity of an article within a digest file.
pub fn link_key(link: &str) -> String {
    link.trim()
        .replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}

fn escape_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return "Untitled".to_string();
    }
    title
        .replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

pub fn render_front_matter(front_matter: &FrontMatter) -> String {
    let mut header = String::from("---\n");
    header.push_str(&format!("date: {}\n", front_matter.date));
    if let Some(title) = &front_matter.title {
        header.push_str(&format!("title: {}\n", title));
    }
    if let Some(author) = &front_matter.author {
        header.push_str(&format!("author: {}\n", author));
    }
    header.push_str("---\n\n");
    header
}

/// `# [title](link)`, the summary, then a blank line.
pub fn render_section(section: &DigestSection) -> String {
    format!(
        "# [{}]({})\n{}\n\n",
        escape_title(&section.title),
        link_key(&section.link),
        section.summary_text.trim()
    )
}

/// Links of every `# [title](link)` heading in a rendered digest.
pub fn scan_links(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .filter_map(|line| {
            let heading = line.trim_start();
            if !heading.starts_with('#') {
                return None;
            }
            let text = heading.trim_start_matches('#').trim();
            if !text.starts_with('[') || !text.ends_with(')') {
                return None;
            }

            // First `](` preceded by an even run of backslashes
            let bytes = text.as_bytes();
            let split = text.match_indices("](").map(|(i, _)| i).find(|&i| {
                let backslashes = bytes[..i].iter().rev().take_while(|&&b| b == b'\\').count();
                backslashes % 2 == 0
            })?;

            let link = text[split + 2..text.len() - 1].trim();
            (!link.is_empty()).then(|| link.to_string())
        })
        .collect()
}
