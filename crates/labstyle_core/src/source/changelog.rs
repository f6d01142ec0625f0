//! Structured view of a `CHANGELOG.md`.
//!
//! # Responsibility
//! - Split the document into release entries keyed by level-2 headings.
//! - Parse entry titles of the form `[Unreleased]` or `[X.Y.Z] - YYYY-MM-DD`.
//!
//! # Invariants
//! - Parsing is total: unrecognized titles become `EntryTitle::Malformed`.

use crate::source::markdown::{headings, Heading};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

static ENTRY_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<name>[^\]]+)\](?:\s+-\s+(?P<date>\S+))?$").expect("valid entry title regex")
});
static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?$").expect("valid version regex")
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex"));

/// Semantic version `major.minor.patch[-pre]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl Version {
    pub fn parse(value: &str) -> Option<Self> {
        let captures = VERSION_RE.captures(value.trim())?;
        Some(Self {
            major: captures[1].parse().ok()?,
            minor: captures[2].parse().ok()?,
            patch: captures[3].parse().ok()?,
            pre: captures.get(4).map(|m| m.as_str().to_string()),
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(left), Some(right)) => left.cmp(right),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTitle {
    Unreleased {
        date: Option<String>,
    },
    Release {
        version: Version,
        date: Option<String>,
    },
    Malformed,
}

/// One level-2 section and the level-3 headings below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub heading: Heading,
    pub title: EntryTitle,
    pub sections: Vec<Heading>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    /// Root-relative path.
    pub path: String,
    /// First heading of the document, if any.
    pub title: Option<Heading>,
    pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
    pub fn parse(path: impl Into<String>, text: &str) -> Self {
        let all = headings(text);
        let title = all.first().cloned();
        let mut entries: Vec<ChangelogEntry> = Vec::new();

        for heading in all {
            match heading.level {
                2 => entries.push(ChangelogEntry {
                    title: parse_entry_title(&heading.text),
                    heading,
                    sections: Vec::new(),
                }),
                3 => {
                    if let Some(entry) = entries.last_mut() {
                        entry.sections.push(heading);
                    }
                }
                _ => {}
            }
        }

        Self {
            path: path.into(),
            title,
            entries,
        }
    }

    /// Returns whether a release entry exists for `version`.
    pub fn has_release(&self, version: &Version) -> bool {
        self.entries.iter().any(|entry| {
            matches!(&entry.title, EntryTitle::Release { version: listed, .. } if listed == version)
        })
    }

    pub fn has_unreleased(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry.title, EntryTitle::Unreleased { .. }))
    }
}

/// Returns whether `value` is a `YYYY-MM-DD` date.
pub fn is_iso_date(value: &str) -> bool {
    DATE_RE.is_match(value)
}

fn parse_entry_title(text: &str) -> EntryTitle {
    let Some(captures) = ENTRY_TITLE_RE.captures(text.trim()) else {
        return EntryTitle::Malformed;
    };
    let name = &captures["name"];
    let date = captures.name("date").map(|m| m.as_str().to_string());

    if name.eq_ignore_ascii_case("unreleased") {
        return EntryTitle::Unreleased { date };
    }
    match Version::parse(name) {
        Some(version) => EntryTitle::Release { version, date },
        None => EntryTitle::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_iso_date, Changelog, EntryTitle, Version};

    const SAMPLE: &str = "# Changelog

## [Unreleased]

### Added
- rule registry

## [0.2.0] - 2024-03-01

### Fixed
- ordering

## Next
";

    #[test]
    fn parses_entries_and_sections() {
        let changelog = Changelog::parse("CHANGELOG.md", SAMPLE);
        assert_eq!(changelog.title.as_ref().map(|h| h.text.as_str()), Some("Changelog"));
        assert_eq!(changelog.entries.len(), 3);
        assert_eq!(changelog.entries[0].title, EntryTitle::Unreleased { date: None });
        assert_eq!(changelog.entries[0].sections[0].text, "Added");
        assert!(matches!(
            &changelog.entries[1].title,
            EntryTitle::Release { version, date: Some(date) }
                if version.to_string() == "0.2.0" && date == "2024-03-01"
        ));
        assert_eq!(changelog.entries[2].title, EntryTitle::Malformed);
        assert!(changelog.has_unreleased());
        assert!(changelog.has_release(&Version::parse("0.2.0").expect("version")));
    }

    #[test]
    fn version_ordering_puts_prerelease_first() {
        let release = Version::parse("1.0.0").expect("version");
        let pre = Version::parse("1.0.0-rc.1").expect("version");
        let older = Version::parse("0.9.12").expect("version");
        assert!(pre < release);
        assert!(older < pre);
        assert!(Version::parse("1.0").is_none());
    }

    #[test]
    fn validates_iso_dates() {
        assert!(is_iso_date("2024-12-31"));
        assert!(!is_iso_date("2024-13-01"));
        assert!(!is_iso_date("31.12.2024"));
    }
}
