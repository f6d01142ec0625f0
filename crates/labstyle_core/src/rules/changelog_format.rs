//! `changelog-format`: the workspace changelog follows the release layout.
//!
//! # Responsibility
//! - Check the document title, entry titles and entry sections.
//! - Check that release entries run newest first.
//!
//! # Invariants
//! - Every violation points at the offending heading line.

use crate::model::finding::{Location, Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::{Rule, WorkspaceContext};
use crate::source::changelog::{is_iso_date, Changelog, EntryTitle, Version};
use std::collections::BTreeSet;

const EXPECTED_TITLE: &str = "Changelog";

pub struct ChangelogFormatRule;

impl Rule for ChangelogFormatRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "changelog-format",
            summary: "CHANGELOG.md follows the Unreleased/release entry layout",
            scope: RuleScope::Workspace,
            default_severity: Severity::Error,
        }
    }

    fn check_workspace(&self, ctx: &WorkspaceContext<'_>) -> Vec<Violation> {
        let settings = &ctx.config.source.changelog;
        let Some(changelog) = ctx.changelog else {
            return vec![Violation::new(
                Location::file(settings.path.clone()),
                format!("changelog `{}` does not exist", settings.path),
            )];
        };

        let mut violations = Vec::new();
        check_title(changelog, &mut violations);
        check_entry_titles(changelog, &mut violations);
        if settings.require_unreleased {
            check_unreleased_first(changelog, &mut violations);
        }
        check_release_order(changelog, &mut violations);
        check_sections(changelog, &settings.sections, &mut violations);
        violations
    }
}

fn at_line(changelog: &Changelog, line: usize) -> Location {
    Location::line(changelog.path.clone(), line)
}

fn check_title(changelog: &Changelog, violations: &mut Vec<Violation>) {
    match &changelog.title {
        Some(title) if title.level == 1 && title.text == EXPECTED_TITLE => {}
        Some(title) => violations.push(
            Violation::new(
                at_line(changelog, title.line),
                format!("changelog must open with `# {EXPECTED_TITLE}`, found `{}`", title.text),
            )
            .with_suggestion(format!("# {EXPECTED_TITLE}")),
        ),
        None => violations.push(Violation::new(
            at_line(changelog, 1),
            format!("changelog has no `# {EXPECTED_TITLE}` heading"),
        )),
    }
}

fn check_entry_titles(changelog: &Changelog, violations: &mut Vec<Violation>) {
    let mut unreleased_seen = false;
    for entry in &changelog.entries {
        let location = at_line(changelog, entry.heading.line);
        match &entry.title {
            EntryTitle::Malformed => violations.push(Violation::new(
                location,
                format!(
                    "entry `{}` is neither `[Unreleased]` nor `[X.Y.Z] - YYYY-MM-DD`",
                    entry.heading.text
                ),
            )),
            EntryTitle::Unreleased { date } => {
                if date.is_some() {
                    violations.push(Violation::new(
                        location.clone(),
                        "`[Unreleased]` entry must not carry a date",
                    ));
                }
                if unreleased_seen {
                    violations.push(Violation::new(location, "duplicate `[Unreleased]` entry"));
                }
                unreleased_seen = true;
            }
            EntryTitle::Release { version, date } => match date {
                None => violations.push(
                    Violation::new(location, format!("release `{version}` has no date"))
                        .with_suggestion(format!("## [{version}] - YYYY-MM-DD")),
                ),
                Some(date) if !is_iso_date(date) => violations.push(Violation::new(
                    location,
                    format!("release `{version}` date `{date}` is not `YYYY-MM-DD`"),
                )),
                Some(_) => {}
            },
        }
    }
}

fn check_unreleased_first(changelog: &Changelog, violations: &mut Vec<Violation>) {
    match changelog.entries.first() {
        Some(entry) if matches!(entry.title, EntryTitle::Unreleased { .. }) => {}
        Some(entry) => violations.push(
            Violation::new(
                at_line(changelog, entry.heading.line),
                "first changelog entry must be `[Unreleased]`",
            )
            .with_suggestion("## [Unreleased]"),
        ),
        None => {
            let line = changelog.title.as_ref().map_or(1, |title| title.line);
            violations.push(
                Violation::new(at_line(changelog, line), "changelog has no `[Unreleased]` entry")
                    .with_suggestion("## [Unreleased]"),
            );
        }
    }
}

fn check_release_order(changelog: &Changelog, violations: &mut Vec<Violation>) {
    let mut previous_version: Option<&Version> = None;
    let mut previous_date: Option<&str> = None;

    for entry in &changelog.entries {
        let EntryTitle::Release { version, date } = &entry.title else {
            continue;
        };
        let location = at_line(changelog, entry.heading.line);

        if let Some(above) = previous_version {
            if version >= above {
                violations.push(Violation::new(
                    location.clone(),
                    format!("release `{version}` must be older than `{above}` listed above it"),
                ));
            }
        }
        previous_version = Some(version);

        let Some(date) = date.as_deref().filter(|date| is_iso_date(date)) else {
            continue;
        };
        if let Some(above) = previous_date {
            // ISO dates order lexically.
            if date > above {
                violations.push(Violation::new(
                    location,
                    format!("release `{version}` dated {date} is newer than {above} listed above it"),
                ));
            }
        }
        previous_date = Some(date);
    }
}

fn check_sections(changelog: &Changelog, allowed: &[String], violations: &mut Vec<Violation>) {
    for entry in &changelog.entries {
        let mut seen = BTreeSet::new();
        for section in &entry.sections {
            let location = at_line(changelog, section.line);
            if !allowed.iter().any(|name| *name == section.text) {
                violations.push(Violation::new(
                    location.clone(),
                    format!(
                        "section `{}` is not one of {}",
                        section.text,
                        allowed.join(", ")
                    ),
                ));
            }
            if !seen.insert(section.text.as_str()) {
                violations.push(Violation::new(
                    location,
                    format!(
                        "section `{}` appears twice in entry `{}`",
                        section.text, entry.heading.text
                    ),
                ));
            }
        }
    }
}
