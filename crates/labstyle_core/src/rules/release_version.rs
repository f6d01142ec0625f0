//! `release-version`: every crate version is recorded in the changelog.

use crate::model::finding::{Location, Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::{CrateContext, Rule};
use crate::source::changelog::Version;

pub struct ReleaseVersionRule;

impl Rule for ReleaseVersionRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "release-version",
            summary: "crate versions have a matching changelog release entry",
            scope: RuleScope::Crate,
            default_severity: Severity::Warning,
        }
    }

    fn check_crate(&self, ctx: &CrateContext<'_>) -> Vec<Violation> {
        // A missing changelog is reported once by `changelog-format`.
        let (Some(changelog), Some(declared)) = (ctx.changelog, ctx.krate.version.as_deref())
        else {
            return Vec::new();
        };
        let location = Location::file(ctx.krate.manifest_path());

        let Some(version) = Version::parse(declared) else {
            return vec![Violation::new(
                location,
                format!(
                    "crate `{}` version `{declared}` is not a semantic version",
                    ctx.krate.name
                ),
            )];
        };

        if changelog.has_release(&version) {
            return Vec::new();
        }
        if ctx.config.source.changelog.allow_unreleased_version && changelog.has_unreleased() {
            return Vec::new();
        }
        vec![Violation::new(
            location,
            format!(
                "crate `{}` version `{version}` has no release entry in `{}`",
                ctx.krate.name, changelog.path
            ),
        )
        .with_suggestion(format!("add `## [{version}] - YYYY-MM-DD`"))]
    }
}
