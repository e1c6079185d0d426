//! Milestone matching
//!
//! The milestone pattern is applied to a release name; its first capture group
//! is the milestone title to look for. Titles are compared exactly and the
//! first milestone in listing order wins.

use regex::Regex;

use crate::config::ConfigKey;
use crate::error::{Error, Result};
use crate::github::Milestone;
use crate::selector::compile_pattern;
use crate::types::{MilestoneMatch, Release};

/// Correlates release names with milestone titles
#[derive(Clone, Debug)]
pub struct MilestoneMatcher {
    pattern: Regex,
}

impl MilestoneMatcher {
    /// Compile the milestone-extraction pattern
    ///
    /// # Errors
    /// An unset or empty pattern is a configuration error, as is a pattern
    /// that does not compile.
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let key = ConfigKey::MilestonePattern;
        let pattern = pattern.filter(|p| !p.is_empty()).ok_or_else(|| {
            Error::config(
                key.name(),
                "no milestone pattern defined to extract milestone naming scheme",
            )
        })?;

        Ok(Self {
            pattern: compile_pattern(key, pattern)?,
        })
    }

    /// Milestone title encoded in a release name
    ///
    /// `None` when the pattern does not match or the first group did not
    /// participate in the match.
    pub fn extract<'a>(&self, release_name: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(release_name)?
            .get(1)
            .map(|group| group.as_str())
    }

    /// First milestone whose title equals the extracted text
    pub fn find<'m>(&self, release_name: &str, milestones: &'m [Milestone]) -> Option<&'m Milestone> {
        let title = self.extract(release_name)?;
        milestones.iter().find(|m| m.title == title)
    }

    /// Attach the matching milestone to a release
    ///
    /// Returns whether a milestone was found; an unmatched release is left
    /// untouched.
    pub fn apply(&self, release: &mut Release, milestones: &[Milestone]) -> bool {
        match self.find(&release.name, milestones) {
            Some(milestone) => {
                release.milestone = Some(MilestoneMatch::new(milestone));
                true
            }
            None => false,
        }
    }
}
