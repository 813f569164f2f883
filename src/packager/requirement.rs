//! Requirement specifiers and version ordering.
//!
//! A requirement line looks like `name[extra1,extra2] >=1.0,<2 ; marker  # comment`.
//! Only the name is mandatory. Markers are recorded but never evaluated.

use crate::packager::error::{Error, ErrorExt, Result};
use regex::Regex;
use std::{cmp::Ordering, fmt, path::Path, sync::LazyLock};

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<name>[A-Za-z0-9][A-Za-z0-9._-]*)\s*",
        r"(?:\[(?P<extras>[^\]]*)\])?\s*",
        r"(?P<spec>[^;]*?)\s*",
        r"(?:;\s*(?P<marker>.*))?$",
    ))
    .expect("requirement pattern is valid")
});

static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("separator pattern is valid"));

/// Canonical form of a project name: lowercase, separator runs become `-`.
pub fn normalize_name(name: &str) -> String {
    NAME_SEPARATORS
        .replace_all(&name.to_ascii_lowercase(), "-")
        .into_owned()
}

/// A parsed requirement specifier. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    extras: Vec<String>,
    constraint: Option<VersionConstraint>,
    marker: Option<String>,
    line: String,
}

impl Requirement {
    /// Parses a single requirement line.
    pub fn parse(line: &str) -> Result<Self> {
        let text = line.split('#').next().unwrap_or_default().trim();
        let caps = REQUIREMENT_RE
            .captures(text)
            .ok_or_else(|| Error::InvalidRequirement(line.trim().to_string()))?;

        let extras = caps
            .name("extras")
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let constraint = match caps.name("spec").map(|m| m.as_str().trim()) {
            Some(spec) if !spec.is_empty() => Some(
                VersionConstraint::parse(spec)
                    .ok_or_else(|| Error::InvalidRequirement(line.trim().to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            name: caps["name"].to_string(),
            extras,
            constraint,
            marker: caps
                .name("marker")
                .map(|m| m.as_str().trim().to_string())
                .filter(|m| !m.is_empty()),
            line: text.to_string(),
        })
    }

    /// Name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name in canonical form, used for lookups and comparisons.
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn constraint(&self) -> Option<&VersionConstraint> {
        self.constraint.as_ref()
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Whether `version` satisfies this requirement's constraint, if any.
    pub fn accepts(&self, version: &str) -> bool {
        self.constraint
            .as_ref()
            .is_none_or(|constraint| constraint.matches(version))
    }

    /// Whether pre-releases may be picked even when a final release
    /// also satisfies the requirement.
    pub fn allows_prereleases(&self) -> bool {
        self.constraint
            .as_ref()
            .is_some_and(VersionConstraint::names_prerelease)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Reads a requirements file: one specifier per line, blank lines and
/// `#` comments skipped. A `[section]` header ends the list, later
/// sections only apply to extras or markers.
pub async fn read_requirements(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading requirements file", path)?;
    Ok(requirement_lines(&contents))
}

pub(crate) fn requirement_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with('['))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    Compatible,
}

/// Comma-separated list of version clauses, all of which must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    clauses: Vec<(Operator, String)>,
}

impl VersionConstraint {
    pub fn parse(spec: &str) -> Option<Self> {
        let clauses = spec
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|clause| {
                // Two-character operators first so `>=` is not read as `>`.
                let (op, rest) = [
                    ("==", Operator::Eq),
                    ("!=", Operator::Ne),
                    (">=", Operator::Ge),
                    ("<=", Operator::Le),
                    ("~=", Operator::Compatible),
                    (">", Operator::Gt),
                    ("<", Operator::Lt),
                ]
                .into_iter()
                .find_map(|(token, op)| clause.strip_prefix(token).map(|rest| (op, rest)))?;
                let version = rest.trim();
                (!version.is_empty()).then(|| (op, version.to_string()))
            })
            .collect::<Option<Vec<_>>>()?;

        (!clauses.is_empty()).then_some(Self { clauses })
    }

    /// Whether any clause names a pre-release, e.g. `>=2.0b1`.
    pub fn names_prerelease(&self) -> bool {
        self.clauses
            .iter()
            .any(|(_, wanted)| Version::parse(wanted).is_prerelease())
    }

    pub fn matches(&self, version: &str) -> bool {
        let candidate = Version::parse(version);
        self.clauses.iter().all(|(op, wanted)| {
            let ordering = candidate.cmp(&Version::parse(wanted));
            match op {
                Operator::Eq => ordering == Ordering::Equal,
                Operator::Ne => ordering != Ordering::Equal,
                Operator::Ge => ordering != Ordering::Less,
                Operator::Le => ordering != Ordering::Greater,
                Operator::Gt => ordering == Ordering::Greater,
                Operator::Lt => ordering == Ordering::Less,
                Operator::Compatible => {
                    let wanted = Version::parse(wanted);
                    let prefix = wanted.release.len().saturating_sub(1).max(1);
                    ordering != Ordering::Less
                        && candidate.release_prefix(prefix) == wanted.release_prefix(prefix)
                }
            }
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .clauses
            .iter()
            .map(|(op, v)| {
                let token = match op {
                    Operator::Eq => "==",
                    Operator::Ne => "!=",
                    Operator::Ge => ">=",
                    Operator::Le => "<=",
                    Operator::Gt => ">",
                    Operator::Lt => "<",
                    Operator::Compatible => "~=",
                };
                format!("{token}{v}")
            })
            .collect();
        f.write_str(&rendered.join(","))
    }
}

/// Pre-release phase, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Alpha,
    Beta,
    Candidate,
}

/// A release number such as `1.10`, `2.0rc1`, `1.4.post2` or `0.9.dev3`.
///
/// Release segments compare numerically with trailing zeros ignored, so
/// `1.0` equals `1.0.0`. Within one release, `dev < a < b < rc < final <
/// post`. Unrecognised trailing text only breaks ties, lexically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    release: Vec<u64>,
    pre: Option<(Phase, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    extra: Vec<String>,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let lowered = version.trim().to_ascii_lowercase();
        let text = lowered.trim_start_matches('v');
        let text = text.split('+').next().unwrap_or_default();

        let mut parsed = Self {
            release: Vec::new(),
            pre: None,
            post: None,
            dev: None,
            extra: Vec::new(),
        };

        let mut rest = text;
        loop {
            let (number, tail) = split_number(rest);
            let Some(number) = number else { break };
            parsed.release.push(number);
            rest = tail;
            match rest.strip_prefix('.') {
                Some(tail) if tail.starts_with(|c: char| c.is_ascii_digit()) => rest = tail,
                _ => break,
            }
        }
        while parsed.release.last() == Some(&0) {
            parsed.release.pop();
        }

        loop {
            rest = rest.trim_start_matches(['.', '-', '_']);
            if rest.is_empty() {
                break;
            }
            let tag_len = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            let (tag, tail) = rest.split_at(tag_len);
            let (number, tail) = split_number(tail);

            match (tag, number) {
                ("", None) => {
                    parsed.extra.push(rest.to_string());
                    break;
                }
                ("a" | "alpha", n) => parsed.pre = Some((Phase::Alpha, n.unwrap_or(0))),
                ("b" | "beta", n) => parsed.pre = Some((Phase::Beta, n.unwrap_or(0))),
                ("rc" | "c" | "pre" | "preview", n) => {
                    parsed.pre = Some((Phase::Candidate, n.unwrap_or(0)))
                }
                ("post" | "rev" | "r" | "", n) => parsed.post = Some(n.unwrap_or(0)),
                ("dev", n) => parsed.dev = Some(n.unwrap_or(0)),
                _ => {
                    parsed.extra.push(rest.to_string());
                    break;
                }
            }
            rest = tail;
        }

        parsed
    }

    fn release_prefix(&self, len: usize) -> &[u64] {
        &self.release[..len.min(self.release.len())]
    }

    /// Alpha, beta, candidate and development releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Sort key of the suffixes: a bare `.devN` sorts below every
    /// pre-release of the same release, no pre-release above all of them.
    fn suffix_key(&self) -> (u8, u64, Option<u64>, bool, u64) {
        let (tier, pre_number) = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, 0),
            (Some((phase, n)), _, _) => (phase as u8 + 1, n),
            _ => (4, 0),
        };
        (
            tier,
            pre_number,
            self.post,
            self.dev.is_none(),
            self.dev.unwrap_or(0),
        )
    }
}

/// Splits a leading run of ASCII digits off `text`.
fn split_number(text: &str) -> (Option<u64>, &str) {
    let len = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, rest) = text.split_at(len);
    (digits.parse().ok(), rest)
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then_with(|| self.suffix_key().cmp(&other.suffix_key()))
            .then_with(|| self.extra.cmp(&other.extra))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let req = Requirement::parse("requests").unwrap();
        assert_eq!(req.name(), "requests");
        assert!(req.constraint().is_none());
        assert!(req.extras().is_empty());
        assert_eq!(req.to_string(), "requests");
    }

    #[test]
    fn parses_constraints_extras_markers_and_comments() {
        let line = "Flask[async, dotenv] >=2.0,<3 ; python_version > '3.6'  # web";
        let req = Requirement::parse(line).unwrap();
        assert_eq!(req.name(), "Flask");
        assert_eq!(req.key(), "flask");
        assert_eq!(req.extras(), ["async", "dotenv"]);
        assert_eq!(req.constraint().unwrap().to_string(), ">=2.0,<3");
        assert_eq!(req.marker(), Some("python_version > '3.6'"));
        assert!(req.accepts("2.3.1"));
        assert!(!req.accepts("3.0"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(Requirement::parse("=>1.0"), Err(Error::InvalidRequirement(_))));
        assert!(matches!(Requirement::parse("pkg ~~ 1"), Err(Error::InvalidRequirement(_))));
        assert!(Requirement::parse("[extras]").is_err());
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("Foo_Bar.baz--Qux"), "foo-bar-baz-qux");
    }

    #[test]
    fn version_ordering() {
        assert!(Version::parse("1.10") > Version::parse("1.9"));
        assert_eq!(Version::parse("1.0"), Version::parse("1.0.0"));
        assert!(Version::parse("2.0.1") > Version::parse("2.0"));
    }

    #[test]
    fn prereleases_sort_below_their_final_release() {
        let ordered = [
            "1.1.dev1", "1.1a1", "1.1b2", "1.1rc1", "1.1", "1.1.post1", "1.9b1", "1.9", "1.10",
        ];
        for pair in ordered.windows(2) {
            assert!(
                Version::parse(pair[0]) < Version::parse(pair[1]),
                "{} should sort below {}",
                pair[0],
                pair[1]
            );
        }

        assert!(Version::parse("1.0a1.dev1") < Version::parse("1.0a1"));
        assert!(Version::parse("0.dev3") < Version::parse("0.1"));
        assert_eq!(Version::parse("1.0-1"), Version::parse("1.0.post1"));
        assert_eq!(Version::parse("2.0RC1"), Version::parse("2.0c1"));

        assert!(Version::parse("1.9b1").is_prerelease());
        assert!(Version::parse("0.dev3").is_prerelease());
        assert!(!Version::parse("1.1.post1").is_prerelease());
    }

    #[test]
    fn constraint_naming_a_prerelease_allows_them() {
        assert!(Requirement::parse("pkg>=2.0b1").unwrap().allows_prereleases());
        assert!(!Requirement::parse("pkg>=2.0").unwrap().allows_prereleases());
        assert!(!Requirement::parse("pkg").unwrap().allows_prereleases());
    }

    #[test]
    fn compatible_release() {
        let c = VersionConstraint::parse("~=1.4.2").unwrap();
        assert!(c.matches("1.4.5"));
        assert!(!c.matches("1.5.0"));
        assert!(!c.matches("1.4.1"));

        let c = VersionConstraint::parse("~=2.2").unwrap();
        assert!(c.matches("2.9"));
        assert!(!c.matches("3.0"));
    }

    #[test]
    fn exact_and_exclusion() {
        let c = VersionConstraint::parse("==1.0, !=1.0").unwrap();
        assert!(!c.matches("1.0"));
        assert!(VersionConstraint::parse("==1.0").unwrap().matches("1.0.0"));
    }

    #[test]
    fn requirement_lines_skip_comments_and_stop_at_sections() {
        let lines = requirement_lines("\n# deps\nsix\n\n  pyyaml>=5 \n[test]\npytest\n");
        assert_eq!(lines, ["six", "pyyaml>=5"]);
    }
}
