//! Ordering of package version strings.
//!
//! Strict semver strings compare by semver precedence. Anything else is split
//! into dotted components (`1.0.2-beta1` becomes `1 0 2 beta 1`) and compared
//! component by component, with release-stage words ordered
//! `dev < alpha < beta < RC < (number) < pl`.

use semver::Version;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComparison {
    RemoteNewer,
    RemoteSameOrOlder,
}

/// Compare the remote version against the locally installed one.
pub fn compare(remote: &str, local: &str) -> VersionComparison {
    if compare_versions(remote, local) == Ordering::Greater {
        VersionComparison::RemoteNewer
    } else {
        VersionComparison::RemoteSameOrOlder
    }
}

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = a.trim();
    let b = b.trim();

    if let (Ok(a), Ok(b)) = (Version::parse(a), Version::parse(b)) {
        return a.cmp_precedence(&b);
    }

    let a = components(a);
    let b = components(b);

    for (a, b) in a.iter().zip(b.iter()) {
        let ordering = a.cmp(b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    // Only the first surplus component decides: a number makes the longer
    // version newer, a stage word like "beta" makes it older.
    match a.len().cmp(&b.len()) {
        Ordering::Greater => a[b.len()].cmp_to_release(),
        Ordering::Less => b[a.len()].cmp_to_release().reverse(),
        Ordering::Equal => Ordering::Equal,
    }
}

#[derive(Debug, Clone)]
enum Component {
    /// Digits with leading zeros stripped, so any length compares correctly.
    Number(String),
    Stage(i8),
}

/// Rank of a plain number among the stage words.
const RELEASE_RANK: i8 = 4;

impl Component {
    fn parse(part: &str) -> Self {
        if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Number(part.trim_start_matches('0').to_owned());
        }

        // Longest prefixes first so "beta" does not resolve through "b".
        const STAGES: &[(&str, i8)] = &[
            ("dev", 0),
            ("alpha", 1),
            ("a", 1),
            ("beta", 2),
            ("b", 2),
            ("rc", 3),
            ("#", RELEASE_RANK),
            ("pl", 5),
            ("p", 5),
        ];

        let lower = part.to_ascii_lowercase();
        let rank = STAGES
            .iter()
            .find(|(stage, _)| lower.starts_with(stage))
            .map(|(_, rank)| *rank)
            .unwrap_or(-1);

        Self::Stage(rank)
    }

    fn rank(&self) -> i8 {
        match self {
            Self::Number(_) => RELEASE_RANK,
            Self::Stage(rank) => *rank,
        }
    }

    fn cmp_to_release(&self) -> Ordering {
        match self {
            Self::Number(_) => Ordering::Greater,
            Self::Stage(rank) => rank.cmp(&RELEASE_RANK),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Component {}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn components(version: &str) -> Vec<Component> {
    let mut canonical = String::with_capacity(version.len() * 2);
    let mut previous: Option<char> = None;

    for c in version.chars() {
        let c = if matches!(c, '-' | '_' | '+') { '.' } else { c };

        if let Some(p) = previous {
            let boundary = p != '.' && c != '.' && p.is_ascii_digit() != c.is_ascii_digit();
            if boundary {
                canonical.push('.');
            }
        }

        canonical.push(c);
        previous = Some(c);
    }

    canonical
        .split('.')
        .filter(|v| !v.is_empty())
        .map(Component::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0.3", "1.0.2", VersionComparison::RemoteNewer)]
    #[case("1.0.2", "1.0.2", VersionComparison::RemoteSameOrOlder)]
    #[case("1.0.1", "1.0.2", VersionComparison::RemoteSameOrOlder)]
    #[case("12.12.1", "1.0.2", VersionComparison::RemoteNewer)]
    #[case("2.0.0", "0.0.1", VersionComparison::RemoteNewer)]
    #[case("1.0.0", "1.0.0-beta.2", VersionComparison::RemoteNewer)]
    #[case("1.0.0-beta.10", "1.0.0-beta.2", VersionComparison::RemoteNewer)]
    fn compares_semver_strings(
        #[case] remote: &str,
        #[case] local: &str,
        #[case] expected: VersionComparison,
    ) {
        assert_eq!(compare(remote, local), expected);
    }

    #[rstest]
    #[case("1.0.0", "1.0", Ordering::Greater)]
    #[case("1.0", "1.0.0", Ordering::Less)]
    #[case("1.2", "1.10", Ordering::Less)]
    #[case("1.0-beta1", "1.0", Ordering::Less)]
    #[case("1.0beta2", "1.0beta1", Ordering::Greater)]
    #[case("1.0-RC1", "1.0-beta3", Ordering::Greater)]
    #[case("1.0-dev", "1.0-alpha", Ordering::Less)]
    #[case("1.0-pl1", "1.0", Ordering::Greater)]
    #[case("2.1.0.4", "2.1.0.4", Ordering::Equal)]
    #[case("5.9", "6", Ordering::Less)]
    #[case("1.0.99999999999999999999", "1.0.1", Ordering::Greater)]
    #[case("1.0.1", "1.0.99999999999999999999", Ordering::Less)]
    #[case("1.0.010", "1.0.9", Ordering::Greater)]
    #[case("1.00.2", "1.0.2", Ordering::Equal)]
    fn compares_loose_version_strings(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(a, b), expected);
    }

    #[test]
    fn empty_local_version_is_always_older() {
        assert_eq!(compare("0.0.1", ""), VersionComparison::RemoteNewer);
    }
}
