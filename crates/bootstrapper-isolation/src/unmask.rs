//! Namespace allow-list deciding which host symbols the loader may delegate to.

use std::collections::BTreeSet;
use std::fmt;

/// Host namespaces visible from an isolated loader.
///
/// `org.slf4j` unmasks `org.slf4j` and every namespace below it
/// (`org.slf4j.impl`), but not `org.slf4jx`. An empty set hides the whole host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmaskSet {
    prefixes: BTreeSet<String>,
}

impl UnmaskSet {
    /// Blank prefixes are dropped and a trailing `.` is ignored.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('.').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    /// Whether `namespace` is one of the prefixes or nested below one.
    pub fn is_unmasked(&self, namespace: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            namespace
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
    }
}

impl fmt::Display for UnmaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.prefixes().collect();
        write!(f, "[{}]", joined.join(", "))
    }
}

/// Namespace of a dotted symbol name: `org.slf4j.Logger` → `org.slf4j`.
/// Top-level symbols live in the empty namespace.
pub fn symbol_namespace(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(namespace, _)| namespace)
}

/// Namespace of a resource path: `org/slf4j/impl/StaticLoggerBinder.txt` → `org.slf4j.impl`.
pub fn resource_namespace(path: &str) -> String {
    let path = path.trim_start_matches('/');
    path.rsplit_once('/')
        .map(|(dir, _)| dir.replace('/', "."))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matches_on_namespace_boundary() {
        let unmask = UnmaskSet::new(["org.slf4j"]);
        assert!(unmask.is_unmasked("org.slf4j"));
        assert!(unmask.is_unmasked("org.slf4j.impl"));
        assert!(!unmask.is_unmasked("org.slf4jx"));
        assert!(!unmask.is_unmasked("org"));
        assert!(!unmask.is_unmasked("org.myhost"));
    }

    #[test]
    fn test_trailing_dot_and_blanks_are_normalized() {
        let unmask = UnmaskSet::new(["org.sonar.api.", "  ", ""]);
        assert_eq!(unmask.prefixes().collect::<Vec<_>>(), ["org.sonar.api"]);
        assert!(unmask.is_unmasked("org.sonar.api.batch"));
    }

    #[test]
    fn test_empty_set_hides_everything() {
        let unmask = UnmaskSet::empty();
        assert!(unmask.is_empty());
        assert!(!unmask.is_unmasked("org.slf4j"));
        assert!(!unmask.is_unmasked(""));
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(symbol_namespace("org.slf4j.Logger"), "org.slf4j");
        assert_eq!(symbol_namespace("Main"), "");
        assert_eq!(
            resource_namespace("org/slf4j/impl/StaticLoggerBinder.txt"),
            "org.slf4j.impl"
        );
        assert_eq!(resource_namespace("/org/sonar/batch.properties"), "org.sonar");
        assert_eq!(resource_namespace("logback.xml"), "");
    }

    #[test]
    fn test_display() {
        let unmask = UnmaskSet::new(["org.sonar.api", "org.slf4j"]);
        assert_eq!(unmask.to_string(), "[org.slf4j, org.sonar.api]");
    }
}
