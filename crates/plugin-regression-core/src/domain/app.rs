//! App sources and the variants built from them.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Label used for a variant that installs nothing.
pub const EMPTY_APP_LABEL: &str = "no-app";

/// Where the extension under test comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppSource {
    /// Bare application, no extension installed.
    Empty,

    /// A locally built extension artifact.
    File { path: PathBuf },

    /// An extension published to a Maven repository.
    Maven {
        group_id: String,
        artifact_id: String,
        version: String,
    },
}

impl AppSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        AppSource::File { path: path.into() }
    }

    pub fn maven(group_id: &str, artifact_id: &str, version: &str) -> Self {
        AppSource::Maven {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
        }
    }

    /// Human-readable label for this source.
    pub fn label(&self) -> String {
        match self {
            AppSource::Empty => EMPTY_APP_LABEL.to_string(),
            AppSource::File { path } => file_label(path),
            AppSource::Maven { version, .. } => version.clone(),
        }
    }

    /// Local artifact that must exist before installation, if any.
    pub fn local_artifact(&self) -> Option<&Path> {
        match self {
            AppSource::File { path } => Some(path),
            _ => None,
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl std::fmt::Display for AppSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppSource::Empty => write!(f, "none"),
            AppSource::File { path } => write!(f, "{}", path.display()),
            AppSource::Maven {
                group_id,
                artifact_id,
                version,
            } => write!(f, "maven:{group_id}:{artifact_id}:{version}"),
        }
    }
}

/// Error returned when an app source string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid app source '{input}': {reason}")]
pub struct ParseAppSourceError {
    pub input: String,
    pub reason: String,
}

impl FromStr for AppSource {
    type Err = ParseAppSourceError;

    /// Accepts `none`, `maven:<group>:<artifact>:<version>` or a file path.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseAppSourceError {
                input: s.to_string(),
                reason: "empty".to_string(),
            });
        }
        if s.eq_ignore_ascii_case("none") {
            return Ok(AppSource::Empty);
        }
        if let Some(coordinates) = s.strip_prefix("maven:") {
            let parts: Vec<&str> = coordinates.split(':').collect();
            return match parts.as_slice() {
                [group, artifact, version]
                    if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
                {
                    Ok(AppSource::maven(group, artifact, version))
                }
                _ => Err(ParseAppSourceError {
                    input: s.to_string(),
                    reason: "expected maven:<group>:<artifact>:<version>".to_string(),
                }),
            };
        }
        Ok(AppSource::file(s))
    }
}

/// One side of a comparison: what to install and how to label it.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    source: AppSource,
    label: String,
}

impl Variant {
    /// Build a variant whose label is derived from its source.
    pub fn new(source: AppSource) -> Self {
        let label = source.label();
        Self { source, label }
    }

    /// Build a variant with an explicit label.
    pub fn labeled(source: AppSource, label: impl Into<String>) -> Self {
        Self {
            source,
            label: label.into(),
        }
    }

    pub fn source(&self) -> &AppSource {
        &self.source
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl From<AppSource> for Variant {
    fn from(source: AppSource) -> Self {
        Variant::new(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_per_source_kind() {
        assert_eq!(AppSource::Empty.label(), "no-app");
        assert_eq!(
            AppSource::file("/tmp/build/my-plugin-1.0.jar").label(),
            "my-plugin-1.0.jar"
        );
        assert_eq!(
            AppSource::maven("com.example", "my-plugin", "7.2.0").label(),
            "7.2.0"
        );
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!("none".parse::<AppSource>().unwrap(), AppSource::Empty);
        assert_eq!(
            "maven:com.example:my-plugin:7.2.0"
                .parse::<AppSource>()
                .unwrap(),
            AppSource::maven("com.example", "my-plugin", "7.2.0")
        );
        assert_eq!(
            "target/my-plugin.jar".parse::<AppSource>().unwrap(),
            AppSource::file("target/my-plugin.jar")
        );
    }

    #[test]
    fn test_parse_rejects_bad_maven_coordinates() {
        assert!("maven:com.example:my-plugin".parse::<AppSource>().is_err());
        assert!("maven:com.example::7.2.0".parse::<AppSource>().is_err());
        assert!("".parse::<AppSource>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let source = AppSource::maven("com.example", "my-plugin", "7.2.0");
        assert_eq!(source.to_string().parse::<AppSource>().unwrap(), source);
    }

    #[test]
    fn test_variant_label_derived_or_overridden() {
        let derived = Variant::new(AppSource::maven("g", "a", "7.2.0"));
        assert_eq!(derived.label(), "7.2.0");

        let labeled = Variant::labeled(AppSource::Empty, "vanilla");
        assert_eq!(labeled.label(), "vanilla");
        assert_eq!(labeled.source(), &AppSource::Empty);
    }

    #[test]
    fn test_local_artifact_only_for_files() {
        assert!(AppSource::Empty.local_artifact().is_none());
        assert!(AppSource::maven("g", "a", "1").local_artifact().is_none());
        assert_eq!(
            AppSource::file("x.jar").local_artifact(),
            Some(Path::new("x.jar"))
        );
    }
}
