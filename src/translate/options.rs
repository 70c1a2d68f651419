use crate::translate::{Result, TranslateError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Knobs of the translation pipeline. Every field has a default, so an
/// options file only needs to mention what it changes, e.g.
///
/// ```toml
/// invariant-max-candidates = 5000
/// invariant-max-time = "30s"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TranslateOptions {
    /// Stop queueing new invariant candidates once this many have been seen.
    #[serde(default = "default_invariant_max_candidates")]
    pub invariant_max_candidates: usize,
    /// Wall-clock budget of the invariant search.
    #[serde(
        default = "default_invariant_max_time",
        with = "humantime_duration"
    )]
    pub invariant_max_time: Duration,
    /// Whether selecting a fact group removes its facts from the groups
    /// that are still candidates.
    #[serde(default = "default_partial_encoding")]
    pub partial_encoding: bool,
    /// Drop all delete effects after normalization.
    #[serde(default)]
    pub relaxed: bool,
    /// Whether the invariant search may use the reachable action parameters
    /// to add inequality preconditions.
    #[serde(default = "default_use_reachable_action_params")]
    pub use_reachable_action_params: bool,
    /// Report [`crate::translate::TranslationOutcome::AxiomsNotSupported`]
    /// instead of translating tasks with axioms.
    #[serde(default)]
    pub forbid_axioms: bool,
    /// Remove facts that are unreachable in the domain transition graph of
    /// their variable after encoding.
    #[serde(default = "default_detect_unreachable")]
    pub detect_unreachable: bool,
}

fn default_invariant_max_candidates() -> usize {
    100_000
}

fn default_invariant_max_time() -> Duration {
    Duration::from_secs(300)
}

fn default_partial_encoding() -> bool {
    true
}

fn default_use_reachable_action_params() -> bool {
    true
}

fn default_detect_unreachable() -> bool {
    true
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            invariant_max_candidates: default_invariant_max_candidates(),
            invariant_max_time: default_invariant_max_time(),
            partial_encoding: default_partial_encoding(),
            relaxed: false,
            use_reachable_action_params: default_use_reachable_action_params(),
            forbid_axioms: false,
            detect_unreachable: default_detect_unreachable(),
        }
    }
}

impl TranslateOptions {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| TranslateError::Options {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| TranslateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }
}

/// Durations as human readable strings such as `"5m"` or `"1h 30s"`.
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let options = TranslateOptions::from_toml_str("", Path::new("empty.toml")).unwrap();
        assert_eq!(options, TranslateOptions::default());
        assert_eq!(options.invariant_max_candidates, 100_000);
        assert_eq!(options.invariant_max_time, Duration::from_secs(300));
        assert!(options.partial_encoding);
        assert!(!options.relaxed);
        assert!(options.detect_unreachable);
    }

    #[test]
    fn durations_are_human_readable() {
        let options = TranslateOptions::from_toml_str(
            "invariant-max-time = \"1m 30s\"\nforbid-axioms = true\n",
            Path::new("options.toml"),
        )
        .unwrap();
        assert_eq!(options.invariant_max_time, Duration::from_secs(90));
        assert!(options.forbid_axioms);

        let text = toml::to_string(&options).unwrap();
        assert!(text.contains("invariant-max-time = \"1m 30s\""));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = TranslateOptions::from_toml_str("max-time = 3", Path::new("bad.toml"));
        assert!(matches!(result, Err(TranslateError::Options { .. })));
    }

    #[test]
    fn options_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "partial-encoding = false\ndetect-unreachable = false").unwrap();
        let options = TranslateOptions::from_toml_path(file.path()).unwrap();
        assert!(!options.partial_encoding);
        assert!(!options.detect_unreachable);
        assert!(matches!(
            TranslateOptions::from_toml_path(Path::new("/nonexistent/options.toml")),
            Err(TranslateError::Io { .. })
        ));
    }
}
