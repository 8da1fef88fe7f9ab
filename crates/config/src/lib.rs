//! Layered configuration for vaultrow.
//!
//! Values are merged in order, later sources winning:
//!
//! 1. built-in defaults,
//! 2. an optional TOML, YAML or JSON file (chosen by extension),
//! 3. `VAULTROW_*` environment variables, with `__` separating nested keys
//!    (`VAULTROW_AWS__MAX_ATTEMPTS=6`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use vaultrow_hydrate::{DEFAULT_CONCURRENCY, Matrix, QueryOptions};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "VAULTROW_";
/// Upper bound the Backup API accepts for `MaxResults`.
pub const MAX_RESULTS_LIMIT: i32 = 1000;

static REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("region pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Regions to enumerate; each becomes one scope.
    pub regions: Vec<String>,
    /// Scopes enumerated at the same time.
    pub concurrency: usize,
    /// Resolve every listed recovery point through `DescribeRecoveryPoint`.
    pub hydrate_details: bool,
    pub aws: AwsSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            regions: vec!["us-east-1".to_string()],
            concurrency: DEFAULT_CONCURRENCY,
            hydrate_details: false,
            aws: AwsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    /// Override the service endpoint (LocalStack and friends).
    pub endpoint: Option<String>,
    /// Attempts per request including the first, handed to the SDK retry policy.
    pub max_attempts: u32,
    /// Page size requested from listing APIs; the service default when unset.
    pub max_results: Option<i32>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            // 1 initial + 3 retries.
            max_attempts: 4,
            max_results: None,
        }
    }
}

impl Config {
    /// Where the configuration file lives when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "vaultrow").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load, merge and validate configuration.
    ///
    /// An explicit `path` must exist; the default path is used only if it does.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        let figment = Self::figment(file.as_deref())?;
        let config = Self::extract(&figment)?;
        tracing::debug!(
            file = ?file,
            regions = config.regions.len(),
            concurrency = config.concurrency,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// The merged provider chain, without extracting it.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
            figment = match extension.to_ascii_lowercase().as_str() {
                "toml" => figment.merge(Toml::file(path)),
                "yaml" | "yml" => figment.merge(Yaml::file(path)),
                "json" => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate from an already assembled figment.
    pub fn extract(figment: &Figment) -> Result<Self> {
        let config = figment.extract::<Config>().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one region is required".to_string()));
        }
        if let Some(bad) = self.regions.iter().find(|region| !REGION_PATTERN.is_match(region)) {
            exn::bail!(ErrorKind::Invalid(format!("`{bad}` is not a region code")));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".to_string()));
        }
        if self.aws.max_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("aws.max_attempts must be at least 1".to_string()));
        }
        if let Some(max_results) = self.aws.max_results
            && !(1..=MAX_RESULTS_LIMIT).contains(&max_results)
        {
            exn::bail!(ErrorKind::Invalid(format!(
                "aws.max_results must be between 1 and {MAX_RESULTS_LIMIT}, got {max_results}"
            )));
        }
        Ok(())
    }

    /// One scope per configured region.
    pub fn matrix(&self) -> Matrix {
        Matrix::regions(self.regions.iter().cloned())
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            concurrency: self.concurrency,
            hydrate_details: self.hydrate_details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.query_options(), QueryOptions::default());
        assert_eq!(config.matrix().expand().len(), 1);
    }

    #[rstest]
    #[case("config.toml", "regions = [\"eu-west-1\", \"us-gov-west-1\"]\nconcurrency = 3\n[aws]\nmax_results = 50\n")]
    #[case("config.yaml", "regions: [eu-west-1, us-gov-west-1]\nconcurrency: 3\naws:\n  max_results: 50\n")]
    #[case("config.json", r#"{"regions": ["eu-west-1", "us-gov-west-1"], "concurrency": 3, "aws": {"max_results": 50}}"#)]
    fn test_load_file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = Config::load(Some(Path::new(name))).expect("valid configuration");
            assert_eq!(config.regions, vec!["eu-west-1", "us-gov-west-1"]);
            assert_eq!(config.concurrency, 3);
            assert_eq!(config.aws.max_results, Some(50));
            // Untouched values keep their defaults.
            assert_eq!(config.aws.max_attempts, 4);
            assert!(!config.hydrate_details);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "concurrency = 3\n[aws]\nmax_attempts = 2\n")?;
            jail.set_env("VAULTROW_CONCURRENCY", "5");
            jail.set_env("VAULTROW_HYDRATE_DETAILS", "true");
            jail.set_env("VAULTROW_AWS__MAX_ATTEMPTS", "6");
            jail.set_env("VAULTROW_REGIONS", "[ap-southeast-2]");
            let config = Config::load(Some(Path::new("config.toml"))).expect("valid configuration");
            assert_eq!(config.concurrency, 5);
            assert!(config.hydrate_details);
            assert_eq!(config.aws.max_attempts, 6);
            assert_eq!(config.regions, vec!["ap-southeast-2"]);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if p == &path));
    }

    #[test]
    fn test_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "concurrency = 2").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unparseable_value() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "concurrency = \"lots\"\n")?;
            let err = Config::load(Some(Path::new("config.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Parse));
            // The figment error stays in the tree, naming the offending key.
            let children = err.frame().children();
            assert_eq!(children.len(), 1);
            let cause = children[0].error().downcast_ref::<figment::Error>().unwrap();
            assert!(cause.path.iter().any(|key| key == "concurrency"));
            Ok(())
        });
    }

    #[rstest]
    #[case::no_regions(Config { regions: vec![], ..Config::default() })]
    #[case::bad_region(Config { regions: vec!["us-east-1".into(), "Narnia".into()], ..Config::default() })]
    #[case::zero_concurrency(Config { concurrency: 0, ..Config::default() })]
    #[case::zero_attempts(Config { aws: AwsSettings { max_attempts: 0, ..AwsSettings::default() }, ..Config::default() })]
    #[case::page_too_large(Config { aws: AwsSettings { max_results: Some(1001), ..AwsSettings::default() }, ..Config::default() })]
    #[case::page_empty(Config { aws: AwsSettings { max_results: Some(0), ..AwsSettings::default() }, ..Config::default() })]
    fn test_validation_rejects(#[case] config: Config) {
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_matrix_has_one_scope_per_region() {
        let config = Config {
            regions: vec!["us-east-1".into(), "eu-west-1".into(), "us-east-1".into()],
            ..Config::default()
        };
        let regions: Vec<_> = config
            .matrix()
            .expand()
            .into_iter()
            .map(|scope| scope.region().map(str::to_string))
            .collect();
        assert_eq!(regions, vec![Some("us-east-1".into()), Some("eu-west-1".into())]);
    }
}
