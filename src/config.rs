//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.timereport.toml` files. Settings layer in order: built-in
//! defaults, then the config file, then CLI flags / environment.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Azure DevOps connection settings.
    #[serde(default)]
    pub azdo: AzdoConfig,

    /// 7pace Timetracker connection settings.
    #[serde(default)]
    pub timehub: TimeHubConfig,

    /// Activity names counted as dev and test time.
    #[serde(default)]
    pub activities: ActivityNames,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Request timeout in seconds, applied to both APIs.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            verbose: false,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Azure DevOps work-item tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzdoConfig {
    /// Service base URL.
    #[serde(default = "default_azdo_base_url")]
    pub base_url: String,

    /// REST API version.
    #[serde(default = "default_azdo_api_version")]
    pub api_version: String,

    /// Organization name.
    #[serde(default)]
    pub org: String,

    /// Project name.
    #[serde(default)]
    pub project: String,

    /// Saved query id (GUID).
    #[serde(default)]
    pub query_id: String,

    /// Personal access token. Prefer the AZDO_PAT environment variable
    /// over storing it here.
    #[serde(default)]
    pub pat: String,
}

impl Default for AzdoConfig {
    fn default() -> Self {
        Self {
            base_url: default_azdo_base_url(),
            api_version: default_azdo_api_version(),
            org: String::new(),
            project: String::new(),
            query_id: String::new(),
            pat: String::new(),
        }
    }
}

fn default_azdo_base_url() -> String {
    "https://dev.azure.com".to_string()
}

fn default_azdo_api_version() -> String {
    "7.0".to_string()
}

/// 7pace Timetracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeHubConfig {
    /// Tenant base URL, e.g. https://acme.timehub.7pace.com
    #[serde(default)]
    pub base_url: String,

    /// OData API version segment.
    #[serde(default = "default_odata_version")]
    pub api_version: String,

    /// API token. Prefer the SEVENPACE_PAT environment variable over
    /// storing it here.
    #[serde(default)]
    pub pat: String,
}

impl Default for TimeHubConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: default_odata_version(),
            pat: String::new(),
        }
    }
}

fn default_odata_version() -> String {
    "v3.2".to_string()
}

/// Display names of the activities counted as dev and test time.
///
/// An empty name matches nothing, so with no names configured every
/// worklog lands in the "other" column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityNames {
    #[serde(default)]
    pub dev: String,

    #[serde(default)]
    pub test: String,
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the timestamped export file is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".timereport.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment fallbacks) take precedence
    /// over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref org) = args.org {
            self.azdo.org = org.clone();
        }
        if let Some(ref project) = args.project {
            self.azdo.project = project.clone();
        }
        if let Some(ref query) = args.query {
            self.azdo.query_id = query.clone();
        }
        if let Some(ref pat) = args.azdo_pat {
            self.azdo.pat = pat.clone();
        }

        if let Some(ref url) = args.timehub_url {
            self.timehub.base_url = url.clone();
        }
        if let Some(ref pat) = args.timehub_pat {
            self.timehub.pat = pat.clone();
        }

        if let Some(ref name) = args.activity_dev {
            self.activities.dev = name.clone();
        }
        if let Some(ref name) = args.activity_test {
            self.activities.test = name.clone();
        }

        if let Some(ref dir) = args.output_dir {
            self.report.output_dir = dir.display().to_string();
        }

        if let Some(timeout) = args.timeout {
            self.general.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check that everything a full export needs is present.
    ///
    /// Runs after the file and CLI layers are merged, so a missing
    /// value here really is missing everywhere.
    pub fn validate(&self) -> Result<()> {
        if self.azdo.org.is_empty() {
            bail!("Missing Azure DevOps organization (--org or AZDO_ORG)");
        }
        if self.azdo.project.is_empty() {
            bail!("Missing Azure DevOps project (--project or AZDO_PROJECT)");
        }
        if self.azdo.query_id.is_empty() {
            bail!("Missing saved query id (--query or QUERY_ID)");
        }
        if self.azdo.pat.is_empty() {
            bail!("Missing Azure DevOps token (--azdo-pat or AZDO_PAT)");
        }
        if self.timehub.base_url.is_empty() {
            bail!("Missing Timetracker URL (--timehub-url or TIMEHUB_URL)");
        }
        if self.timehub.pat.is_empty() {
            bail!("Missing Timetracker token (--timehub-pat or SEVENPACE_PAT)");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.azdo.base_url, "https://dev.azure.com");
        assert_eq!(config.azdo.api_version, "7.0");
        assert_eq!(config.timehub.api_version, "v3.2");
        assert_eq!(config.general.timeout_seconds, 30);
        assert_eq!(config.report.output_dir, ".");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
timeout_seconds = 60
verbose = true

[azdo]
org = "my-org"
project = "my-project"
query_id = "6e5f0a70-1e0f-4c08-9f20-000000000000"

[timehub]
base_url = "https://acme.timehub.7pace.com"

[activities]
dev = "Développement"
test = "Recette"

[report]
output_dir = "exports"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.timeout_seconds, 60);
        assert!(config.general.verbose);
        assert_eq!(config.azdo.org, "my-org");
        assert_eq!(config.azdo.project, "my-project");
        assert_eq!(config.azdo.base_url, "https://dev.azure.com");
        assert_eq!(config.timehub.base_url, "https://acme.timehub.7pace.com");
        assert_eq!(config.activities.dev, "Développement");
        assert_eq!(config.activities.test, "Recette");
        assert_eq!(config.report.output_dir, "exports");
    }

    #[test]
    fn test_merge_with_args_cli_wins() {
        let toml_content = r#"
[azdo]
org = "file-org"
project = "file-project"

[activities]
dev = "Développement"
"#;
        let mut config: Config = toml::from_str(toml_content).unwrap();

        let args = crate::cli::Args {
            org: Some("cli-org".to_string()),
            project: None,
            query: Some("abc".to_string()),
            azdo_pat: None,
            timehub_pat: None,
            timehub_url: None,
            activity_dev: None,
            activity_test: Some("Recette".to_string()),
            output_dir: None,
            config: None,
            timeout: Some(120),
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        };
        config.merge_with_args(&args);

        assert_eq!(config.azdo.org, "cli-org");
        assert_eq!(config.azdo.project, "file-project");
        assert_eq!(config.azdo.query_id, "abc");
        assert_eq!(config.activities.dev, "Développement");
        assert_eq!(config.activities.test, "Recette");
        assert_eq!(config.general.timeout_seconds, 120);
    }

    #[test]
    fn test_validate_reports_missing_values() {
        let config = Config::default();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("AZDO_ORG"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[azdo]"));
        assert!(toml_str.contains("[timehub]"));
        assert!(toml_str.contains("[activities]"));
    }
}
