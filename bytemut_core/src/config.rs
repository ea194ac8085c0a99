use crate::mutator::{MutationError, RatioBand};
use crate::range::{ExclusionSet, RangeError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Ratio(#[from] MutationError),
    #[error(transparent)]
    Range(#[from] RangeError),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
struct RawMutationSettings {
    #[serde(default = "default_ratio_min", alias = "ratio_min")]
    ratio_min: f64,
    #[serde(default = "default_ratio_max", alias = "ratio_max")]
    ratio_max: f64,
    #[serde(default, alias = "exclude_ranges")]
    exclude_ranges: Option<Vec<(usize, usize)>>,
}

const DEFAULT_RATIO_MIN: f64 = 0.01;
const DEFAULT_RATIO_MAX: f64 = 0.05;
const DEFAULT_BAND: RatioBand = RatioBand::from_valid_bounds(DEFAULT_RATIO_MIN, DEFAULT_RATIO_MAX);

pub fn default_ratio_min() -> f64 {
    DEFAULT_RATIO_MIN
}
pub fn default_ratio_max() -> f64 {
    DEFAULT_RATIO_MAX
}

/// Validated mutation parameters. Invalid values are rejected when the
/// record is built, never later during mutation.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RawMutationSettings")]
pub struct MutationSettings {
    pub band: RatioBand,
    pub exclusions: ExclusionSet,
}

impl MutationSettings {
    pub fn new(
        ratio_min: f64,
        ratio_max: f64,
        exclude_ranges: Option<Vec<(usize, usize)>>,
    ) -> Result<Self, ConfigError> {
        let band = RatioBand::new(ratio_min, ratio_max)?;
        let exclusions = match exclude_ranges {
            Some(pairs) => ExclusionSet::from_pairs(pairs)?,
            None => ExclusionSet::default(),
        };
        Ok(Self { band, exclusions })
    }
}

impl TryFrom<RawMutationSettings> for MutationSettings {
    type Error = ConfigError;

    fn try_from(raw: RawMutationSettings) -> Result<Self, Self::Error> {
        MutationSettings::new(raw.ratio_min, raw.ratio_max, raw.exclude_ranges)
    }
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self {
            band: DEFAULT_BAND,
            exclusions: ExclusionSet::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct CampaignSettings {
    pub seed_file: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    #[serde(default)]
    pub start_iteration: u64,
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("./bytemut_out")
}

pub fn default_iterations() -> u64 {
    100
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            seed_file: None,
            output_dir: default_output_dir(),
            iterations: default_iterations(),
            start_iteration: 0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct BytemutConfig {
    #[serde(default)]
    pub mutation: MutationSettings,
    #[serde(default)]
    pub campaign: CampaignSettings,
}

impl BytemutConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;
        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::ByteRange;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_uses_defaults() {
        let config = BytemutConfig::from_toml_str("").unwrap();
        assert_eq!(config.mutation.band.min(), 0.01);
        assert_eq!(config.mutation.band.max(), 0.05);
        assert!(config.mutation.exclusions.is_empty());
        assert_eq!(config.campaign.iterations, 100);
        assert_eq!(config.campaign.start_iteration, 0);
        assert_eq!(config.campaign.output_dir, PathBuf::from("./bytemut_out"));
        assert!(config.campaign.seed_file.is_none());
    }

    #[test]
    fn default_band_is_valid() {
        assert_eq!(
            Ok(MutationSettings::default().band),
            RatioBand::new(DEFAULT_RATIO_MIN, DEFAULT_RATIO_MAX)
        );
        assert!(!MutationSettings::default().band.is_zero());
    }

    #[test]
    fn full_document_parses() {
        let config = BytemutConfig::from_toml_str(
            r#"
            [mutation]
            ratio-min = 0.1
            ratio-max = 0.3
            exclude-ranges = [[0, 100], [600, 1000]]

            [campaign]
            seed-file = "seeds/a.bin"
            output-dir = "out"
            iterations = 5
            start-iteration = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.mutation.band, RatioBand::new(0.1, 0.3).unwrap());
        assert_eq!(
            config.mutation.exclusions.ranges(),
            &[
                ByteRange::new(0, 100).unwrap(),
                ByteRange::new(600, 1000).unwrap()
            ]
        );
        assert_eq!(config.campaign.seed_file, Some(PathBuf::from("seeds/a.bin")));
        assert_eq!(config.campaign.iterations, 5);
        assert_eq!(config.campaign.start_iteration, 10);
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let config = BytemutConfig::from_toml_str(
            "[mutation]\nratio_min = 0.2\nratio_max = 0.4\nexclude_ranges = [[1, 2]]\n",
        )
        .unwrap();
        assert_eq!(config.mutation.band.min(), 0.2);
        assert!(!config.mutation.exclusions.is_fuzzable(2));
    }

    #[test]
    fn invalid_values_are_rejected_eagerly() {
        assert!(BytemutConfig::from_toml_str("[mutation]\nratio-min = 0.5\nratio-max = 0.1\n").is_err());
        assert!(BytemutConfig::from_toml_str("[mutation]\nratio-max = 1.5\n").is_err());
        assert!(BytemutConfig::from_toml_str("[mutation]\nexclude-ranges = [[9, 3]]\n").is_err());
        assert!(BytemutConfig::from_toml_str("[mutation]\nbogus = 1\n").is_err());
    }

    #[test]
    fn settings_constructor_reports_error_kind() {
        assert!(matches!(
            MutationSettings::new(0.0, 0.0, None),
            Err(ConfigError::Ratio(MutationError::InvalidRatioBand { .. }))
        ));
        assert!(matches!(
            MutationSettings::new(0.1, 0.2, Some(vec![(5, 1)])),
            Err(ConfigError::Range(RangeError::Inverted { start: 5, end: 1 }))
        ));
    }

    #[test]
    fn load_from_file_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[campaign]\niterations = 3").unwrap();
        let config = BytemutConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.campaign.iterations, 3);

        assert!(BytemutConfig::load_from_file(Path::new("/nonexistent/bytemut.toml")).is_err());
    }
}
