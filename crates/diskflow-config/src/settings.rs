//! DiskFlow settings file schema

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// diskflow.yaml の内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub provider: ProviderSettings,

    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub volume: VolumeSettings,

    /// 作成するリソースに付与する追加タグ
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    pub region: String,

    /// 省略時は instance_id のゾーンを使用
    #[serde(default)]
    pub zone: Option<String>,

    #[serde(default)]
    pub instance_id: Option<String>,

    /// aliyun CLI のプロファイル名
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollSettings {
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    #[serde(default = "default_max_secs")]
    pub max_secs: u64,
}

fn default_delay_secs() -> u64 {
    5
}

fn default_max_secs() -> u64 {
    600
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            max_secs: default_max_secs(),
        }
    }
}

impl PollSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSettings {
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_encrypted")]
    pub encrypted: bool,
}

fn default_category() -> String {
    "cloud_ssd".to_string()
}

fn default_encrypted() -> bool {
    true
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            category: default_category(),
            encrypted: default_encrypted(),
        }
    }
}

impl Settings {
    /// YAML 文字列から読み込み、検証する
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let settings: Settings =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.region.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "provider.region が空です".to_string(),
            ));
        }
        if self.poll.delay_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll.delay_secs は 1 以上を指定してください".to_string(),
            ));
        }
        if self.poll.delay_secs >= self.poll.max_secs {
            return Err(ConfigError::Invalid(format!(
                "poll.delay_secs ({}) は poll.max_secs ({}) より小さくしてください",
                self.poll.delay_secs, self.poll.max_secs
            )));
        }
        if self.volume.category.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "volume.category が空です".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Settings> {
        Settings::from_yaml(yaml, Path::new("diskflow.yaml"))
    }

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = parse("provider:\n  region: cn-hangzhou\n").unwrap();

        assert_eq!(settings.provider.region, "cn-hangzhou");
        assert_eq!(settings.provider.zone, None);
        assert_eq!(settings.poll, PollSettings::default());
        assert_eq!(settings.poll.delay(), Duration::from_secs(5));
        assert_eq!(settings.volume.category, "cloud_ssd");
        assert!(settings.volume.encrypted);
        assert!(settings.tags.is_empty());
    }

    #[test]
    fn test_full_settings() {
        let yaml = r#"
provider:
  region: cn-hangzhou
  zone: cn-hangzhou-h
  instance_id: i-abc
  profile: backup
poll:
  delay_secs: 2
  max_secs: 120
volume:
  category: cloud_essd
  encrypted: false
tags:
  team: storage
"#;
        let settings = parse(yaml).unwrap();

        assert_eq!(settings.provider.zone.as_deref(), Some("cn-hangzhou-h"));
        assert_eq!(settings.provider.instance_id.as_deref(), Some("i-abc"));
        assert_eq!(settings.provider.profile.as_deref(), Some("backup"));
        assert_eq!(settings.poll.max_duration(), Duration::from_secs(120));
        assert_eq!(settings.volume.category, "cloud_essd");
        assert!(!settings.volume.encrypted);
        assert_eq!(settings.tags.get("team").map(String::as_str), Some("storage"));
    }

    /// 待機間隔が上限以上の設定は拒否される
    #[test]
    fn test_delay_must_be_below_max() {
        let yaml = "provider:\n  region: r\npoll:\n  delay_secs: 10\n  max_secs: 10\n";
        assert!(matches!(parse(yaml), Err(ConfigError::Invalid(_))));

        let yaml = "provider:\n  region: r\npoll:\n  delay_secs: 0\n";
        assert!(matches!(parse(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_region_rejected() {
        assert!(matches!(
            parse("provider:\n  region: \"\"\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let result = parse("provider:\n  region: r\n  regoin: typo\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
