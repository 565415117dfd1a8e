//! 距離計算の既定値をまとめた設定と、RON 形式での読み書き。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    geometry::constants::JB_CLOSE_THRESHOLD,
};

/// 破壊面の離散化やサイトの絞り込みに使う値。
///
/// 欠けている項目は既定値で補う。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 破壊面メッシュの間隔（km）
    pub mesh_spacing: f64,
    /// これより遠いサイトは計算から外す（Rjb、km）
    pub integration_distance: f64,
    /// Rjb を投影平面上で求めるサイトの距離の上限（km）
    pub jb_close_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mesh_spacing: 1.0,
            integration_distance: 200.0,
            jb_close_threshold: JB_CLOSE_THRESHOLD,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_ron_str(&contents)
    }

    /// 親ディレクトリがなければ作成してから書き込む。
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(ConfigError::WriteError)?;
        }
        std::fs::write(path, self.to_ron_string()?).map_err(ConfigError::WriteError)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(ConfigError::ParseError)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
        ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_serializes() {
        let ron_str = Config::default().to_ron_string().unwrap();
        assert!(ron_str.contains("integration_distance: 200.0"));
        assert!(ron_str.contains("jb_close_threshold: 40.0"));
    }

    #[test]
    fn missing_field_uses_default() {
        let config = Config::from_ron_str("(mesh_spacing: 5.0)").unwrap();
        assert_eq!(config.mesh_spacing, 5.0);
        assert_eq!(config.integration_distance, 200.0);
    }

    #[test]
    fn comments_and_unknown_fields_are_accepted() {
        let config = Config::from_ron_str("// 設定\n(future_setting: true)").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_ron_is_parse_error() {
        assert!(matches!(
            Config::from_ron_str("{{not valid}}"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("geo.ron");
        let config = Config {
            mesh_spacing: 2.5,
            integration_distance: 300.0,
            jb_close_threshold: 20.0,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(&dir.path().join("absent.ron")),
            Err(ConfigError::ReadError(_))
        ));
    }
}
