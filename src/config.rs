// 语法配置
//
// JSON 文件，所有字段可省略：
// {
//   "language": "en",
//   "data_dir": "data",
//   "deterministic": true,
//   "lm": false,
//   "max_candidates": 5
// }

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::grammars::MeasureOptions;

/// 目前只有英文语法
pub const SUPPORTED_LANGUAGES: [&str; 1] = ["en"];

fn default_language() -> String {
    "en".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_deterministic() -> bool {
    true
}

fn default_max_candidates() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// 词表目录（相对路径相对于当前工作目录）
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_deterministic")]
    pub deterministic: bool,
    #[serde(default)]
    pub lm: bool,
    /// 非确定模式下每个输入输出的候选数
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            data_dir: default_data_dir(),
            deterministic: default_deterministic(),
            lm: false,
            max_candidates: default_max_candidates(),
        }
    }
}

impl GrammarConfig {
    /// 从 JSON 文件加载并校验
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("加载语法配置: {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {:?}", path))?;
        let config: GrammarConfig = serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误 {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// 写回 JSON 文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("无法写入配置文件 {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            anyhow::bail!("不支持的语言: {}", self.language);
        }
        if self.max_candidates == 0 {
            anyhow::bail!("max_candidates 必须大于 0");
        }
        if self.data_dir.as_os_str().is_empty() {
            anyhow::bail!("data_dir 不能为空");
        }
        Ok(())
    }

    pub fn options(&self) -> MeasureOptions {
        MeasureOptions {
            deterministic: self.deterministic,
            lm: self.lm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: GrammarConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GrammarConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.options(), MeasureOptions::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = GrammarConfig {
            language: "fr".to_string(),
            ..GrammarConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GrammarConfig {
            max_candidates: 0,
            ..GrammarConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grammar.json");
        let config = GrammarConfig {
            deterministic: false,
            lm: true,
            ..GrammarConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GrammarConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grammar.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(GrammarConfig::load(&path).is_err());
        assert!(GrammarConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
