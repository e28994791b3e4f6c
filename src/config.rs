//! 配置：显式列出所有可识别选项及默认值，未知字段在构造时报错

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 缩进上限，超过视为配置错误
pub const MAX_INDENT: usize = 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("配置无效: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// 写入 JSON 时的缩进空格数
    pub indent: usize,
    /// 加载时资源不存在是否创建空的 `{}` 文件
    pub create_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            create_missing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// 会话结束时是否（强制）写回来源资源
    pub write_on_close: bool,
    /// 手动 `save` 时是否覆盖已有内容
    pub overwrite: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            write_on_close: true,
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub editor: EditorConfig,
}

impl Config {
    /// 从 JSON 文本构造配置，缺省字段取默认值
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(v: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_value(v)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.indent > MAX_INDENT {
            return Err(ConfigError::Invalid(format!(
                "indent 不能超过 {}，当前为 {}",
                MAX_INDENT, self.store.indent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.store.indent, 4);
        assert!(config.store.create_missing);
        assert!(config.editor.write_on_close);
        assert!(!config.editor.overwrite);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_value(json!({
            "store": {"indent": 2},
            "editor": {"write_on_close": false}
        }))
        .unwrap();
        assert_eq!(config.store.indent, 2);
        assert!(config.store.create_missing, "未指定的字段保持默认值");
        assert!(!config.editor.write_on_close);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(Config::from_json_str(r#"{"do_print": true}"#), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::from_json_str(r#"{"store": {"force": true}}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_json_str(r#"{"store": {"indent": "four"}}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"store": {"indent": 40}}"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}
