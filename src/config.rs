//! 配置模块，负责加载JSON配置文件

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::session::Mode;

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
#[error("配置错误: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 编译器配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 列名前缀, 表示右侧的值是原始SQL
    pub escape_marker: char,
    /// 关键字前缀, 例如 `$OR`、`$<`
    pub keyword_prefix: char,
    /// 默认执行模式
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escape_marker: '#',
            keyword_prefix: '$',
            mode: Mode::Execute,
        }
    }
}

impl Config {
    /// 从JSON文件加载配置, 缺少的字段使用默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            ConfigError::new(format!(
                "无法解析JSON配置文件 {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        if config.escape_marker == config.keyword_prefix {
            return Err(ConfigError::new(format!(
                "转义标记和关键字前缀不能相同: {}",
                config.escape_marker
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn test_load_valid_json_config() {
        let path = write_temp(
            "dictsql_config_valid.json",
            r#"{"escape_marker": "!", "mode": "render_only"}"#,
        );

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.escape_marker, '!');
        assert_eq!(config.keyword_prefix, '$');
        assert_eq!(config.mode, Mode::RenderOnly);

        // 清理
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_json_config() {
        let path = write_temp("dictsql_config_invalid.json", "invalid json");
        let result = Config::from_json_file(&path);
        assert!(result.is_err());
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_clashing_markers() {
        let path = write_temp(
            "dictsql_config_clash.json",
            r#"{"escape_marker": "$"}"#,
        );
        assert!(Config::from_json_file(&path).is_err());
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_json_file("non_existent_file.json");
        assert!(result.unwrap_err().to_string().contains("配置文件不存在"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.escape_marker, '#');
        assert_eq!(config.keyword_prefix, '$');
        assert_eq!(config.mode, Mode::Execute);
    }
}
