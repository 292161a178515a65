//! 配置文本 → `EmitterConfig`
//!
//! 格式由文件扩展名决定。未知键直接报错，拼错的 `queue_sise`
//! 不会被静默忽略成默认值。

use std::path::Path;

use contracts::{ContractError, EmitterConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 按扩展名识别（不区分大小写）
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine config format of {}",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// 解析但不校验
    pub fn parse(self, content: &str) -> Result<EmitterConfig, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| parse_error("TOML", e)),
            Self::Json => serde_json::from_str(content).map_err(|e| parse_error("JSON", e)),
        }
    }
}

fn parse_error<E>(format: &str, e: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("{format} parse error: {e}"),
        source: Some(Box::new(e)),
    }
}
