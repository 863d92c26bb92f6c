//! 定位器配置

use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 定位器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// 没有显式绑定时是否尝试隐式绑定
    pub implicit_bindings: bool,
    /// 是否在每次修改时清理已回收的缓存
    pub compact_on_mutation: bool,
    /// 构建模块时使用的默认主排名
    pub default_publisher_rank: i32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            implicit_bindings: true,
            compact_on_mutation: true,
            default_publisher_rank: 0,
        }
    }
}

impl LocatorConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_publisher_rank < 0 {
            return Err(ConfigError::validation(format!(
                "default_publisher_rank 必须是非负数，实际为 {}",
                self.default_publisher_rank
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LocatorConfig::default();
        assert!(config.implicit_bindings);
        assert!(config.compact_on_mutation);
        assert_eq!(config.default_publisher_rank, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_rank_rejected() {
        let config = LocatorConfig {
            default_publisher_rank: -1,
            ..LocatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
