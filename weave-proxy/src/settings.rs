//! 代理生成配置

use weave_core::constants::{PROXY_CACHE_ENABLED_KEY, PROXY_NAMING_PREFIX_KEY};
use weave_core::Environment;

/// 代理生成配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// 生成类名前缀，未设置时使用被代理的类型名
    pub naming_prefix: Option<String>,
    /// 是否缓存生成结果
    pub cache_enabled: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            naming_prefix: None,
            cache_enabled: true,
        }
    }
}

impl ProxySettings {
    /// 从 Environment 读取
    ///
    /// - `weave.proxy.naming-prefix`
    /// - `weave.proxy.cache-enabled`，默认 true
    pub fn from_environment(environment: &Environment) -> Self {
        let naming_prefix = environment
            .get_string(PROXY_NAMING_PREFIX_KEY)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Self {
            naming_prefix,
            cache_enabled: environment.get_bool_or(PROXY_CACHE_ENABLED_KEY, true),
        }
    }

    pub fn with_naming_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming_prefix = Some(prefix.into());
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}
