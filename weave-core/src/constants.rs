//! 配置键常量
//!
//! 各 crate 读取 `Environment` 时使用同一组键，避免硬编码不一致

/// 日志级别
pub const LOGGING_LEVEL_KEY: &str = "weave.logging.level";
/// 日志格式：compact / full / json / pretty
pub const LOGGING_FORMAT_KEY: &str = "weave.logging.format";
/// 额外的 tracing 过滤指令
pub const LOGGING_FILTER_KEY: &str = "weave.logging.filter";

/// 生成类名的前缀（默认使用父类名）
pub const PROXY_NAMING_PREFIX_KEY: &str = "weave.proxy.naming-prefix";
/// 是否缓存生成的类
pub const PROXY_CACHE_ENABLED_KEY: &str = "weave.proxy.cache-enabled";

/// 是否启用持久化异常转换
pub const DAO_TRANSLATION_ENABLED_KEY: &str = "weave.dao.translation.enabled";
/// 标记仓储类的注解名称
pub const DAO_REPOSITORY_ANNOTATION_KEY: &str = "weave.dao.repository-annotation";

/// 默认的仓储注解
pub const DEFAULT_REPOSITORY_ANNOTATION: &str = "Repository";
