//! 生成类的命名策略
//!
//! 格式：`<prefix>$$<Source>ByWeave$$<hash>`，prefix 默认为被代理的类型名。
//! 相同的缓存键总是得到相同的名称。

use weave_core::reflect::class_utils::GENERATED_CLASS_SEPARATOR;
use weave_core::utils::naming::stable_hash;

const TAG: &str = "ByWeave";

/// 生成类名
///
/// `source` 是生成器名称，例如 `Enhancer`、`FastClass`；
/// `key` 是缓存键的文本形式，用来计算后缀。
pub fn generated_class_name(prefix: &str, source: &str, key: &str) -> String {
    // 用户类型可能已经是生成类，只保留最外层的用户名称
    let prefix = prefix
        .split(GENERATED_CLASS_SEPARATOR)
        .next()
        .filter(|p| !p.is_empty())
        .unwrap_or("weave.Generated");

    format!(
        "{prefix}{sep}{source}{TAG}{sep}{hash}",
        sep = GENERATED_CLASS_SEPARATOR,
        hash = stable_hash(key)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_name_format() {
        let name = generated_class_name("app.Person", "Enhancer", "k1");
        assert!(name.starts_with("app.Person$$EnhancerByWeave$$"));
        assert_eq!(name, generated_class_name("app.Person", "Enhancer", "k1"));
        assert_ne!(name, generated_class_name("app.Person", "Enhancer", "k2"));
    }

    #[test]
    fn test_generated_name_strips_previous_suffix() {
        let inner = generated_class_name("Person", "Enhancer", "a");
        let outer = generated_class_name(&inner, "FastClass", "b");
        assert!(outer.starts_with("Person$$FastClassByWeave$$"));
        assert!(generated_class_name("", "Enhancer", "a").starts_with("weave.Generated$$"));
    }
}
