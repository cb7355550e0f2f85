//! 生成缓存
//!
//! 每类生成物（FastClass、构造器委托、增强类、BeanCopier、BulkBean）各有一个
//! `GenerationCache`。同一个键在并发首次访问时也只会生成一次：
//!
//! - 命中路径只持有读锁
//! - 未命中时在写锁下为该键插入一个空的 `OnceCell`，随即释放写锁
//! - 生成在 `OnceCell::get_or_try_init` 中进行，同键的其它线程在此等待
//!
//! 生成失败时错误同步返回给调用方，仍为空的单元从表中移除，不缓存任何中间状态。

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use crate::beans::{BeanCopierClass, BulkBeanClass};
use crate::constructor_delegate::DelegateClass;
use crate::enhancer::{EnhancedClass, EnhancerKey};
use crate::fast_class::FastClass;
use crate::settings::ProxySettings;

/// 按键缓存的生成结果
pub struct GenerationCache<K, V> {
    name: &'static str,
    entries: RwLock<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
    generations: AtomicUsize,
}

impl<K, V> GenerationCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
            generations: AtomicUsize::new(0),
        }
    }

    /// 获取或生成
    ///
    /// `generate` 对每个键最多成功执行一次。
    pub fn get_or_generate<E, F>(&self, key: &K, generate: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let cell = self.cell(key);

        if let Some(value) = cell.get() {
            tracing::trace!("{} cache hit: {:?}", self.name, key);
            return Ok(Arc::clone(value));
        }

        let result = cell
            .get_or_try_init(|| {
                tracing::debug!("{} cache miss, generating: {:?}", self.name, key);
                let value = generate()?;
                self.generations.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(value))
            })
            .map(Arc::clone);

        if result.is_err() {
            self.discard_empty(key, &cell);
        }
        result
    }

    /// 不经过缓存直接生成，仍计入生成次数
    pub fn generate_uncached<E, F>(&self, generate: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let value = generate()?;
        self.generations.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(value))
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<Arc<V>>> {
        if let Some(cell) = self.entries.read().get(key) {
            return Arc::clone(cell);
        }

        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// 移除生成失败后仍为空的单元；已被其它线程替换或填充的条目保留
    fn discard_empty(&self, key: &K, cell: &Arc<OnceCell<Arc<V>>>) {
        let mut entries = self.entries.write();
        let stale = entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && current.get().is_none());
        if stale {
            entries.remove(key);
            tracing::trace!("{} discarded failed entry: {:?}", self.name, key);
        }
    }

    /// 已成功生成的次数
    pub fn generation_count(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    /// 已生成的条目数
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .read()
            .get(key)
            .map(|cell| cell.get().is_some())
            .unwrap_or(false)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// 全局类生成器
///
/// 未显式传入生成器的调用点（`FastClass::create`、`Enhancer::new` 等）使用它
static GLOBAL_CLASS_GENERATOR: Lazy<Arc<ClassGenerator>> =
    Lazy::new(|| Arc::new(ClassGenerator::new(ProxySettings::default())));

/// 获取全局类生成器
pub fn get_global_class_generator() -> &'static Arc<ClassGenerator> {
    &GLOBAL_CLASS_GENERATOR
}

/// 类生成器
///
/// 聚合所有生成缓存，可以作为显式依赖传给需要生成类的调用点，
/// 测试中通常每个用例创建独立的实例。
pub struct ClassGenerator {
    settings: ProxySettings,
    fast_classes: GenerationCache<u64, FastClass>,
    delegates: GenerationCache<(u64, u64), DelegateClass>,
    enhanced: GenerationCache<EnhancerKey, EnhancedClass>,
    copiers: GenerationCache<(u64, u64, bool), BeanCopierClass>,
    bulk_beans: GenerationCache<(u64, Vec<String>, Vec<String>, Vec<String>), BulkBeanClass>,
}

impl ClassGenerator {
    pub fn new(settings: ProxySettings) -> Self {
        Self {
            settings,
            fast_classes: GenerationCache::new("FastClass"),
            delegates: GenerationCache::new("ConstructorDelegate"),
            enhanced: GenerationCache::new("Enhancer"),
            copiers: GenerationCache::new("BeanCopier"),
            bulk_beans: GenerationCache::new("BulkBean"),
        }
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// 按配置决定是否走缓存
    pub(crate) fn generate<K, V, E, F>(
        &self,
        cache: &GenerationCache<K, V>,
        key: &K,
        use_cache: bool,
        generate: F,
    ) -> Result<Arc<V>, E>
    where
        K: Eq + Hash + Clone + Debug,
        F: FnOnce() -> Result<V, E>,
    {
        if use_cache {
            cache.get_or_generate(key, generate)
        } else {
            cache.generate_uncached(generate)
        }
    }

    pub fn fast_class_cache(&self) -> &GenerationCache<u64, FastClass> {
        &self.fast_classes
    }

    pub fn delegate_cache(&self) -> &GenerationCache<(u64, u64), DelegateClass> {
        &self.delegates
    }

    pub fn enhancer_cache(&self) -> &GenerationCache<EnhancerKey, EnhancedClass> {
        &self.enhanced
    }

    pub fn bean_copier_cache(&self) -> &GenerationCache<(u64, u64, bool), BeanCopierClass> {
        &self.copiers
    }

    pub fn bulk_bean_cache(
        &self,
    ) -> &GenerationCache<(u64, Vec<String>, Vec<String>, Vec<String>), BulkBeanClass> {
        &self.bulk_beans
    }

    /// 所有缓存的生成次数之和
    pub fn generation_count(&self) -> usize {
        self.fast_classes.generation_count()
            + self.delegates.generation_count()
            + self.enhanced.generation_count()
            + self.copiers.generation_count()
            + self.bulk_beans.generation_count()
    }
}

impl Default for ClassGenerator {
    fn default() -> Self {
        Self::new(ProxySettings::default())
    }
}
