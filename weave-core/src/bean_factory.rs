//! Bean Factory - Bean 注册表
//!
//! 只保留匹配与代理子系统需要的部分：按名称注册单例、按类型列举 Bean、
//! 注册时应用 BeanPostProcessor。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean_post_processor::BeanPostProcessor;
use crate::error::{ContainerError, ContainerResult};
use crate::reflect::{Class, Instance};

/// BeanFactory - 最基础的容器接口
pub trait BeanFactory: Send + Sync {
    /// 通过名称获取 Bean
    fn get_bean(&self, name: &str) -> ContainerResult<Instance>;

    /// 检查是否包含指定名称的 Bean
    fn contains_bean(&self, name: &str) -> bool;

    /// 获取 Bean 注册时声明的类型
    fn get_bean_class(&self, name: &str) -> Option<Class>;
}

/// ListableBeanFactory - 可列举的 Bean 工厂
pub trait ListableBeanFactory: BeanFactory {
    /// 按注册顺序返回所有 Bean 名称
    fn get_bean_names(&self) -> Vec<String>;

    /// 按注册顺序返回所有 Bean
    fn get_beans(&self) -> Vec<(String, Instance)>;

    fn get_bean_definition_count(&self) -> usize {
        self.get_bean_names().len()
    }
}

/// ListableBeanFactory 的泛型扩展，不能作为 trait object 使用
pub trait ListableBeanFactoryExt: ListableBeanFactory {
    /// 列出所有类型为 `T` 的 Bean（按注册顺序）
    ///
    /// trait object 形式的 Bean 以 `Arc<dyn Trait>` 注册，
    /// 查询时使用 `get_beans_of_type::<Arc<dyn Trait>>()`。
    fn get_beans_of_type<T: Any + Send + Sync + Clone>(&self) -> Vec<(String, T)> {
        self.get_beans()
            .into_iter()
            .filter_map(|(name, bean)| bean.downcast_ref::<T>().cloned().map(|b| (name, b)))
            .collect()
    }

    /// 通过名称获取指定类型的 Bean
    fn get_typed_bean<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.get_bean(name)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }
}

impl<F: ListableBeanFactory + ?Sized> ListableBeanFactoryExt for F {}

struct BeanEntry {
    name: String,
    class: Option<Class>,
    instance: Instance,
}

#[derive(Default)]
struct Beans {
    entries: Vec<BeanEntry>,
    by_name: HashMap<String, usize>,
}

/// DefaultListableBeanFactory - ListableBeanFactory 的默认实现
#[derive(Default)]
pub struct DefaultListableBeanFactory {
    beans: RwLock<Beans>,

    /// Bean 后置处理器列表（按 order 排序）
    bean_post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
}

impl DefaultListableBeanFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 BeanPostProcessor
    pub fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        tracing::debug!("Adding bean post processor: {}", processor.name());
        let mut processors = self.bean_post_processors.write();
        processors.push(processor);
        processors.sort_by_key(|p| p.order());
    }

    pub fn get_bean_post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.bean_post_processors.read().clone()
    }

    /// 注册单例，不经过后置处理器
    pub fn register_singleton<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        bean: T,
    ) -> ContainerResult<()> {
        self.insert(name.into(), None, Arc::new(bean))
    }

    /// 注册带类型元数据的 Bean，依次应用后置处理器
    ///
    /// 返回最终注册的实例（可能已被替换为代理）
    pub fn register_bean(
        &self,
        name: impl Into<String>,
        class: Class,
        bean: Instance,
    ) -> ContainerResult<Instance> {
        let name = name.into();
        if self.contains_bean(&name) {
            return Err(ContainerError::BeanAlreadyExists(name));
        }

        let processors = self.get_bean_post_processors();
        let mut current = bean;
        for processor in &processors {
            current = processor.post_process_before_initialization(current, &name, Some(&class))?;
        }
        for processor in &processors {
            current = processor.post_process_after_initialization(current, &name, Some(&class))?;
        }

        self.insert(name, Some(class), Arc::clone(&current))?;
        Ok(current)
    }

    fn insert(
        &self,
        name: String,
        class: Option<Class>,
        instance: Instance,
    ) -> ContainerResult<()> {
        let mut beans = self.beans.write();
        if beans.by_name.contains_key(&name) {
            return Err(ContainerError::BeanAlreadyExists(name));
        }
        tracing::debug!("Registering bean: '{}'", name);
        let index = beans.entries.len();
        beans.by_name.insert(name.clone(), index);
        beans.entries.push(BeanEntry {
            name,
            class,
            instance,
        });
        Ok(())
    }
}

impl BeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<Instance> {
        tracing::trace!("Requesting bean: '{}'", name);
        let beans = self.beans.read();
        beans
            .by_name
            .get(name)
            .map(|&i| Arc::clone(&beans.entries[i].instance))
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.beans.read().by_name.contains_key(name)
    }

    fn get_bean_class(&self, name: &str) -> Option<Class> {
        let beans = self.beans.read();
        beans
            .by_name
            .get(name)
            .and_then(|&i| beans.entries[i].class.clone())
    }
}

impl ListableBeanFactory for DefaultListableBeanFactory {
    fn get_bean_names(&self) -> Vec<String> {
        self.beans.read().entries.iter().map(|e| e.name.clone()).collect()
    }

    fn get_beans(&self) -> Vec<(String, Instance)> {
        self.beans
            .read()
            .entries
            .iter()
            .map(|e| (e.name.clone(), Arc::clone(&e.instance)))
            .collect()
    }
}

impl std::fmt::Debug for DefaultListableBeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultListableBeanFactory")
            .field("beans", &self.get_bean_names())
            .field("post_processors", &self.bean_post_processors.read().len())
            .finish()
    }
}
