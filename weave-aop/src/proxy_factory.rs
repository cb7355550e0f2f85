//! ProxyFactory：把一组 Advisor 织入目标对象
//!
//! 代理类由 `Enhancer` 生成：有 Advisor 匹配的方法分派到拦截器链，
//! 其余方法直接调用目标对象。拦截器链按方法签名惰性计算并缓存。
//!
//! ```ignore
//! let mut factory = ProxyFactory::new(instance(dao), dao_class);
//! factory.add_advisor(Arc::new(translation_advisor));
//! let proxy = factory.get_proxy()?;
//! let rows = proxy.call("findAll", &[])?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use weave_core::reflect::class_utils::{all_supertypes, is_assignable_from};
use weave_core::{Class, Instance, InvocationError, Method, Signature, Throwable};
use weave_proxy::{
    get_global_class_generator, Callback, ClassGenerator, EnhancedObject, Enhancer, MethodProxy,
};

use crate::advice::MethodInterceptor;
use crate::advisor::{DefaultPointcutAdvisor, PointcutAdvisor};
use crate::aop_utils::find_advisors_that_can_apply;
use crate::error::{AopError, AopResult};
use crate::invocation::{ChainEntry, MethodInvocation};
use crate::pointcut::matches;

/// 代理的配置与拦截器链缓存
struct AdvisedSupport {
    target_class: Class,
    advisors: Vec<Arc<dyn PointcutAdvisor>>,
    chains: RwLock<HashMap<Signature, Arc<[ChainEntry]>>>,
}

impl AdvisedSupport {
    fn is_advised(&self, method: &Method) -> bool {
        self.advisors
            .iter()
            .any(|advisor| matches(advisor.pointcut(), method, &self.target_class))
    }

    fn chain_for(&self, method: &Method) -> Arc<[ChainEntry]> {
        if let Some(chain) = self.chains.read().get(method.signature()) {
            return Arc::clone(chain);
        }

        let chain: Arc<[ChainEntry]> = self
            .advisors
            .iter()
            .filter(|advisor| matches(advisor.pointcut(), method, &self.target_class))
            .map(|advisor| {
                if advisor.pointcut().method_matcher().is_runtime() {
                    ChainEntry::Dynamic {
                        advisor: Arc::clone(advisor),
                        interceptor: advisor.advice(),
                    }
                } else {
                    ChainEntry::Static(advisor.advice())
                }
            })
            .collect();

        tracing::debug!(
            "Interceptor chain for {}::{}: {:?}",
            self.target_class.name(),
            method.signature(),
            chain
        );

        Arc::clone(
            self.chains
                .write()
                .entry(method.signature().clone())
                .or_insert(chain),
        )
    }
}

/// 挂在代理类上的回调，驱动拦截器链
struct AdvisedDispatch {
    advised: Arc<AdvisedSupport>,
}

impl weave_proxy::MethodInterceptor for AdvisedDispatch {
    fn intercept(
        &self,
        obj: &EnhancedObject,
        method: &Method,
        args: &[Instance],
        proxy: &MethodProxy,
    ) -> Result<Instance, Throwable> {
        let chain = self.advised.chain_for(method);
        if chain.is_empty() {
            return proxy.invoke(obj.target(), args);
        }

        let mut invocation = MethodInvocation::new(
            obj,
            method,
            args.to_vec(),
            &self.advised.target_class,
            &chain,
            proxy,
        );
        invocation.proceed()
    }
}

pub struct ProxyFactory {
    target: Instance,
    target_class: Class,
    interfaces: Vec<Class>,
    advisors: Vec<Arc<dyn PointcutAdvisor>>,
    generator: Arc<ClassGenerator>,
    proxy_target_class: bool,
}

impl ProxyFactory {
    /// `target_class` 是目标对象的实际类型
    pub fn new(target: Instance, target_class: Class) -> Self {
        Self::with_generator(Arc::clone(get_global_class_generator()), target, target_class)
    }

    pub fn with_generator(
        generator: Arc<ClassGenerator>,
        target: Instance,
        target_class: Class,
    ) -> Self {
        Self {
            target,
            target_class,
            interfaces: Vec::new(),
            advisors: Vec::new(),
            generator,
            proxy_target_class: true,
        }
    }

    pub fn add_advisor(&mut self, advisor: Arc<dyn PointcutAdvisor>) -> &mut Self {
        self.advisors.push(advisor);
        self
    }

    /// 适用于所有方法的通知
    pub fn add_advice(&mut self, advice: Arc<dyn MethodInterceptor>) -> &mut Self {
        self.add_advisor(Arc::new(DefaultPointcutAdvisor::new(advice)))
    }

    /// 代理类额外实现的接口
    pub fn add_interface(&mut self, interface: &Class) -> &mut Self {
        self.interfaces.push(Arc::clone(interface));
        self
    }

    /// 默认 `true`，代理类继承目标类型；
    /// `false` 时只实现接口，方法实现从目标类型解析
    pub fn set_proxy_target_class(&mut self, proxy_target_class: bool) -> &mut Self {
        self.proxy_target_class = proxy_target_class;
        self
    }

    pub fn is_proxy_target_class(&self) -> bool {
        self.proxy_target_class
    }

    pub fn advisors(&self) -> &[Arc<dyn PointcutAdvisor>] {
        &self.advisors
    }

    fn validate(&self) -> AopResult<()> {
        if self.target_class.is_interface() || self.target_class.is_annotation() {
            return Err(AopError::invalid_argument(format!(
                "target class {} must be the concrete type of the target",
                self.target_class.name()
            )));
        }
        if let Some(bad) = self.interfaces.iter().find(|i| !i.is_interface()) {
            return Err(AopError::invalid_argument(format!(
                "{} is not an interface",
                bad.name()
            )));
        }
        if let Some(missing) = self
            .interfaces
            .iter()
            .find(|i| !is_assignable_from(i, &self.target_class))
        {
            return Err(AopError::invalid_argument(format!(
                "{} does not implement {}",
                self.target_class.name(),
                missing.name()
            )));
        }
        Ok(())
    }

    /// 接口代理实现的接口：显式添加的，否则目标类型的全部接口
    fn proxied_interfaces(&self) -> AopResult<Vec<Class>> {
        let interfaces: Vec<Class> = if self.interfaces.is_empty() {
            all_supertypes(&self.target_class)
                .into_iter()
                .filter(|c| c.is_interface())
                .collect()
        } else {
            self.interfaces.clone()
        };
        if interfaces.is_empty() {
            return Err(AopError::invalid_argument(format!(
                "{} implements no interfaces to proxy",
                self.target_class.name()
            )));
        }
        Ok(interfaces)
    }

    pub fn get_proxy(&self) -> AopResult<AopProxy> {
        self.validate()?;

        let mut advisors = find_advisors_that_can_apply(&self.advisors, &self.target_class);
        advisors.sort_by_key(|advisor| advisor.order());

        let advised = Arc::new(AdvisedSupport {
            target_class: Arc::clone(&self.target_class),
            advisors,
            chains: RwLock::new(HashMap::new()),
        });

        let mut enhancer = Enhancer::with_generator(Arc::clone(&self.generator));
        if self.proxy_target_class {
            enhancer
                .set_superclass(&self.target_class)
                .set_interfaces(self.interfaces.clone());
        } else {
            enhancer
                .set_interfaces(self.proxied_interfaces()?)
                .set_target_class(&self.target_class);
        }

        let filter_support = Arc::clone(&advised);
        enhancer
            .set_callbacks(vec![
                Callback::NoOp,
                Callback::MethodInterceptor(Arc::new(AdvisedDispatch {
                    advised: Arc::clone(&advised),
                })),
            ])
            .set_callback_filter(move |method: &Method| {
                usize::from(filter_support.is_advised(method))
            });

        let proxy = enhancer.create_with_target(Arc::clone(&self.target))?;
        tracing::info!(
            "Created AOP proxy {} for {} ({} advisors)",
            proxy.class().name(),
            self.target_class.name(),
            advised.advisors.len()
        );

        Ok(AopProxy { proxy, advised })
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("target_class", &self.target_class.name())
            .field("advisors", &self.advisors.len())
            .field("proxy_target_class", &self.proxy_target_class)
            .finish()
    }
}

/// AOP 代理
#[derive(Clone)]
pub struct AopProxy {
    proxy: EnhancedObject,
    advised: Arc<AdvisedSupport>,
}

impl AopProxy {
    /// 按方法签名调用
    pub fn invoke(
        &self,
        name: &str,
        parameter_types: &[&str],
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        let signature = Signature::new(name, parameter_types.iter().copied());
        self.proxy.invoke(&signature, args)
    }

    /// 按方法名和参数个数调用
    pub fn call(&self, name: &str, args: &[Instance]) -> Result<Instance, InvocationError> {
        self.proxy.call(name, args)
    }

    /// 生成的代理类
    pub fn proxy_class(&self) -> &Class {
        self.proxy.class()
    }

    pub fn target(&self) -> &Instance {
        self.proxy.target()
    }

    pub fn target_class(&self) -> &Class {
        &self.advised.target_class
    }

    pub fn enhanced(&self) -> &EnhancedObject {
        &self.proxy
    }

    /// 实际生效的 Advisor，按顺序排列
    pub fn advisors(&self) -> &[Arc<dyn PointcutAdvisor>] {
        &self.advised.advisors
    }
}

impl fmt::Debug for AopProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AopProxy")
            .field("class", &self.proxy.class().name())
            .field("target_class", &self.advised.target_class.name())
            .field("advisors", &self.advised.advisors.len())
            .finish()
    }
}
