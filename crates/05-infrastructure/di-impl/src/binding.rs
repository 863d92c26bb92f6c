//! 组件绑定实现

use di_abstractions::Binding;
use infrastructure_common::{DependencyResult, Qualifier, TypeKey};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// 组件提供函数类型
pub type ProviderFn =
    Arc<dyn Fn() -> DependencyResult<Arc<dyn Any + Send + Sync>> + Send + Sync>;

enum Provision {
    Instance(Arc<dyn Any + Send + Sync>),
    Factory(ProviderFn),
}

/// 组件绑定
///
/// 把请求类型绑定到一个现成实例或一个工厂函数上。
pub struct ComponentBinding {
    type_key: TypeKey,
    qualifier: Option<Qualifier>,
    implementation: &'static str,
    source: Option<String>,
    provision: Provision,
}

impl ComponentBinding {
    /// 绑定到现成实例
    pub fn instance<T>(type_key: TypeKey, instance: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            type_key,
            qualifier: None,
            implementation: type_name::<T>(),
            source: None,
            provision: Provision::Instance(instance),
        }
    }

    /// 绑定到工厂函数，实例在首次访问组件条目时创建
    pub fn factory<T, F>(type_key: TypeKey, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        let provider: ProviderFn =
            Arc::new(move || factory().map(|instance| instance as Arc<dyn Any + Send + Sync>));
        Self {
            type_key,
            qualifier: None,
            implementation: type_name::<T>(),
            source: None,
            provision: Provision::Factory(provider),
        }
    }

    /// 绑定到已擦除类型的提供函数
    pub fn provider(type_key: TypeKey, implementation: &'static str, provider: ProviderFn) -> Self {
        Self {
            type_key,
            qualifier: None,
            implementation,
            source: None,
            provision: Provision::Factory(provider),
        }
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// 设置命名限定符
    pub fn named(self, name: impl Into<String>) -> Self {
        self.with_qualifier(Qualifier::named(name))
    }

    /// 设置来源描述
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 转换为共享的绑定对象
    pub fn into_binding(self) -> Arc<dyn Binding> {
        Arc::new(self)
    }
}

impl Binding for ComponentBinding {
    fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    fn provide(&self) -> DependencyResult<Arc<dyn Any + Send + Sync>> {
        match &self.provision {
            Provision::Instance(instance) => Ok(Arc::clone(instance)),
            Provision::Factory(factory) => factory(),
        }
    }

    fn implementation(&self) -> Option<&str> {
        Some(self.implementation)
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl fmt::Debug for ComponentBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let provision = match self.provision {
            Provision::Instance(_) => "<instance>",
            Provision::Factory(_) => "<function>",
        };
        f.debug_struct("ComponentBinding")
            .field("type_key", &self.type_key)
            .field("qualifier", &self.qualifier)
            .field("implementation", &self.implementation)
            .field("source", &self.source)
            .field("provision", &provision)
            .finish()
    }
}
