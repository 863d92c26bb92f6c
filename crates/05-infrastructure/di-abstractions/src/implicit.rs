//! 隐式绑定抽象接口
//!
//! 发布者可以通过 [`Publisher::adapt`](crate::Publisher::adapt) 暴露一个
//! [`ImplicitSource`]，用于在没有显式绑定时按需解析具体类型。

use crate::binding::Binding;
use infrastructure_common::{DependencyResult, TypeKey};
use std::fmt::Debug;
use std::sync::Arc;

/// 隐式绑定解析器 trait
pub trait ImplicitResolver: Send + Sync + Debug {
    /// 为具体类型解析一个即时绑定，`Ok(None)` 表示无法解析
    fn resolve(&self, type_key: &TypeKey) -> DependencyResult<Option<Arc<dyn Binding>>>;
}

/// 隐式绑定来源
#[derive(Debug, Clone)]
pub struct ImplicitSource(Arc<dyn ImplicitResolver>);

impl ImplicitSource {
    /// 创建新的隐式绑定来源
    pub fn new(resolver: Arc<dyn ImplicitResolver>) -> Self {
        Self(resolver)
    }

    /// 解析即时绑定
    pub fn resolve(&self, type_key: &TypeKey) -> DependencyResult<Option<Arc<dyn Binding>>> {
        self.0.resolve(type_key)
    }
}
