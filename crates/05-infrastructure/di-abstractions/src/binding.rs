//! 绑定抽象接口

use infrastructure_common::{arc_address, DependencyResult, Qualifier, TypeKey};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// 组件绑定 trait
///
/// 一个类型的一个已注册实现。绑定由外部协作者拥有，定位器只持有引用，
/// 并且始终按引用身份比较。
pub trait Binding: Send + Sync + Debug + 'static {
    /// 绑定的请求类型
    fn type_key(&self) -> &TypeKey;

    /// 绑定的限定符，`None` 表示未限定
    fn qualifier(&self) -> Option<&Qualifier>;

    /// 提供组件实例
    fn provide(&self) -> DependencyResult<Arc<dyn Any + Send + Sync>>;

    /// 实现类型名称
    fn implementation(&self) -> Option<&str> {
        None
    }

    /// 绑定来源描述
    fn source(&self) -> Option<&str> {
        None
    }
}

/// 绑定身份标识
///
/// 只在绑定存活期间有效，持有者必须同时持有绑定本身。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(usize);

impl BindingId {
    /// 获取绑定的身份标识
    pub fn of(binding: &Arc<dyn Binding>) -> Self {
        Self(arc_address(binding))
    }
}
