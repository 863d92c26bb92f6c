//! 发布者与订阅者抽象接口
//!
//! 发布者是独立生命周期的绑定来源（例如加载或卸载的模块）；订阅者是定位器一侧
//! 接收绑定的对象。

use crate::binding::Binding;
use infrastructure_common::{DependencyResult, TypeKey};
use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

/// 绑定发布者 trait
pub trait Publisher: Send + Sync + Debug + 'static {
    /// 订阅：发布者把与订阅者类型匹配的绑定推送给订阅者
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> DependencyResult<()>;

    /// 取消订阅：发布者撤回之前推送给订阅者的绑定
    fn unsubscribe(&self, subscriber: Arc<dyn Subscriber>) -> DependencyResult<()>;

    /// 该发布者可能分配的最高排名
    fn max_binding_rank(&self) -> i32;

    /// 适配为其他类型，例如底层的隐式绑定解析器
    fn adapt(&self, _target: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        None
    }
}

/// 绑定订阅者 trait
pub trait Subscriber: Send + Sync + 'static {
    /// 订阅的请求类型
    fn type_key(&self) -> &TypeKey;

    /// 添加一个带排名的绑定
    fn add(&self, binding: Arc<dyn Binding>, rank: i32);

    /// 按身份移除绑定
    fn remove(&self, binding: &Arc<dyn Binding>);

    /// 当前跟踪的绑定快照
    fn bindings(&self) -> Vec<Arc<dyn Binding>>;
}

/// 将发布者适配为指定类型
pub fn adapt<A: Any + Send + Sync>(publisher: &dyn Publisher) -> Option<Arc<A>> {
    publisher.adapt(TypeId::of::<A>())?.downcast::<A>().ok()
}
