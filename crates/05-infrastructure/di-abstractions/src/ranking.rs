//! 排名策略抽象接口

use crate::binding::Binding;
use std::fmt::Debug;

/// 绑定排名函数 trait
pub trait RankingFunction: Send + Sync + Debug {
    /// 该函数可能分配的最高排名
    fn max_rank(&self) -> i32;

    /// 为绑定分配排名，数值越高优先级越高
    fn rank(&self, binding: &dyn Binding) -> i32;
}
