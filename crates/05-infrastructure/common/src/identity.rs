//! 引用身份比较
//!
//! 绑定、发布者和观察者都按引用身份区分：两个结构相等的注册仍然是不同的注册。
//! 对 trait object 只比较数据指针，忽略 vtable 指针。

use std::sync::Arc;

/// 引用身份 trait
pub trait Identity {
    /// 身份地址，在对象存活期间唯一
    fn identity(&self) -> usize;

    /// 是否为同一个对象
    fn same_as(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<T: ?Sized> Identity for Arc<T> {
    fn identity(&self) -> usize {
        arc_address(self)
    }
}

/// 获取 `Arc` 指向数据的地址
pub fn arc_address<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc).cast::<()>() as usize
}

/// 两个 `Arc` 是否指向同一个对象
pub fn same_arc<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    arc_address(a) == arc_address(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    #[test]
    fn test_structurally_equal_arcs_are_distinct() {
        let a = Arc::new(String::from("bean"));
        let b = Arc::new(String::from("bean"));

        assert_eq!(a, b);
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a.clone()));
    }

    #[test]
    fn test_trait_objects_compare_by_data_pointer() {
        let value = Arc::new(42_u32);
        let erased: Arc<dyn Debug + Send + Sync> = value.clone();
        let again: Arc<dyn Debug + Send + Sync> = value;

        assert!(same_arc(&erased, &again));
    }
}
