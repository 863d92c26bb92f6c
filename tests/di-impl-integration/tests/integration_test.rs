//! 组件定位器集中集成测试：并发、隐式绑定与端到端场景

use di_abstractions::{
    BeanLocator, Binding, ImplicitResolver, MutableBeanLocator, Publisher, Subscriber,
};
use di_impl::{ComponentBinding, ConstructorResolver, DefaultBeanLocator, LocatorConfig, ModuleBindings};
use infrastructure_common::{DependencyError, DependencyResult, Key, TypeKey};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Once};
use std::thread;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 测试用的仓储组件
#[derive(Debug, PartialEq)]
struct Repository {
    name: String,
}

impl Repository {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

fn repository_module(name: &str, rank: i32) -> DependencyResult<Arc<ModuleBindings>> {
    ModuleBindings::builder(name)
        .rank(rank)
        .bind_instance(TypeKey::of::<Repository>(), Arc::new(Repository::new(name)))
        .build()
}

/// 记录订阅次数的发布者
#[derive(Debug)]
struct CountingPublisher {
    binding: Arc<dyn Binding>,
    rank: i32,
    subscriptions: AtomicUsize,
}

impl CountingPublisher {
    fn new(name: &str, rank: i32) -> Arc<Self> {
        Arc::new(Self {
            binding: ComponentBinding::instance(
                TypeKey::of::<Repository>(),
                Arc::new(Repository::new(name)),
            )
            .into_binding(),
            rank,
            subscriptions: AtomicUsize::new(0),
        })
    }
}

impl Publisher for CountingPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> DependencyResult<()> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        // 放大并发窗口
        thread::yield_now();
        if subscriber.type_key() == self.binding.type_key() {
            subscriber.add(Arc::clone(&self.binding), self.rank);
        }
        Ok(())
    }

    fn unsubscribe(&self, subscriber: Arc<dyn Subscriber>) -> DependencyResult<()> {
        subscriber.remove(&self.binding);
        Ok(())
    }

    fn max_binding_rank(&self) -> i32 {
        self.rank
    }
}

#[test]
fn test_concurrent_lookups_subscribe_each_publisher_once() -> anyhow::Result<()> {
    init_test_logger();
    let locator = DefaultBeanLocator::new();
    let publishers: Vec<_> = (0..6)
        .map(|i| CountingPublisher::new(&format!("repo-{i}"), i * 10))
        .collect();
    for publisher in &publishers {
        locator.add(publisher.clone())?;
    }

    let key = Key::of::<Repository>();
    // 保持类型绑定存活，让所有线程共享同一份
    let _shared = locator.locate(&key);
    let barrier = Barrier::new(12);

    thread::scope(|scope| {
        for _ in 0..12 {
            let (locator, key, barrier) = (&locator, &key, &barrier);
            scope.spawn(move || {
                barrier.wait();
                let ranks: Vec<_> = locator.locate(key).iter().map(|bean| bean.rank()).collect();
                assert_eq!(ranks, vec![50, 40, 30, 20, 10, 0]);
            });
        }
    });

    for publisher in &publishers {
        assert_eq!(publisher.subscriptions.load(Ordering::SeqCst), 1);
    }
    Ok(())
}

#[test]
fn test_iteration_stays_ordered_during_mutation() -> anyhow::Result<()> {
    init_test_logger();
    let locator = DefaultBeanLocator::new();
    let stable: Arc<dyn Publisher> = repository_module("stable", 25)?;
    locator.add(Arc::clone(&stable))?;

    let key = Key::of::<Repository>();
    let located = locator.locate(&key);
    let done = AtomicBool::new(false);

    let (locator, located, done) = (&locator, &located, &done);
    thread::scope(|scope| {
        scope.spawn(move || {
            for round in 0..200 {
                let module: Arc<dyn Publisher> =
                    repository_module(&format!("transient-{round}"), round % 50).unwrap();
                locator.add(Arc::clone(&module)).unwrap();
                if round % 2 == 0 {
                    locator.remove(&module).unwrap();
                }
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            scope.spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let ranks: Vec<_> = located.iter().map(|bean| bean.rank()).collect();
                    assert!(ranks.windows(2).all(|pair| pair[0] >= pair[1]));
                }
            });
        }
    });

    // 偶数轮的模块已被移除，剩下 100 个临时模块和一个稳定模块
    let names: Vec<_> = located
        .iter()
        .map(|bean| bean.value_as::<Repository>().unwrap().name.clone())
        .collect();
    assert_eq!(names.len(), 101);
    assert!(names.iter().any(|name| name == "stable"));
    assert!(!names.iter().any(|name| name == "transient-0"));
    assert!(names.iter().any(|name| name == "transient-1"));
    Ok(())
}

#[test]
fn test_concurrent_add_of_same_publisher() -> anyhow::Result<()> {
    let locator = DefaultBeanLocator::new();
    let publisher: Arc<dyn Publisher> = repository_module("shared", 0)?;
    let barrier = Barrier::new(8);
    let accepted = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..8 {
            let (locator, publisher, barrier, accepted) = (&locator, &publisher, &barrier, &accepted);
            scope.spawn(move || {
                barrier.wait();
                if locator.add(Arc::clone(publisher)).unwrap() {
                    accepted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(locator.publishers().len(), 1);
    Ok(())
}

/// 总是解析失败的隐式解析器
#[derive(Debug)]
struct FailingResolver;

impl ImplicitResolver for FailingResolver {
    fn resolve(&self, type_key: &TypeKey) -> DependencyResult<Option<Arc<dyn Binding>>> {
        Err(DependencyError::ImplicitResolutionFailed {
            type_name: type_key.name().to_string(),
            message: "缺少构造依赖".to_string(),
        })
    }
}

fn implicit_locator(config: LocatorConfig) -> anyhow::Result<DefaultBeanLocator> {
    let locator = DefaultBeanLocator::with_config(config);
    let failing = ModuleBindings::builder("failing")
        .rank(10)
        .implicit(Arc::new(FailingResolver))
        .build()?;
    let resolver = ConstructorResolver::new().register(|| Ok(Repository::new("implicit")));
    let constructing = ModuleBindings::builder("constructing")
        .implicit(Arc::new(resolver))
        .build()?;
    locator.add(failing)?;
    locator.add(constructing)?;
    Ok(locator)
}

#[test]
fn test_implicit_fallback_skips_failing_candidates() -> anyhow::Result<()> {
    init_test_logger();
    let locator = implicit_locator(LocatorConfig::default())?;

    let beans: Vec<_> = locator.locate(&Key::of::<Repository>()).into_iter().collect();

    assert_eq!(beans.len(), 1);
    assert_eq!(beans[0].rank(), i32::MIN);
    assert_eq!(*beans[0].value_as::<Repository>()?, Repository::new("implicit"));
    assert!(beans[0].source().is_some_and(|source| source.starts_with("implicit")));
    Ok(())
}

#[test]
fn test_implicit_fallback_only_for_unqualified_keys() -> anyhow::Result<()> {
    let locator = implicit_locator(LocatorConfig::default())?;

    assert!(locator.locate(&Key::of::<Repository>().named("primary")).is_empty());
    assert!(locator.locate(&Key::of::<Repository>().any_named()).is_empty());
    Ok(())
}

#[test]
fn test_implicit_fallback_disabled_by_config() -> anyhow::Result<()> {
    let config = LocatorConfig {
        implicit_bindings: false,
        ..LocatorConfig::default()
    };
    let locator = implicit_locator(config)?;

    assert!(locator.locate(&Key::of::<Repository>()).is_empty());
    Ok(())
}

#[test]
fn test_explicit_bindings_suppress_implicit_fallback() -> anyhow::Result<()> {
    let locator = implicit_locator(LocatorConfig::default())?;
    locator.add(repository_module("explicit", 0)?)?;

    let names: Vec<_> = locator
        .locate(&Key::of::<Repository>())
        .into_iter()
        .map(|bean| bean.value_as::<Repository>().unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["explicit"]);
    Ok(())
}

#[test]
fn test_remove_evicts_beans_from_live_lookups() -> anyhow::Result<()> {
    let config = LocatorConfig {
        implicit_bindings: false,
        ..LocatorConfig::default()
    };
    let locator = DefaultBeanLocator::with_config(config);
    let first: Arc<dyn Publisher> = repository_module("first", 1)?;
    let second: Arc<dyn Publisher> = repository_module("second", 2)?;
    locator.add(Arc::clone(&first))?;
    locator.add(Arc::clone(&second))?;

    let located = locator.locate(&Key::of::<Repository>());
    assert_eq!(located.iter().count(), 2);

    assert!(locator.remove(&second)?);
    let top = located.first().unwrap();
    assert_eq!(top.value_as::<Repository>()?.name, "first");

    locator.clear()?;
    assert!(located.is_empty());
    Ok(())
}
