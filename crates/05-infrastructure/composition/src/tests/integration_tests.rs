//! 定位器构建器集成测试

use super::super::builder::{LocatorBuilder, LoggingConfig};
use di_abstractions::{BeanLocator, MutableBeanLocator, Publisher};
use di_impl::{LocatorConfig, ModuleBindings};
use infrastructure_common::{ConfigError, InfrastructureError, Key, TypeKey};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建带扩展名的临时配置文件
fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults_without_sources() -> anyhow::Result<()> {
    let config = LocatorBuilder::new().load_config()?;
    assert_eq!(config, LocatorConfig::default());
    Ok(())
}

#[test]
fn test_load_toml_config() -> anyhow::Result<()> {
    let file = config_file(
        ".toml",
        r#"
[locator]
implicit_bindings = false
default_publisher_rank = 7
"#,
    );

    let config = LocatorBuilder::new()
        .add_config_file(file.path())?
        .load_config()?;

    assert!(!config.implicit_bindings);
    assert!(config.compact_on_mutation);
    assert_eq!(config.default_publisher_rank, 7);
    Ok(())
}

#[test]
fn test_later_files_override_earlier() -> anyhow::Result<()> {
    let base = config_file(".toml", "[locator]\ndefault_publisher_rank = 1\n");
    let local = config_file(
        ".json",
        r#"{ "locator": { "default_publisher_rank": 3, "compact_on_mutation": false } }"#,
    );

    let config = LocatorBuilder::new()
        .add_config_file(base.path())?
        .add_config_file(local.path())?
        .load_config()?;

    assert_eq!(config.default_publisher_rank, 3);
    assert!(!config.compact_on_mutation);
    Ok(())
}

#[test]
fn test_environment_overrides_file() -> anyhow::Result<()> {
    let file = config_file(".toml", "[locator]\nimplicit_bindings = true\n");
    std::env::set_var("LOCATORTEST_LOCATOR__IMPLICIT_BINDINGS", "false");

    let config = LocatorBuilder::new()
        .add_config_file(file.path())?
        .with_env_prefix("LOCATORTEST")
        .load_config()?;

    std::env::remove_var("LOCATORTEST_LOCATOR__IMPLICIT_BINDINGS");
    assert!(!config.implicit_bindings);
    Ok(())
}

#[test]
fn test_missing_config_file() {
    let result = LocatorBuilder::new().add_config_file("/nonexistent/locator.toml");
    assert!(matches!(
        result,
        Err(InfrastructureError::ConfigError {
            source: ConfigError::FileNotFound { .. }
        })
    ));
}

#[test]
fn test_malformed_config_file() {
    let file = config_file(".toml", "[locator]\ndefault_publisher_rank = \"high\"\n");

    let result = LocatorBuilder::new()
        .add_config_file(file.path())
        .and_then(|builder| builder.load_config());

    assert!(matches!(
        result,
        Err(InfrastructureError::ConfigError {
            source: ConfigError::ParseError { .. }
        })
    ));
}

#[test]
fn test_negative_default_rank_rejected() {
    let file = config_file(".toml", "[locator]\ndefault_publisher_rank = -5\n");

    let result = LocatorBuilder::new()
        .add_config_file(file.path())
        .and_then(|builder| builder.build());

    assert!(matches!(
        result,
        Err(InfrastructureError::ConfigError {
            source: ConfigError::ValidationError { .. }
        })
    ));
}

#[test]
fn test_modules_use_default_rank() -> anyhow::Result<()> {
    let config = LocatorConfig {
        default_publisher_rank: 4,
        ..LocatorConfig::default()
    };
    let explicit: Arc<dyn Publisher> = ModuleBindings::builder("explicit")
        .rank(9)
        .bind_instance(TypeKey::of::<String>(), Arc::new("explicit".to_string()))
        .build()?;

    let locator = LocatorBuilder::new()
        .with_config(config)
        .add_publisher(explicit)
        .add_module(
            ModuleBindings::builder("defaulted")
                .bind_instance(TypeKey::of::<String>(), Arc::new("defaulted".to_string())),
        )
        .build()?;

    assert_eq!(locator.publishers().len(), 2);
    let beans: Vec<_> = locator
        .locate(&Key::of::<String>())
        .into_iter()
        .map(|bean| (bean.rank(), bean.value_as::<String>().unwrap().to_string()))
        .collect();
    assert_eq!(
        beans,
        vec![(9, "explicit".to_string()), (4, "defaulted".to_string())]
    );
    Ok(())
}

#[test]
fn test_logging_initialised_once() {
    let _ = LoggingConfig::development().init();
    let second = LoggingConfig::production().init();
    assert!(matches!(
        second,
        Err(InfrastructureError::BootstrapFailed { .. })
    ));
}
