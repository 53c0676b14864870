//! Config set folding and debug logging.

use std::fmt;

use serde_json::Value;

use crate::configset::proxy::{ConfigProxy, MetroConfigDelta};
use crate::configset::ConfigSetError;

/// Environment variable that turns on delta logging.
pub const DEBUG_ENV: &str = "EXPO_DEBUG";

/// Mutator run against the recording view.
///
/// Returning `Ok(None)` is the normal contract. `Ok(Some(value))` is only
/// accepted when `value` is the config it was handed (or falsy).
pub type ConfigSetFn =
    Box<dyn Fn(&mut ConfigProxy<'_>) -> Result<Option<Value>, ConfigSetError> + Send + Sync>;

/// A named, composable config mutation.
pub struct ConfigSet {
    pub name: String,
    pub config: Option<ConfigSetFn>,
}

impl ConfigSet {
    pub fn new<F>(name: impl Into<String>, config: F) -> Self
    where
        F: Fn(&mut ConfigProxy<'_>) -> Result<Option<Value>, ConfigSetError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            config: Some(Box::new(config)),
        }
    }

    /// A set with nothing to apply.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: None,
        }
    }
}

impl fmt::Debug for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSet")
            .field("name", &self.name)
            .field("config", &self.config.is_some())
            .finish()
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Apply one config set to `config`, appending its deltas.
pub fn apply_config_set(
    config: &mut Value,
    set: &ConfigSet,
    deltas: &mut Vec<MetroConfigDelta>,
) -> Result<(), ConfigSetError> {
    let Some(apply) = &set.config else {
        return Ok(());
    };

    let mut proxy = ConfigProxy::new(config, &set.name, deltas);
    match apply(&mut proxy)? {
        Some(returned) if !is_falsy(&returned) && &returned != proxy.value() => {
            Err(ConfigSetError::UnexpectedReturn(set.name.clone()))
        }
        _ => Ok(()),
    }
}

fn compose(base: Value, sets: &[ConfigSet]) -> Result<(Value, Vec<MetroConfigDelta>), ConfigSetError> {
    let mut config = base;
    let mut deltas = Vec::new();
    for set in sets {
        apply_config_set(&mut config, set, &mut deltas)?;
    }
    Ok((config, deltas))
}

/// Whether `EXPO_DEBUG=true` is set.
pub fn is_debug_enabled() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|v| v == "true")
}

/// Fold `sets` over `base` in order.
pub fn create_config(base: Value, sets: &[ConfigSet]) -> Result<Value, ConfigSetError> {
    if is_debug_enabled() {
        return create_config_with_debug(base, sets).map(|(config, _)| config);
    }
    compose(base, sets).map(|(config, _)| config)
}

/// Like [`create_config`], but logs and returns every delta.
pub fn create_config_with_debug(
    base: Value,
    sets: &[ConfigSet],
) -> Result<(Value, Vec<MetroConfigDelta>), ConfigSetError> {
    let (config, deltas) = compose(base, sets)?;
    for delta in &deltas {
        tracing::info!(target: "manifest_server::configset", "{}", delta);
    }
    tracing::debug!(sets = sets.len(), deltas = deltas.len(), "Config composed");
    Ok((config, deltas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_minify(name: &str, minify: bool) -> ConfigSet {
        ConfigSet::new(name, move |config| {
            config.set("transformer.minify", minify)?;
            Ok(None)
        })
    }

    #[test]
    fn test_sets_apply_in_order() {
        let base = json!({ "transformer": {} });
        let (config, deltas) = create_config_with_debug(
            base,
            &[set_minify("first", true), set_minify("second", false)],
        )
        .unwrap();

        assert_eq!(config, json!({ "transformer": { "minify": false } }));
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].name, "first");
        assert_eq!(deltas[1].name, "second");
        assert_eq!(deltas[1].value_prev.as_ref(), Some(&deltas[0].value_next));
        assert_eq!(deltas[1].property, "transformer.minify");
    }

    #[test]
    fn test_empty_set_is_skipped() {
        let config = create_config(json!({ "a": 1 }), &[ConfigSet::empty("noop")]).unwrap();
        assert_eq!(config, json!({ "a": 1 }));
    }

    #[test]
    fn test_returning_same_config_is_allowed() {
        let set = ConfigSet::new("same", |config| {
            config.set("a", 2)?;
            Ok(Some(config.value().clone()))
        });
        let falsy = ConfigSet::new("falsy", |_| Ok(Some(Value::Null)));
        let config = create_config(json!({ "a": 1 }), &[set, falsy]).unwrap();
        assert_eq!(config, json!({ "a": 2 }));
    }

    #[test]
    fn test_returning_other_config_is_rejected() {
        let set = ConfigSet::new("rogue", |_| Ok(Some(json!({ "brand": "new" }))));
        let err = create_config(json!({ "a": 1 }), &[set]).unwrap_err();
        assert!(matches!(err, ConfigSetError::UnexpectedReturn(ref name) if name == "rogue"));
    }

    #[test]
    fn test_error_stops_composition() {
        let failing = ConfigSet::new("failing", |_| {
            Err(ConfigSetError::Failed {
                name: "failing".into(),
                message: "bad".into(),
            })
        });
        let after = ConfigSet::new("after", |config| {
            config.set("reached", true)?;
            Ok(None)
        });
        let mut config = json!({});
        let mut deltas = Vec::new();
        assert!(apply_config_set(&mut config, &failing, &mut deltas).is_err());
        assert!(create_config(json!({}), &[failing, after]).is_err());
        assert!(deltas.is_empty());
    }
}
