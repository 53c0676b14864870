//! Mutation-recording view over a bundler config tree.
//!
//! A [`ConfigProxy`] is handed to each config set. Every `set` / `delete`
//! made through it is applied to the underlying JSON tree and recorded as a
//! [`MetroConfigDelta`] under the dotted property path.

use std::fmt;

use serde_json::{Map, Value};

use crate::configset::ConfigSetError;

static NULL: Value = Value::Null;

/// One observed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetroConfigDelta {
    /// Name of the config set that made the change.
    pub name: String,
    /// Dotted path, e.g. `resolver.sourceExts`.
    pub property: String,
    /// `None` when the property did not exist.
    pub value_prev: Option<Value>,
    /// `null` when the property was deleted.
    pub value_next: Value,
}

fn render(value: &Option<Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "undefined".to_string(),
    }
}

impl fmt::Display for MetroConfigDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]: {}: {} -> {}",
            self.name,
            self.property,
            render(&self.value_prev),
            self.value_next
        )
    }
}

fn lookup<'v>(mut node: &'v Value, path: &[String]) -> Option<&'v Value> {
    for key in path {
        node = match node {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

fn lookup_mut<'v>(mut node: &'v mut Value, path: &[String]) -> Option<&'v mut Value> {
    for key in path {
        node = match node {
            Value::Object(map) => map.get_mut(key)?,
            Value::Array(items) => items.get_mut(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Recording view rooted at some path inside the config tree.
pub struct ConfigProxy<'a> {
    root: &'a mut Value,
    name: &'a str,
    base: Vec<String>,
    deltas: &'a mut Vec<MetroConfigDelta>,
}

impl<'a> ConfigProxy<'a> {
    pub(crate) fn new(root: &'a mut Value, name: &'a str, deltas: &'a mut Vec<MetroConfigDelta>) -> Self {
        Self {
            root,
            name,
            base: Vec::new(),
            deltas,
        }
    }

    fn full_path(&self, key: &str) -> Result<Vec<String>, ConfigSetError> {
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(ConfigSetError::InvalidPath(key.to_string()));
        }
        let mut path = self.base.clone();
        path.extend(key.split('.').map(str::to_string));
        Ok(path)
    }

    /// Dotted path of this view, empty at the root.
    pub fn parent_key(&self) -> String {
        self.base.join(".")
    }

    /// The subtree this view is rooted at.
    pub fn value(&self) -> &Value {
        lookup(self.root, &self.base).unwrap_or(&NULL)
    }

    /// Read a (dotted) property relative to this view.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let path = self.full_path(key).ok()?;
        lookup(self.root, &path)
    }

    /// A view over a nested object or array.
    pub fn child(&mut self, key: &str) -> Result<ConfigProxy<'_>, ConfigSetError> {
        let path = self.full_path(key)?;
        if !matches!(lookup(self.root, &path), Some(Value::Object(_) | Value::Array(_))) {
            return Err(ConfigSetError::NotAContainer(path.join(".")));
        }
        Ok(ConfigProxy {
            root: &mut *self.root,
            name: self.name,
            base: path,
            deltas: &mut *self.deltas,
        })
    }

    /// Set a (dotted) property, creating missing parent objects.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfigSetError> {
        let path = self.full_path(key)?;
        for depth in self.base.len() + 1..path.len() {
            if lookup(self.root, &path[..depth]).is_none() {
                self.assign(&path[..depth], Value::Object(Map::new()))?;
            }
        }
        self.assign(&path, value.into())
    }

    /// Append to the array at `key`.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfigSetError> {
        let len = match self.get(key) {
            Some(Value::Array(items)) => items.len(),
            _ => return Err(ConfigSetError::NotAContainer(key.to_string())),
        };
        self.set(&format!("{key}.{len}"), value)
    }

    /// Remove a (dotted) property. Returns the previous value.
    pub fn delete(&mut self, key: &str) -> Result<Option<Value>, ConfigSetError> {
        let path = self.full_path(key)?;
        let property = path.join(".");
        let (leaf, parents) = path
            .split_last()
            .ok_or_else(|| ConfigSetError::InvalidPath(key.to_string()))?;

        let prev = match lookup_mut(self.root, parents) {
            Some(Value::Object(map)) => map.remove(leaf),
            Some(Value::Array(items)) => match leaf.parse::<usize>() {
                Ok(index) if index < items.len() => Some(items.remove(index)),
                _ => None,
            },
            Some(_) => return Err(ConfigSetError::NotAContainer(parents.join("."))),
            None => None,
        };

        self.deltas.push(MetroConfigDelta {
            name: self.name.to_string(),
            property,
            value_prev: prev.clone(),
            value_next: Value::Null,
        });
        Ok(prev)
    }

    fn assign(&mut self, path: &[String], value: Value) -> Result<(), ConfigSetError> {
        let property = path.join(".");
        let (leaf, parents) = path
            .split_last()
            .ok_or_else(|| ConfigSetError::InvalidPath(property.clone()))?;

        let prev = match lookup_mut(self.root, parents) {
            Some(Value::Object(map)) => map.insert(leaf.clone(), value.clone()),
            Some(Value::Array(items)) => {
                let index = leaf
                    .parse::<usize>()
                    .map_err(|_| ConfigSetError::InvalidPath(property.clone()))?;
                if index < items.len() {
                    Some(std::mem::replace(&mut items[index], value.clone()))
                } else if index == items.len() {
                    items.push(value.clone());
                    None
                } else {
                    return Err(ConfigSetError::InvalidPath(property));
                }
            }
            _ => return Err(ConfigSetError::NotAContainer(parents.join("."))),
        };

        self.deltas.push(MetroConfigDelta {
            name: self.name.to_string(),
            property,
            value_prev: prev,
            value_next: value,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_records_dotted_path() {
        let mut config = json!({ "resolver": { "sourceExts": ["js"] } });
        let mut deltas = Vec::new();
        {
            let mut proxy = ConfigProxy::new(&mut config, "web", &mut deltas);
            let mut resolver = proxy.child("resolver").unwrap();
            assert_eq!(resolver.parent_key(), "resolver");
            resolver.push("sourceExts", "mjs").unwrap();
            resolver.set("unstable_enablePackageExports", true).unwrap();
        }

        assert_eq!(config["resolver"]["sourceExts"], json!(["js", "mjs"]));
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].property, "resolver.sourceExts.1");
        assert_eq!(deltas[0].value_prev, None);
        assert_eq!(deltas[1].to_string(), "[web]: resolver.unstable_enablePackageExports: undefined -> true");
    }

    #[test]
    fn test_set_creates_parents() {
        let mut config = json!({});
        let mut deltas = Vec::new();
        ConfigProxy::new(&mut config, "a", &mut deltas)
            .set("transformer.minifierConfig.compress", false)
            .unwrap();

        assert_eq!(config, json!({ "transformer": { "minifierConfig": { "compress": false } } }));
        let props: Vec<&str> = deltas.iter().map(|d| d.property.as_str()).collect();
        assert_eq!(props, ["transformer", "transformer.minifierConfig", "transformer.minifierConfig.compress"]);
    }

    #[test]
    fn test_delete_records_removal() {
        let mut config = json!({ "server": { "port": 8081 } });
        let mut deltas = Vec::new();
        let prev = ConfigProxy::new(&mut config, "strip", &mut deltas)
            .delete("server.port")
            .unwrap();

        assert_eq!(prev, Some(json!(8081)));
        assert_eq!(config, json!({ "server": {} }));
        assert_eq!(deltas[0].value_next, Value::Null);
        assert_eq!(deltas[0].to_string(), "[strip]: server.port: 8081 -> null");
    }

    #[test]
    fn test_invalid_paths() {
        let mut config = json!({ "port": 1 });
        let mut deltas = Vec::new();
        let mut proxy = ConfigProxy::new(&mut config, "x", &mut deltas);
        assert!(matches!(proxy.set("", 1), Err(ConfigSetError::InvalidPath(_))));
        assert!(matches!(proxy.set("a..b", 1), Err(ConfigSetError::InvalidPath(_))));
        assert!(matches!(proxy.set("port.inner", 1), Err(ConfigSetError::NotAContainer(_))));
        assert!(matches!(proxy.child("port"), Err(ConfigSetError::NotAContainer(_))));
    }
}
