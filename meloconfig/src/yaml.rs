//! Helpers on YAML trees addressed by key paths
//!
//! Keys are compared lower-cased: `config.yaml` may use any case, lookups
//! and writes always go through the lower-cased form.

use anyhow::{anyhow, Result};
use serde_yaml::{Mapping, Value};

fn key(segment: &str) -> Value {
    Value::String(segment.to_lowercase())
}

/// Value at `path`, or an error naming the first segment that is missing
pub(crate) fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(root, |node, (depth, segment)| {
        let map = node
            .as_mapping()
            .ok_or_else(|| anyhow!("{} is not a mapping", path[..depth].join(".")))?;
        map.get(&key(segment))
            .ok_or_else(|| anyhow!("{} is not set", path[..=depth].join(".")))
    })
}

/// Store `value` at `path`, creating intermediate mappings
pub(crate) fn assign(root: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    let mut node = root;
    for segment in parents {
        let map = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("cannot descend into {}: not a mapping", segment))?;
        node = map
            .entry(key(segment))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }
    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("cannot set {}: parent is not a mapping", last))?
        .insert(key(last), value);
    Ok(())
}

/// Overlay `external` on `base`
///
/// Mappings merge key by key; anything else in `external` replaces what
/// `base` holds.
pub(crate) fn merge(base: &mut Value, external: &Value) {
    match (base, external) {
        (Value::Mapping(base_map), Value::Mapping(ext_map)) => {
            for (k, v) in ext_map {
                match base_map.get_mut(k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        base_map.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (slot, other) => *slot = other.clone(),
    }
}

/// Lower-case every string key, recursively
pub(crate) fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

/// Environment values are YAML when they parse as YAML, plain strings otherwise
pub(crate) fn parse_env_value(raw: &str) -> Value {
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
