//! JSON patch-by-path helpers.
//!
//! Stages rewrite a handful of known fields inside artifact files. The
//! paths live as constants next to their callers so the same field is
//! always spelled the same way.

use anyhow::bail;
use serde_json::Value;

/// Set a string at `path`, creating intermediate objects as needed.
pub fn set_string(root: &mut Value, path: &[&str], value: &str) -> anyhow::Result<()> {
    set_value(root, path, Value::String(value.to_string()))
}

pub fn set_number(root: &mut Value, path: &[&str], value: u64) -> anyhow::Result<()> {
    set_value(root, path, Value::Number(value.into()))
}

pub fn set_value(root: &mut Value, path: &[&str], new: Value) -> anyhow::Result<()> {
    let Some((last, parents)) = path.split_last() else {
        bail!("empty patch path");
    };
    let mut node = root;
    for key in parents {
        let obj = match node.as_object_mut() {
            Some(obj) => obj,
            None => bail!("cannot descend into non-object at '{key}'"),
        };
        node = obj
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
    let obj = match node.as_object_mut() {
        Some(obj) => obj,
        None => bail!("cannot set '{last}' on a non-object"),
    };
    obj.insert(last.to_string(), new);
    Ok(())
}

/// Read a string at `path`.
pub fn get_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut node = root;
    for key in path {
        node = node.get(key)?;
    }
    node.as_str()
}
