use toml::{Table, Value};

/// Option keys whose environment value is a list joined by the platform path separator.
const PATH_LIST_KEYS: &[&str] = &["include_dirs"];

/// Overlays environment variables starting with `prefix` + `separator` onto `table`.
///
/// `ZTK__EXTENSION=cfg` with prefix `ZTK` and separator `__` sets `extension`.
/// Further separators nest into sub-tables; segments are lowercased.
pub fn load_env_vars(table: &mut Table, prefix: &str, separator: &str) {
    load_vars(table, std::env::vars(), prefix, separator);
}

fn load_vars(
    table: &mut Table,
    vars: impl IntoIterator<Item = (String, String)>,
    prefix: &str,
    separator: &str,
) {
    if separator.is_empty() {
        return;
    }
    let prefix_with_sep = format!("{prefix}{separator}");

    for (key, value) in vars {
        let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
            continue;
        };
        if path_str.is_empty() {
            continue;
        }

        let path: Vec<String> = path_str
            .split(separator)
            .map(|s| s.to_lowercase())
            .collect();
        let value = coerce_value(path.last().map(String::as_str).unwrap_or(""), &value);
        insert_at_path(table, &path, value);
    }
}

fn coerce_value(key: &str, s: &str) -> Value {
    if PATH_LIST_KEYS.contains(&key) {
        let dirs = std::env::split_paths(s)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| Value::String(p.to_string_lossy().into_owned()))
            .collect();
        return Value::Array(dirs);
    }
    Value::String(s.to_string())
}

fn insert_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        table.insert(first.clone(), value);
        return;
    }
    if !matches!(table.get(first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }
    if let Some(Value::Table(nested)) = table.get_mut(first) {
        insert_at_path(nested, rest, value);
    }
}
