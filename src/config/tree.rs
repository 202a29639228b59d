//! Conversion between flat colon-delimited keys and nested TOML tables.

use toml::{Table, Value};

use super::data::{combine_key, ConfigData, KEY_DELIMITER};

/// Builds a nested table from flat keys, splitting each key on `:`.
///
/// Leaves stay strings; [`ValueDeserializer`](super::bind::ValueDeserializer)
/// parses them when a typed field asks for it.
pub fn to_table(data: &ConfigData) -> Table {
    let mut table = Table::new();
    for (key, value) in data.iter() {
        let path: Vec<String> = key.split(KEY_DELIMITER).map(str::to_string).collect();
        merge_at_path(&mut table, &path, Value::String(value.to_string()));
    }
    table
}

/// Flattens a nested table into colon-delimited keys.
///
/// Array elements are keyed by their index (`servers:0`, `servers:1`).
pub fn flatten_table(table: &Table) -> ConfigData {
    let mut data = ConfigData::new();
    for (key, value) in table {
        flatten_value(&mut data, key.clone(), value);
    }
    data
}

/// Returns the subtable at a colon-delimited path, matching segments
/// without regard to case.
pub fn section<'a>(table: &'a Table, path: &str) -> Option<&'a Table> {
    let mut current = table;
    for part in path.split(KEY_DELIMITER) {
        current = current
            .iter()
            .find(|(key, _)| key.to_lowercase() == part.to_lowercase())
            .and_then(|(_, value)| value.as_table())?;
    }
    Some(current)
}

fn flatten_value(data: &mut ConfigData, key: String, value: &Value) {
    match value {
        Value::Table(nested) => {
            for (child, value) in nested {
                flatten_value(data, combine_key(&key, child), value);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(data, combine_key(&key, &index.to_string()), item);
            }
        }
        Value::String(s) => {
            data.insert(key, s.clone());
        }
        Value::Integer(i) => {
            data.insert(key, i.to_string());
        }
        Value::Float(f) => {
            data.insert(key, f.to_string());
        }
        Value::Boolean(b) => {
            data.insert(key, b.to_string());
        }
        Value::Datetime(dt) => {
            data.insert(key, dt.to_string());
        }
    }
}

fn merge_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let first = existing_key(table, first);

    if rest.is_empty() {
        // A scalar never displaces a section already built under the same name.
        if !matches!(table.get(&first), Some(Value::Table(_))) {
            table.insert(first, value);
        }
        return;
    }

    if !matches!(table.get(&first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(&first) {
        merge_at_path(nested, rest, value);
    }
}

/// Reuses the casing of a key already present, so `Server:Host` and
/// `server:Port` land in one table.
fn existing_key(table: &Table, name: &str) -> String {
    let folded = name.to_lowercase();
    table
        .keys()
        .find(|key| key.to_lowercase() == folded)
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_table_nests_on_delimiter() {
        let data: ConfigData = [
            ("Server:Host", "example.com"),
            ("Server:Port", "8080"),
            ("Debug", "true"),
        ]
        .into_iter()
        .collect();

        let table = to_table(&data);

        assert_eq!(table["Server"]["Host"].as_str(), Some("example.com"));
        assert_eq!(table["Server"]["Port"].as_str(), Some("8080"));
        assert_eq!(table["Debug"].as_str(), Some("true"));
    }

    #[test]
    fn test_section_wins_over_scalar_with_same_name() {
        let data: ConfigData = [("A", "scalar"), ("A:b", "nested")].into_iter().collect();

        let table = to_table(&data);

        assert_eq!(table["A"]["b"].as_str(), Some("nested"));
    }

    #[test]
    fn test_keys_differing_in_case_share_a_table() {
        let data: ConfigData = [("Server:Host", "h"), ("server:Port", "1")]
            .into_iter()
            .collect();

        let table = to_table(&data);

        assert_eq!(table.len(), 1);
        assert_eq!(table["Server"]["Host"].as_str(), Some("h"));
        assert_eq!(table["Server"]["Port"].as_str(), Some("1"));
    }

    #[test]
    fn test_flatten_table() {
        let table: Table = toml::from_str(
            r#"
            name = "demo"
            ports = [80, 443]

            [database]
            host = "localhost"
            "#,
        )
        .unwrap();

        let data = flatten_table(&table);

        assert_eq!(data.get("name"), Some("demo"));
        assert_eq!(data.get("ports:0"), Some("80"));
        assert_eq!(data.get("ports:1"), Some("443"));
        assert_eq!(data.get("database:host"), Some("localhost"));
    }

    #[test]
    fn test_section_lookup_ignores_case() {
        let data: ConfigData = [("Outer:Inner:Key", "v")].into_iter().collect();
        let table = to_table(&data);

        let inner = section(&table, "outer:INNER").unwrap();
        assert_eq!(inner["Key"].as_str(), Some("v"));
        assert!(section(&table, "outer:missing").is_none());
    }
}
