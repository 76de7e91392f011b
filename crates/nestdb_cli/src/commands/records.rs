//! Record commands.
//!
//! Each command returns the text to print.

use super::CliResult;
use nestdb_codec::{parse_lenient, to_json, to_json_pretty};
use nestdb_core::{Store, Value};
use tracing::debug;

const ABSENT: &str = "(absent)";

fn render(value: Option<Value>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |value| value.to_string())
}

/// Prints the value at `key`.
pub async fn get(store: &Store, key: &str) -> CliResult<String> {
    Ok(render(store.get(key).await?))
}

/// Stores `raw` at `key`.
pub async fn set(store: &Store, key: &str, raw: &str) -> CliResult<String> {
    let value = parse_lenient(raw);
    debug!(key, kind = value.type_name(), "set");
    Ok(store.set(key, value).await?.to_string())
}

/// Deletes `key`.
pub async fn delete(store: &Store, key: &str) -> CliResult<String> {
    store.delete(key).await?;
    Ok(String::new())
}

/// Prints whether `key` holds a truthy value.
pub async fn has(store: &Store, key: &str) -> CliResult<String> {
    Ok(store.has(key).await?.to_string())
}

/// Adds `amount` to the number at `key`.
pub async fn add(store: &Store, key: &str, amount: f64) -> CliResult<String> {
    Ok(Value::from(store.add(key, amount).await?).to_string())
}

/// Subtracts `amount` from the number at `key`.
pub async fn subtract(store: &Store, key: &str, amount: f64) -> CliResult<String> {
    Ok(Value::from(store.subtract(key, amount).await?).to_string())
}

/// Appends `raw` to the array at `key`.
pub async fn push(store: &Store, key: &str, raw: &str) -> CliResult<String> {
    let items = store.push(key, parse_lenient(raw)).await?;
    Ok(Value::Array(items).to_string())
}

/// Removes the first element equal to `raw` from the array at `key`.
pub async fn unpush(store: &Store, key: &str, raw: &str) -> CliResult<String> {
    Ok(render(store.unpush(key, parse_lenient(raw)).await?))
}

/// Prints every record as one JSON object.
pub async fn all(store: &Store, pretty: bool) -> CliResult<String> {
    let records = store.all().await?;
    let text = if pretty {
        to_json_pretty(&records)?
    } else {
        to_json(&records)?
    };
    Ok(text)
}

/// Deletes every record.
pub async fn clear(store: &Store) -> CliResult<String> {
    store.delete_all().await?;
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Target;
    use crate::StoreKind;
    use nestdb_core::Language;
    use tempfile::TempDir;

    fn target(dir: &TempDir) -> Target {
        Target {
            kind: StoreKind::File,
            path: Some(dir.path().to_path_buf()),
            table: "cli".to_string(),
            readable: false,
            language: Language::En,
        }
    }

    #[tokio::test]
    async fn test_set_parses_json_then_text() {
        let dir = TempDir::new().unwrap();
        let store = target(&dir).open().await.unwrap();

        assert_eq!(set(&store, "a.n", "42").await.unwrap(), "42");
        assert_eq!(set(&store, "a.t", "hello").await.unwrap(), "\"hello\"");
        assert_eq!(set(&store, "a.m", r#"{"x":[1]}"#).await.unwrap(), r#"{"x":[1]}"#);
        assert_eq!(get(&store, "a.m.x").await.unwrap(), "[1]");
        assert_eq!(get(&store, "missing").await.unwrap(), ABSENT);
    }

    #[tokio::test]
    async fn test_counters_and_arrays() {
        let dir = TempDir::new().unwrap();
        let store = target(&dir).open().await.unwrap();

        assert_eq!(add(&store, "coins", 5.0).await.unwrap(), "5");
        assert_eq!(subtract(&store, "coins", 2.5).await.unwrap(), "2.5");
        assert_eq!(push(&store, "list", "a").await.unwrap(), r#"["a"]"#);
        assert_eq!(push(&store, "list", "2").await.unwrap(), r#"["a",2]"#);
        assert_eq!(unpush(&store, "list", "a").await.unwrap(), "[2]");
        assert_eq!(has(&store, "list").await.unwrap(), "true");
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = target(&dir).open().await.unwrap();

        set(&store, "a.b", "1").await.unwrap();
        set(&store, "c", "2").await.unwrap();
        delete(&store, "a.b").await.unwrap();
        assert_eq!(all(&store, false).await.unwrap(), r#"{"c":2}"#);

        clear(&store).await.unwrap();
        assert_eq!(all(&store, false).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_values_persist_across_invocations() {
        let dir = TempDir::new().unwrap();
        let store = target(&dir).open().await.unwrap();
        set(&store, "user.name", "ada").await.unwrap();
        store.close().await.unwrap();

        let store = target(&dir).open().await.unwrap();
        assert_eq!(get(&store, "user.name").await.unwrap(), "\"ada\"");
        assert!(all(&store, true).await.unwrap().contains('\n'));
    }

    #[tokio::test]
    async fn test_invalid_key_is_localized() {
        let dir = TempDir::new().unwrap();
        let store = target(&dir).open().await.unwrap();
        let err = get(&store, "").await.unwrap_err();
        assert_ne!(err.localized(Language::En), err.localized(Language::Tr));
    }
}
