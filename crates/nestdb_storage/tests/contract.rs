//! Contract tests run against every backend.

use nestdb_codec::Value;
use nestdb_storage::{Backend, BackendKind, DocumentBackend, FileBackend, RelationalBackend};
use std::sync::Arc;
use tempfile::TempDir;

/// Builds one instance of each backend, keeping temp dirs alive.
fn backends() -> (TempDir, Vec<Arc<dyn Backend>>) {
    let dir = TempDir::new().unwrap();
    let file = FileBackend::open(&FileBackend::path_in(dir.path(), "contract")).unwrap();
    let relational =
        RelationalBackend::open(&dir.path().join("contract.sqlite"), "contract").unwrap();
    let list: Vec<Arc<dyn Backend>> = vec![
        Arc::new(DocumentBackend::new()),
        Arc::new(relational),
        Arc::new(file),
    ];
    (dir, list)
}

#[tokio::test]
async fn set_get_delete() {
    let (_dir, list) = backends();
    for backend in list {
        let kind = backend.kind();
        backend.set("k", Value::from("v")).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(Value::from("v")), "{kind}");
        backend.delete("k").await.unwrap();
        backend.delete("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None, "{kind}");
    }
}

#[tokio::test]
async fn nested_values_survive_storage() {
    let (_dir, list) = backends();
    let value = Value::map([
        ("name", Value::from("guild")),
        ("members", Value::from(vec![Value::from(1), Value::map([("id", 2)])])),
        ("settings", Value::map([("prefix", Value::from("!")), ("nsfw", Value::from(false))])),
    ]);
    for backend in list {
        backend.set("g", value.clone()).await.unwrap();
        assert_eq!(backend.get("g").await.unwrap(), Some(value.clone()), "{}", backend.kind());
    }
}

#[tokio::test]
async fn all_lists_every_record() {
    let (_dir, list) = backends();
    for backend in list {
        backend.set("a", Value::from(1)).await.unwrap();
        backend.set("b", Value::from("two")).await.unwrap();
        let records = backend.all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["b"], Value::from("two"));

        backend.delete_all().await.unwrap();
        assert!(backend.all().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn counters_respect_backend_rules() {
    let (_dir, list) = backends();
    for backend in list {
        assert_eq!(backend.add("c", 3.0).await.unwrap(), 3.0);
        let result = backend.subtract("c", 5.0).await.unwrap();
        if backend.removes_depleted_counters() {
            assert_eq!(result, 0.0);
            assert_eq!(backend.get("c").await.unwrap(), None);
        } else {
            assert_eq!(backend.kind(), BackendKind::Relational);
            assert_eq!(result, -2.0);
            assert_eq!(backend.get("c").await.unwrap(), Some(Value::from(-2)));
        }
    }
}

#[tokio::test]
async fn priority_operations_keep_out_of_range_unchanged() {
    let (_dir, list) = backends();
    for backend in list {
        backend.push("l", Value::from("a")).await.unwrap();
        backend.push("l", Value::from("b")).await.unwrap();

        let unchanged = backend
            .set_by_priority("l", Value::from("z"), 3)
            .await
            .unwrap();
        assert_eq!(unchanged, Some(vec![Value::from("a"), Value::from("b")]));

        let changed = backend
            .set_by_priority("l", Value::from("z"), 1)
            .await
            .unwrap();
        assert_eq!(changed, Some(vec![Value::from("z"), Value::from("b")]));
        assert_eq!(
            backend.get("l").await.unwrap(),
            Some(Value::from(vec!["z", "b"]))
        );
    }
}

#[tokio::test]
async fn unpush_removes_deep_equal_element() {
    let (_dir, list) = backends();
    for backend in list {
        backend.push("l", Value::map([("id", 1)])).await.unwrap();
        backend.push("l", Value::map([("id", 2)])).await.unwrap();
        let after = backend
            .unpush("l", &Value::map([("id", 1)]))
            .await
            .unwrap();
        assert_eq!(after, Some(Value::from(vec![Value::map([("id", 2)])])));
    }
}

#[tokio::test]
async fn operations_fail_after_disconnect() {
    let (_dir, list) = backends();
    for backend in list {
        backend.disconnect().await.unwrap();
        backend.disconnect().await.unwrap();
        assert!(backend.get("k").await.is_err(), "{}", backend.kind());
    }
}
