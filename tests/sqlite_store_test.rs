// ==========================================
// SQLite 文档存储集成测试
// ==========================================
// 测试目标: 重启后数据保留、历史记录解码、批次原子性
// ==========================================

mod test_helpers;

use chrono::{TimeZone, Utc};
use dealer_yard_ops::app::AppState;
use dealer_yard_ops::domain::UnitState;
use dealer_yard_ops::repository::{DocumentStore, SqliteDocumentStore, WriteBatch};
use serde_json::json;
use test_helpers::{create_test_db, receive_request};

#[tokio::test]
async fn test_yard_survives_reopen() {
    let (_temp_file, db_path) = create_test_db().unwrap();

    {
        let state = AppState::new(db_path.clone()).await.unwrap();
        state
            .yard_api
            .receive(receive_request("1TPQ205", "st-james", "SRP19", ""))
            .await
            .unwrap();
    }

    let state = AppState::new(db_path).await.unwrap();
    let units = state.yard_api.list_yard("St James").await.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].unit.chassis, "1TPQ205");
    assert_eq!(units[0].model_range, "SRP");
    assert_eq!(
        state.yard_api.list_yard_dealers().await.unwrap(),
        vec!["st-james".to_string()]
    );
}

#[tokio::test]
async fn test_legacy_records_decode_and_unknown_are_skipped() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).await.unwrap();
    let store = state.engine.store().store().clone();

    store
        .set(
            "yardstock/st-james/OLD1",
            json!({
                "chassisNo": "old1",
                "Model": "SRC19E",
                "customerName": "Yard Stock",
                "dateReceived": "2024-01-02"
            }),
        )
        .await
        .unwrap();
    store
        .set(
            "yardstock/st-james/PEND1",
            json!({ "chassis": "PEND1", "source": "pending-approval" }),
        )
        .await
        .unwrap();
    store
        .set("yardstock/st-james/JUNK", json!({ "foo": 1 }))
        .await
        .unwrap();
    store
        .set("yardstock/st-james/SCALAR", json!("not a record"))
        .await
        .unwrap();

    let units = state.engine.store().list_yard_units("st-james").await.unwrap();
    assert_eq!(units.len(), 2);

    let old = units.iter().find(|u| u.chassis == "OLD1").unwrap();
    assert_eq!(old.model, "SRC19E");
    assert_eq!(old.state, UnitState::YardStock);
    assert_eq!(
        old.received_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
    );

    let pending = units.iter().find(|u| u.chassis == "PEND1").unwrap();
    assert_eq!(pending.state, UnitState::YardPending);
}

#[tokio::test]
async fn test_batch_rolls_back_on_invalid_path() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let store = SqliteDocumentStore::new(&db_path).unwrap();

    let batch = WriteBatch::new()
        .set("yardstock/st-james/C1", json!({ "chassis": "C1" }))
        .set("yardstock//broken", json!({ "chassis": "C2" }));
    assert!(store.commit(batch).await.is_err());
    assert!(store.get("yardstock/st-james/C1").await.unwrap().is_none());

    let batch = WriteBatch::new()
        .set("yardstock/st-james/C1", json!({ "chassis": "C1", "model": "SRP19" }))
        .remove("pgirecord/C1");
    store.commit(batch).await.unwrap();
    assert_eq!(
        store.get("yardstock/st-james/C1/model").await.unwrap(),
        Some(json!("SRP19"))
    );
    assert_eq!(store.child_keys("yardstock").unwrap(), vec!["st-james".to_string()]);
}
