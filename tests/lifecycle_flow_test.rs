// ==========================================
// 车架生命周期集成测试
// ==========================================
// 测试目标: 入场 → 交付全流程、交付中断与意图清扫
// ==========================================

mod test_helpers;

use chrono::Duration;
use dealer_yard_ops::config::LifecyclePolicy;
use dealer_yard_ops::domain::{
    DispatchIntent, HandoverRecord, ReasonInput, ReconciliationReason, UnitState, UnitType,
};
use dealer_yard_ops::engine::{ClassifiedUnit, DispatchRequest, LifecycleError, ManualAddRequest};
use dealer_yard_ops::feed::{CsvScheduleFeed, StoreScheduleFeed};
use dealer_yard_ops::repository::DocumentStore;
use serde_json::json;
use test_helpers::{base_time, in_transit, memory_engine, receive_request};

fn dispatch_request(chassis: &str, dealer: &str) -> DispatchRequest {
    DispatchRequest {
        chassis: chassis.to_string(),
        dealer: dealer.to_string(),
        ..DispatchRequest::default()
    }
}

#[tokio::test]
async fn test_receive_then_dispatch() {
    let (memory, clock, engine) = memory_engine(LifecyclePolicy::default());
    engine
        .store()
        .put_in_transit(&in_transit("1TPQ205", "St James", "SRP19"))
        .await
        .unwrap();

    // 入场
    let outcome = engine
        .receive(receive_request("1tpq205", "st-james", "SRP19", ""))
        .await
        .expect("receive should succeed");
    assert_eq!(outcome.unit.chassis, "1TPQ205");
    assert_eq!(outcome.unit.state, UnitState::YardStock);
    assert_eq!(outcome.unit.received_at, Some(base_time()));

    let classified = ClassifiedUnit::classify(outcome.unit.clone());
    assert_eq!(classified.unit_type, UnitType::Stock);
    assert_eq!(classified.model_range, "SRP");

    let raw = memory
        .get("yardstock/st-james/1TPQ205")
        .await
        .unwrap()
        .expect("yard record should exist");
    assert!(raw.get("receivedAt").is_some());
    assert!(memory.get("pgirecord/1TPQ205").await.unwrap().is_none());

    // 交付
    clock.advance(Duration::days(3));
    let record = engine
        .dispatch(dispatch_request("1TPQ205", "st-james"))
        .await
        .expect("dispatch should succeed");
    assert_eq!(record.handover_at, base_time() + Duration::days(3));
    assert_eq!(record.model, "SRP19");

    assert!(memory.get("yardstock/st-james/1TPQ205").await.unwrap().is_none());
    let handovers = engine.store().list_handovers("st-james").await.unwrap();
    assert_eq!(handovers.len(), 1);
    assert!(engine.store().list_intents().await.unwrap().is_empty());

    let audit = engine.audit_yard("st-james").await.unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.yard_count, 0);
}

#[tokio::test]
async fn test_dealer_slug_legacy_suffix_is_same_yard() {
    let (_memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    engine
        .receive(receive_request("C100", "frankston-a1b2c3", "NGC22", "Jane Citizen"))
        .await
        .unwrap();

    let units = engine.store().list_yard_units("frankston").await.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(ClassifiedUnit::classify(units[0].clone()).unit_type, UnitType::Customer);
}

#[tokio::test]
async fn test_returned_dealer_slug_round_trips() {
    let (_memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    let outcome = engine
        .receive(receive_request("C1", "green-valley-x1y2z3", "SRP19", ""))
        .await
        .unwrap();
    let slug = outcome.unit.dealer_slug.clone();
    assert_eq!(slug, "green-valley");

    // 引擎返回的 slug 再次传入时不能被再去一次后缀
    let audit = engine.audit_yard(&slug).await.unwrap();
    assert_eq!(audit.dealer, "green-valley");
    assert_eq!(audit.yard_count, 1);

    let dealers = engine.store().list_yard_dealers().await.unwrap();
    assert_eq!(dealers, vec!["green-valley".to_string()]);
    assert_eq!(engine.audit_yard(&dealers[0]).await.unwrap().yard_count, 1);

    let record = engine.dispatch(dispatch_request("C1", &slug)).await.unwrap();
    assert_eq!(record.dealer_slug, "green-valley");
    assert!(engine.store().list_yard_units("green-valley").await.unwrap().is_empty());
    assert!(engine.store().list_yard_units("green").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_feed_receive_keeps_single_suffix_strip() {
    let (_memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    engine
        .store()
        .put_in_transit(&in_transit("G1", "Green Valley", "NGC22"))
        .await
        .unwrap();
    let feed = StoreScheduleFeed::new(engine.store().clone());

    let outcome = engine
        .receive_from_feed("G1", "green-valley-x1y2z3", &feed)
        .await
        .unwrap();
    assert_eq!(outcome.unit.dealer_slug, "green-valley");
    assert_eq!(engine.store().list_yard_units("green-valley").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_lowercase_legacy_key_stays_single_record() {
    let (memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    memory
        .set(
            "yardstock/st-james/1tpq205",
            json!({ "chassisNumber": "1tpq205", "Model": "SRP19" }),
        )
        .await
        .unwrap();

    let err = engine
        .manual_add(ManualAddRequest {
            chassis: "1TPQ205".to_string(),
            dealer: "st-james".to_string(),
            reason: Some(ReasonInput::new(ReconciliationReason::Show)),
            ..ManualAddRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyInYard { .. }));

    let outcome = engine
        .receive(receive_request("1TPQ205", "st-james", "SRP19", ""))
        .await
        .unwrap();
    assert!(outcome.replaced_existing);

    let units = engine.store().list_yard_units("st-james").await.unwrap();
    assert_eq!(units.len(), 1);
    assert!(memory.get("yardstock/st-james/1tpq205").await.unwrap().is_none());

    engine.dispatch(dispatch_request("1TPQ205", "st-james")).await.unwrap();
    assert!(engine.store().list_yard_units("st-james").await.unwrap().is_empty());
    assert_eq!(engine.store().list_handovers("st-james").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dispatch_removes_lowercase_legacy_key() {
    let (memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    memory
        .set(
            "yardstock/st-james/c7",
            json!({ "chassis": "c7", "model": "NGB21" }),
        )
        .await
        .unwrap();

    let record = engine.dispatch(dispatch_request("C7", "st-james")).await.unwrap();
    assert_eq!(record.chassis, "C7");
    assert_eq!(record.model, "NGB21");
    assert!(memory.get("yardstock/st-james").await.unwrap().is_none());

    let err = engine.dispatch(dispatch_request("c7", "st-james")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyDispatched { .. }));
}

#[tokio::test]
async fn test_dispatch_interrupted_then_recovered() {
    let (memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    engine
        .receive(receive_request("C1", "st-james", "SRC21", ""))
        .await
        .unwrap();

    // 交付记录写入失败: 驻场已删，意图保留
    memory.fail_writes_under("handover");
    let err = engine
        .dispatch(dispatch_request("C1", "st-james"))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::StoreWriteFailed(_)));
    assert!(engine.store().get_yard_unit("st-james", "C1").await.unwrap().is_none());

    let audit = engine.audit_yard("st-james").await.unwrap();
    assert_eq!(audit.pending_intents, vec!["C1".to_string()]);

    // 清扫补写交付记录
    memory.clear_faults();
    let sweep = engine.recover_pending_dispatches().await.unwrap();
    assert_eq!(sweep.scanned, 1);
    assert_eq!(sweep.completed, vec!["st-james/C1".to_string()]);
    assert!(sweep.is_clean());

    let handover = engine.store().get_handover("st-james", "C1").await.unwrap();
    assert!(handover.is_some());
    assert!(engine.store().list_intents().await.unwrap().is_empty());

    // 幂等: 再次清扫无事可做
    let sweep = engine.recover_pending_dispatches().await.unwrap();
    assert_eq!(sweep.scanned, 0);
}

#[tokio::test]
async fn test_dispatch_remove_failure_keeps_unit() {
    let (memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    engine
        .receive(receive_request("C2", "st-james", "SRC21", ""))
        .await
        .unwrap();

    memory.fail_writes_under("yardstock");
    let err = engine
        .dispatch(dispatch_request("C2", "st-james"))
        .await
        .unwrap_err();
    assert!(err.is_store_failure());

    memory.clear_faults();
    let unit = engine.store().get_yard_unit("st-james", "C2").await.unwrap();
    assert_eq!(unit.map(|u| u.state), Some(UnitState::YardStock));
    assert!(engine.store().get_handover("st-james", "C2").await.unwrap().is_none());
    assert!(engine.store().list_intents().await.unwrap().is_empty());
}

fn leftover_intent(chassis: &str, dealer: &str) -> DispatchIntent {
    DispatchIntent {
        intent_id: format!("intent-{}", chassis),
        created_at: base_time(),
        handover: HandoverRecord {
            chassis: chassis.to_string(),
            dealer_slug: dealer.to_string(),
            dealer_name: "St James".to_string(),
            model: "SRP19".to_string(),
            customer: String::new(),
            handover_at: base_time(),
            source: "PGI".to_string(),
        },
    }
}

#[tokio::test]
async fn test_sweep_rolls_back_and_acknowledges() {
    let (_memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    let store = engine.store();

    // 驻场记录仍在 → 回滚
    engine
        .receive(receive_request("R1", "st-james", "SRP19", ""))
        .await
        .unwrap();
    store.put_intent(&leftover_intent("R1", "st-james")).await.unwrap();

    // 交付记录已存在 → 只清意图
    let done = leftover_intent("D1", "st-james");
    store.put_handover(&done.handover).await.unwrap();
    store.put_intent(&done).await.unwrap();

    let sweep = engine.recover_pending_dispatches().await.unwrap();
    assert_eq!(sweep.scanned, 2);
    assert_eq!(sweep.rolled_back, vec!["st-james/R1".to_string()]);
    assert_eq!(sweep.already_done, vec!["st-james/D1".to_string()]);
    assert!(sweep.completed.is_empty());

    // 回滚的车架保持在场
    let unit = store.get_yard_unit("st-james", "R1").await.unwrap();
    assert_eq!(unit.map(|u| u.state), Some(UnitState::YardStock));
    assert!(store.get_handover("st-james", "R1").await.unwrap().is_none());
    assert!(store.list_intents().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sweep_continues_after_single_failure() {
    let (memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    let store = engine.store();
    store.put_intent(&leftover_intent("A1", "alpha")).await.unwrap();
    store.put_intent(&leftover_intent("B1", "bravo")).await.unwrap();

    memory.fail_writes_under("handover/alpha");
    let sweep = engine.recover_pending_dispatches().await.unwrap();
    assert_eq!(sweep.scanned, 2);
    assert_eq!(sweep.failed.len(), 1);
    assert_eq!(sweep.failed[0].0, "alpha/A1");
    assert_eq!(sweep.completed, vec!["bravo/B1".to_string()]);
    assert!(!sweep.is_clean());

    // 失败的意图保留，故障解除后可补齐
    memory.clear_faults();
    let sweep = engine.recover_pending_dispatches().await.unwrap();
    assert_eq!(sweep.completed, vec!["alpha/A1".to_string()]);
}

#[tokio::test]
async fn test_receive_from_store_feed() {
    let (_memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    engine
        .store()
        .put_in_transit(&in_transit("F1", "St James", "NGB21"))
        .await
        .unwrap();
    let feed = StoreScheduleFeed::new(engine.store().clone());

    let outcome = engine.receive_from_feed("f1", "st-james", &feed).await.unwrap();
    assert_eq!(outcome.unit.model, "NGB21");
    assert!(outcome.transit_cleared);

    let err = engine.receive_from_feed("F1", "st-james", &feed).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotInTransit(_)));
}

#[tokio::test]
async fn test_receive_from_csv_feed() {
    let (_memory, _clock, engine) = memory_engine(LifecyclePolicy::default());
    let csv = "Chassis,Model,Customer,Dealer\n\
               cx-01,SRL22,Stock,St James\n\
               ,,,\n\
               CX-02,SRH20,A Buyer,Geelong\n";
    let feed = CsvScheduleFeed::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(feed.len(), 2);

    let outcome = engine.receive_from_feed("CX-01", "st-james", &feed).await.unwrap();
    assert_eq!(outcome.unit.model, "SRL22");
    assert_eq!(outcome.unit.customer, "Stock");
    assert!(!outcome.transit_cleared);
    assert_eq!(
        ClassifiedUnit::classify(outcome.unit).unit_type,
        UnitType::Stock
    );
}
