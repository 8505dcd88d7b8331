// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取、默认值回退与覆写
// ==========================================

mod test_helpers;

use dealer_yard_ops::config::{
    config_keys, ConfigManager, LifecyclePolicy, ReReceivePolicy, YardConfigReader,
    DEFAULT_DAY_BUCKETS,
};
use dealer_yard_ops::domain::UnitState;
use dealer_yard_ops::engine::ManualAddRequest;
use dealer_yard_ops::app::AppState;
use test_helpers::create_test_db;

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_default_policy_when_unset() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    let policy = config_manager.get_lifecycle_policy().await.unwrap();
    assert_eq!(policy, LifecyclePolicy::default());
    assert!(policy.require_reason_on_manual_add);
    assert_eq!(policy.manual_add_state, UnitState::YardStock);
    assert_eq!(policy.re_receive_policy, ReReceivePolicy::Overwrite);
}

#[tokio::test]
async fn test_policy_overrides() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_config_value(config_keys::MANUAL_ADD_REQUIRES_REASON, "false")
        .unwrap();
    config_manager
        .set_config_value(config_keys::MANUAL_ADD_INITIAL_STATE, "YARD_PENDING")
        .unwrap();
    config_manager
        .set_config_value(config_keys::RE_RECEIVE_POLICY, "reject")
        .unwrap();

    let policy = config_manager.get_lifecycle_policy().await.unwrap();
    assert!(!policy.require_reason_on_manual_add);
    assert_eq!(policy.manual_add_state, UnitState::YardPending);
    assert_eq!(policy.re_receive_policy, ReReceivePolicy::Reject);
}

#[tokio::test]
async fn test_invalid_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_config_value(config_keys::MANUAL_ADD_REQUIRES_REASON, "maybe")
        .unwrap();
    // 手工入场不允许直接进入终态
    config_manager
        .set_config_value(config_keys::MANUAL_ADD_INITIAL_STATE, "DISPATCHED")
        .unwrap();
    config_manager
        .set_config_value(config_keys::RE_RECEIVE_POLICY, "shrug")
        .unwrap();

    let policy = config_manager.get_lifecycle_policy().await.unwrap();
    assert_eq!(policy, LifecyclePolicy::default());
}

#[tokio::test]
async fn test_day_buckets() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    assert_eq!(
        config_manager.get_day_buckets().await.unwrap(),
        DEFAULT_DAY_BUCKETS.to_vec()
    );

    config_manager
        .set_config_value(config_keys::DAYS_IN_YARD_BUCKETS, "[90, 14, 0, 14, 45]")
        .unwrap();
    assert_eq!(config_manager.get_day_buckets().await.unwrap(), vec![14, 45, 90]);

    config_manager
        .set_config_value(config_keys::DAYS_IN_YARD_BUCKETS, "not json")
        .unwrap();
    assert_eq!(
        config_manager.get_day_buckets().await.unwrap(),
        DEFAULT_DAY_BUCKETS.to_vec()
    );
}

#[tokio::test]
async fn test_min_volume_dealer_then_global() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    assert_eq!(config_manager.get_min_volume("st-james").await.unwrap(), 0);

    config_manager
        .set_config_value(config_keys::DEFAULT_MIN_VOLUME, "30")
        .unwrap();
    assert_eq!(config_manager.get_min_volume("st-james").await.unwrap(), 30);

    config_manager.set_min_volume("st-james", 55).unwrap();
    assert_eq!(config_manager.get_min_volume("st-james").await.unwrap(), 55);
    assert_eq!(config_manager.get_min_volume("geelong").await.unwrap(), 30);

    assert!(config_manager
        .remove_config_value(&config_keys::dealer_min_volume("st-james"))
        .unwrap());
    assert_eq!(config_manager.get_min_volume("st-james").await.unwrap(), 30);
}

#[tokio::test]
async fn test_config_snapshot() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_config_value(config_keys::RE_RECEIVE_POLICY, "reject")
        .unwrap();

    let snapshot = config_manager.get_config_snapshot().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(parsed[config_keys::RE_RECEIVE_POLICY], "reject");
}

#[tokio::test]
async fn test_app_state_uses_stored_policy() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    {
        let config_manager = ConfigManager::new(&db_path).unwrap();
        config_manager
            .set_config_value(config_keys::MANUAL_ADD_REQUIRES_REASON, "false")
            .unwrap();
        config_manager
            .set_config_value(config_keys::MANUAL_ADD_INITIAL_STATE, "yard-pending")
            .unwrap();
    }

    let state = AppState::new(db_path).await.unwrap();
    let outcome = state
        .yard_api
        .manual_add(ManualAddRequest {
            chassis: "P1".to_string(),
            dealer: "st-james".to_string(),
            ..ManualAddRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(outcome.unit.state, UnitState::YardPending);
    assert_eq!(outcome.unit.source, "pending-approval");
    assert!(outcome.report.is_none());
}
