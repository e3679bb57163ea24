//! Tests for the kernel error types and adapter health reporting

use chrono::Utc;
use core_kernel::{AdapterHealth, CoreError, HealthCheckResult, PortError, WarrantyId};

#[test]
fn test_core_error_display() {
    assert_eq!(
        CoreError::configuration("unknown timezone 'Mars/Olympus'").to_string(),
        "Configuration error: unknown timezone 'Mars/Olympus'"
    );
}

#[test]
fn test_port_error_not_found_mentions_entity_and_id() {
    let id = WarrantyId::new_v7();
    let error = PortError::not_found("Warranty", id);

    assert!(error.is_not_found());
    let message = error.to_string();
    assert!(message.contains("Warranty"));
    assert!(message.contains(&id.to_string()));
}

#[test]
fn test_port_error_classification() {
    assert!(PortError::connection("pool exhausted").is_transient());

    assert!(PortError::conflict("username taken").is_conflict());
    assert!(!PortError::conflict("username taken").is_transient());
    assert!(!PortError::internal("bad row").is_transient());
    assert!(!PortError::validation("receipt is required").is_not_found());
}

#[test]
fn test_validation_message_is_displayed() {
    let error = PortError::validation("value too long for type character varying(20)");
    assert_eq!(
        error.to_string(),
        "Validation error: value too long for type character varying(20)"
    );
}

#[test]
fn test_health_result() {
    let mut result = HealthCheckResult {
        adapter_id: "postgres-claims".to_string(),
        status: AdapterHealth::Healthy,
        latency_ms: 3,
        message: None,
        checked_at: Utc::now(),
    };
    assert!(result.is_healthy());

    result.status = AdapterHealth::Unhealthy;
    assert!(!result.is_healthy());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "unhealthy");
}
