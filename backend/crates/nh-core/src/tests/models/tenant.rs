use crate::Tenant;

#[test]
fn test_tenant_new() {
    let tenant = Tenant::new("acme".to_string(), Some("user-1".to_string()));

    assert_eq!(tenant.name, "acme");
    assert_eq!(tenant.owner_id.as_deref(), Some("user-1"));
    assert_eq!(tenant.daily_notification_count, 0);
    assert_eq!(tenant.secret_key.len(), 32);
}

#[test]
fn test_tenant_secret_keys_are_unique() {
    let a = Tenant::new("a".to_string(), None);
    let b = Tenant::new("b".to_string(), None);

    assert_ne!(a.secret_key, b.secret_key);
}

#[test]
fn test_tenant_secret_matches() {
    let tenant = Tenant::new("acme".to_string(), None);
    let secret = tenant.secret_key.clone();

    assert!(tenant.secret_matches(&secret));
    assert!(!tenant.secret_matches("wrong"));
    assert!(!tenant.secret_matches(""));
}

#[test]
fn test_tenant_serialization_omits_secret() {
    let tenant = Tenant::new("acme".to_string(), None);
    let json = serde_json::to_string(&tenant).unwrap();

    assert!(!json.contains(&tenant.secret_key));
    assert!(!json.contains("secret_key"));
}
