use cnpj_loader::config::DbConfig;
use cnpj_loader::db::Database;
use cnpj_loader::error::LoadError;
use std::time::Duration;

#[tokio::test]
async fn test_unreachable_server_returns_failure() {
    // port 1 on loopback: nothing listens there
    let config = DbConfig::from_lookup(|key| match key {
        "POSTGRES_USER" => Some("postgres".to_string()),
        "POSTGRES_PASSWORD" => Some("postgres".to_string()),
        "POSTGRES_DB" => Some("cnpj".to_string()),
        "POSTGRES_HOST" => Some("127.0.0.1".to_string()),
        "POSTGRES_PORT" => Some("1".to_string()),
        _ => None,
    })
    .unwrap()
    .with_acquire_timeout(Duration::from_secs(2));

    let result = Database::open(&config).await;

    assert!(matches!(result, Err(LoadError::Connection(_))));
}
