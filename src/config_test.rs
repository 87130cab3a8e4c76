use super::*;
use std::collections::HashMap;

fn from_pairs(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn empty_environment_uses_defaults() {
    let config = from_pairs(&[]);
    assert_eq!(config, Config::default());
    assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
}

#[test]
fn values_are_parsed() {
    let config = from_pairs(&[
        ("PORT", "8080"),
        ("BIND_ADDR", "127.0.0.1"),
        ("DATABASE_URL", "postgres://localhost/rooms"),
        ("DB_MAX_CONNECTIONS", "12"),
        ("WS_CLIENT_QUEUE", " 64 "),
        ("HUB_QUEUE", "2048"),
    ]);
    assert_eq!(config.listen_addr().to_string(), "127.0.0.1:8080");
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/rooms"));
    assert_eq!(config.db_max_connections, 12);
    assert_eq!(config.ws_client_queue, 64);
    assert_eq!(config.hub_queue, 2048);
}

#[test]
fn invalid_values_fall_back_to_defaults() {
    let config = from_pairs(&[("PORT", "http"), ("BIND_ADDR", "localhost"), ("HUB_QUEUE", "-1")]);
    assert_eq!(config.port, 3000);
    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(config.hub_queue, 1024);
}

#[test]
fn zero_queues_are_clamped_and_blank_url_ignored() {
    let config = from_pairs(&[("WS_CLIENT_QUEUE", "0"), ("HUB_QUEUE", "0"), ("DATABASE_URL", "  ")]);
    assert_eq!(config.ws_client_queue, 1);
    assert_eq!(config.hub_queue, 1);
    assert!(config.database_url.is_none());
}
