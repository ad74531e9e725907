use super::*;

#[test]
fn defaults_point_at_the_local_gateway() {
    let settings = Settings::default();
    assert_eq!(settings.server_ws_url, "ws://127.0.0.1:8536/api/v1/ws");
    assert_eq!(settings.fetch_limit, 10);
}

#[test]
fn file_table_overrides_defaults() {
    let mut settings = Settings::default();
    let table: HashMap<String, String> = [
        ("server_ws_url".to_string(), "wss://example.org/ws".to_string()),
        ("fetch_limit".to_string(), "25".to_string()),
    ]
    .into_iter()
    .collect();

    apply_table(&mut settings, &table);
    assert_eq!(settings.server_ws_url, "wss://example.org/ws");
    assert_eq!(settings.fetch_limit, 25);
}

#[test]
fn env_overrides_win_over_the_file_table() {
    let mut settings = Settings::default();
    let table: HashMap<String, String> = [
        ("server_ws_url".to_string(), "wss://from-file/ws".to_string()),
        ("fetch_limit".to_string(), "25".to_string()),
    ]
    .into_iter()
    .collect();
    apply_table(&mut settings, &table);

    apply_env(&mut settings, |key| match key {
        "APP__SERVER_WS_URL" => Some("wss://from-env/ws".to_string()),
        "APP__FETCH_LIMIT" => Some("40".to_string()),
        _ => None,
    });

    assert_eq!(settings.server_ws_url, "wss://from-env/ws");
    assert_eq!(settings.fetch_limit, 40);
}

#[test]
fn unset_env_leaves_file_values_in_place() {
    let mut settings = Settings::default();
    let table: HashMap<String, String> = [(
        "server_ws_url".to_string(),
        "wss://from-file/ws".to_string(),
    )]
    .into_iter()
    .collect();
    apply_table(&mut settings, &table);

    apply_env(&mut settings, |_| None);

    assert_eq!(settings.server_ws_url, "wss://from-file/ws");
    assert_eq!(settings.fetch_limit, 10);
}

#[test]
fn unparsable_fetch_limit_keeps_the_previous_value() {
    let mut settings = Settings::default();
    let table: HashMap<String, String> =
        [("fetch_limit".to_string(), "plenty".to_string())]
            .into_iter()
            .collect();

    apply_table(&mut settings, &table);
    assert_eq!(settings.fetch_limit, 10);
}
