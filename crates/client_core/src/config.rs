use std::{collections::HashMap, fs};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_ws_url: String,
    pub fetch_limit: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_ws_url: "ws://127.0.0.1:8536/api/v1/ws".into(),
            fetch_limit: 10,
        }
    }
}

/// Defaults, then `reader.toml` in the working directory, then `APP__*`
/// environment variables, last writer wins.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("reader.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_table(&mut settings, &file_cfg);
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__SERVER_WS_URL") {
        settings.server_ws_url = v;
    }
    if let Some(v) = var("APP__FETCH_LIMIT") {
        if let Ok(parsed) = v.parse() {
            settings.fetch_limit = parsed;
        }
    }
}

fn apply_table(settings: &mut Settings, table: &HashMap<String, String>) {
    if let Some(v) = table.get("server_ws_url") {
        settings.server_ws_url = v.clone();
    }
    if let Some(v) = table.get("fetch_limit") {
        if let Ok(parsed) = v.parse() {
            settings.fetch_limit = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
