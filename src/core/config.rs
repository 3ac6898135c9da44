//! File-based config loader (`peyk.json`) with env-var fallback.
//!
//! Every field resolves JSON → `PEYK_*` env var → built-in default, so
//! a bare binary runs with sensible settings and deployments can pin
//! values either way.

use std::path::PathBuf;

#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct PeykConfig {
    /// HTTP port. Env: `PEYK_PORT` / `PORT`. Default 5000.
    pub port: Option<u16>,
    /// Launch browsers without a window. Env: `PEYK_HEADLESS`. Default true.
    pub headless: Option<bool>,
    /// Search-result settle interval in milliseconds (≥1500 recommended).
    /// Env: `PEYK_SEARCH_SETTLE_MS`. Default 2000.
    pub search_settle_ms: Option<u64>,
    /// Root for sessions, snapshots, and data files. Env: `PEYK_DATA_DIR`.
    /// Default `~/.peyk`.
    pub data_dir: Option<String>,
}

impl PeykConfig {
    pub fn resolve_port(&self) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        for k in ["PEYK_PORT", "PORT"] {
            if let Ok(v) = std::env::var(k) {
                if let Ok(p) = v.trim().parse() {
                    return p;
                }
            }
        }
        5000
    }

    pub fn resolve_headless(&self) -> bool {
        if let Some(b) = self.headless {
            return b;
        }
        match std::env::var("PEYK_HEADLESS") {
            Ok(v) => !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ),
            Err(_) => true,
        }
    }

    fn resolve_ms(field: Option<u64>, env: &str, default: u64) -> u64 {
        if let Some(n) = field {
            return n;
        }
        std::env::var(env)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn resolve_search_settle_ms(&self) -> u64 {
        Self::resolve_ms(self.search_settle_ms, "PEYK_SEARCH_SETTLE_MS", 2_000).max(1_500)
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(d) = &self.data_dir {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        if let Ok(d) = std::env::var("PEYK_DATA_DIR") {
            if !d.trim().is_empty() {
                return PathBuf::from(d);
            }
        }
        dirs::home_dir()
            .map(|h| h.join(".peyk"))
            .unwrap_or_else(|| PathBuf::from(".peyk"))
    }
}

/// Load `peyk.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `PEYK_CONFIG` env var path
/// 2. `./peyk.json`
/// 3. `../peyk.json`
///
/// Missing file → defaults (env-var fallbacks apply). Parse error →
/// warn and use defaults.
pub fn load_config() -> PeykConfig {
    let mut candidates = vec![
        PathBuf::from("peyk.json"),
        PathBuf::from("../peyk.json"),
    ];
    if let Ok(env_path) = std::env::var("PEYK_CONFIG") {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<PeykConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("peyk.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "peyk.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return PeykConfig::default();
                }
            },
            Err(_) => continue,
        }
    }

    PeykConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_fields_win() {
        let cfg = PeykConfig {
            port: Some(8080),
            headless: Some(false),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_port(), 8080);
        assert!(!cfg.resolve_headless());
    }

    #[test]
    fn test_settle_interval_floor() {
        let cfg = PeykConfig {
            search_settle_ms: Some(200),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_search_settle_ms(), 1_500);
    }
}
