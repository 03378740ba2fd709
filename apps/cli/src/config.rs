use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use anyhow::{anyhow, Context};
use client_core::SessionCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub session_file: Option<PathBuf>,
    pub remember_session: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            session_file: SessionCache::default_path(),
            remember_session: true,
        }
    }
}

/// Defaults, then `path` (if readable), then the process environment.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());
    settings
}

impl Settings {
    fn apply_file(&mut self, raw: &str) {
        let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
            tracing::warn!("config: ignoring malformed settings file");
            return;
        };
        if let Some(v) = file_cfg.get("supabase_url") {
            self.supabase_url = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("supabase_anon_key") {
            self.supabase_anon_key = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("session_file") {
            self.session_file = Some(PathBuf::from(v));
        }
        if let Some(v) = file_cfg.get("remember_session") {
            self.remember_session = parse_flag(v).unwrap_or(self.remember_session);
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SUPABASE_URL") {
            self.supabase_url = Some(v);
        }
        if let Some(v) = lookup("APP__SUPABASE_URL") {
            self.supabase_url = Some(v);
        }

        if let Some(v) = lookup("SUPABASE_ANON_KEY") {
            self.supabase_anon_key = Some(v);
        }
        if let Some(v) = lookup("APP__SUPABASE_ANON_KEY") {
            self.supabase_anon_key = Some(v);
        }

        if let Some(v) = lookup("APP__SESSION_FILE") {
            self.session_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("APP__REMEMBER_SESSION") {
            self.remember_session = parse_flag(&v).unwrap_or(self.remember_session);
        }
    }

    /// Command-line flags win over every other source.
    pub fn apply_overrides(
        &mut self,
        supabase_url: Option<String>,
        anon_key: Option<String>,
        no_session_cache: bool,
    ) {
        if supabase_url.is_some() {
            self.supabase_url = supabase_url;
        }
        if anon_key.is_some() {
            self.supabase_anon_key = anon_key;
        }
        if no_session_cache {
            self.remember_session = false;
        }
    }

    pub fn remote(&self) -> anyhow::Result<(&str, &str)> {
        let url = non_empty(&self.supabase_url)
            .ok_or_else(|| anyhow!("no Supabase URL configured"))
            .context("set SUPABASE_URL, supabase_url in campaign.toml or --supabase-url")?;
        let key = non_empty(&self.supabase_anon_key)
            .ok_or_else(|| anyhow!("no Supabase anon key configured"))
            .context("set SUPABASE_ANON_KEY, supabase_anon_key in campaign.toml or --anon-key")?;
        Ok((url, key))
    }

    pub fn session_cache(&self) -> Option<SessionCache> {
        if !self.remember_session {
            return None;
        }
        self.session_file.clone().map(SessionCache::new)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
