use std::time::Duration;

/// Freshness window of a cached manifest (6 hours).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

pub const DEFAULT_CACHE_PREFIX: &str = "git-updater-lite_";

/// Host pages on which an update check may run.
pub const DEFAULT_ALLOWED_CONTEXTS: &[&str] = &[
    "update-core.php",
    "update.php",
    "plugins.php",
    "themes.php",
    "plugin-install.php",
    "theme-install.php",
    "admin-ajax.php",
    "index.php",
    "wp-cron.php",
];

#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub cache_ttl: Duration,
    pub cache_prefix: String,

    /// Multisite hosts render theme updates themselves, so the theme HTML
    /// hook is not registered there.
    pub multisite: bool,

    /// Base of the host's admin pages, used for links in theme HTML.
    pub admin_url: String,

    pub allowed_contexts: Vec<String>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_owned(),
            multisite: false,
            admin_url: "/wp-admin/".to_owned(),
            allowed_contexts: DEFAULT_ALLOWED_CONTEXTS
                .iter()
                .map(|v| (*v).to_owned())
                .collect(),
        }
    }
}

impl UpdaterConfig {
    /// Cache key under which the manifest of `file_key` is stored.
    pub fn cache_key(&self, file_key: &str) -> String {
        format!("{}{}", self.cache_prefix, file_key)
    }

    /// Join a page name onto the admin base URL.
    pub fn admin_page(&self, page: &str) -> String {
        format!("{}/{}", self.admin_url.trim_end_matches('/'), page)
    }
}
