use crate::config::UpdaterConfig;

/// Decides whether the current host request may run an update check.
pub trait ContextGate {
    fn is_allowed(&self) -> bool;
}

impl ContextGate for bool {
    fn is_allowed(&self) -> bool {
        *self
    }
}

impl<F: Fn() -> bool> ContextGate for F {
    fn is_allowed(&self) -> bool {
        self()
    }
}

/// Gate backed by the name of the page the host is serving.
#[derive(Debug, Clone)]
pub struct AllowedContexts<'a> {
    current: &'a str,
    allowed: &'a [String],
}

impl<'a> AllowedContexts<'a> {
    pub fn new(current: &'a str, config: &'a UpdaterConfig) -> Self {
        Self {
            current,
            allowed: &config.allowed_contexts,
        }
    }
}

impl ContextGate for AllowedContexts<'_> {
    fn is_allowed(&self) -> bool {
        self.allowed.iter().any(|v| v == self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_contexts_allow_update_pages_only() {
        let config = UpdaterConfig::default();

        assert!(AllowedContexts::new("update-core.php", &config).is_allowed());
        assert!(AllowedContexts::new("wp-cron.php", &config).is_allowed());
        assert!(!AllowedContexts::new("edit.php", &config).is_allowed());
    }
}
