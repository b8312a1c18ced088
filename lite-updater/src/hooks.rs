//! The callbacks an updater offers to the host's event system.
//!
//! The host walks [`LiteUpdater::hooks`] once after a successful
//! [`LiteUpdater::run`] and routes each named event to the matching
//! updater method.

use crate::identity::PackageKind;
use crate::updater::LiteUpdater;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Callback {
    /// [`LiteUpdater::upgrader_source_selection`]
    SourceSelection,
    /// [`LiteUpdater::repo_api_details`]
    InfoResponse,
    /// [`LiteUpdater::reconcile_registry`]
    RegistryReconciliation,
    /// [`LiteUpdater::add_auth_header`]
    AuthHeaderInjection,
    /// [`LiteUpdater::customize_theme_update_html`]
    ThemeHtmlCustomization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookRegistration {
    pub event: String,
    pub priority: i32,
    pub accepted_args: u8,
    pub callback: Callback,
}

impl HookRegistration {
    fn new(event: impl Into<String>, priority: i32, accepted_args: u8, callback: Callback) -> Self {
        Self {
            event: event.into(),
            priority,
            accepted_args,
            callback,
        }
    }
}

impl<S, H> LiteUpdater<S, H> {
    /// Event registrations for this package; empty until a manifest is loaded.
    pub fn hooks(&self) -> Vec<HookRegistration> {
        let Some(manifest) = self.manifest() else {
            return Vec::new();
        };

        let kind = manifest.kind;

        let mut hooks = vec![
            HookRegistration::new("upgrader_source_selection", 10, 4, Callback::SourceSelection),
            HookRegistration::new(format!("{}s_api", kind), 99, 3, Callback::InfoResponse),
            HookRegistration::new(
                format!("site_transient_update_{}s", kind),
                15,
                1,
                Callback::RegistryReconciliation,
            ),
            HookRegistration::new("http_request_args", 10, 2, Callback::AuthHeaderInjection),
        ];

        if kind == PackageKind::Theme && !self.config().multisite {
            hooks.push(HookRegistration::new(
                "wp_prepare_themes_for_js",
                10,
                1,
                Callback::ThemeHtmlCustomization,
            ));
        }

        hooks
    }
}
