use super::{LiteUpdater, UpdateRegistry};
use crate::api::{Manifest, is_truthy};
use crate::identity::PackageKind;
use serde_json::{Map, Value};
use url::form_urlencoded;

impl<S, H> LiteUpdater<S, H> {
    /// Add update links for this theme to the host's prepared theme list.
    ///
    /// `themes` maps theme slugs to display records. A record flagged with
    /// `hasUpdate` gets an `update` fragment, any other record gets text
    /// appended to its `description`.
    pub fn customize_theme_update_html(
        &self,
        mut themes: Map<String, Value>,
        registry: &UpdateRegistry,
    ) -> Map<String, Value> {
        let Some(manifest) = self.manifest() else {
            return themes;
        };

        if manifest.kind != PackageKind::Theme {
            return themes;
        }

        let content = self.theme_actions_content(manifest, registry);

        let Some(Value::Object(theme)) = themes.get_mut(&manifest.slug) else {
            return themes;
        };

        if theme.get("hasUpdate").is_some_and(is_truthy) {
            theme.insert("update".to_owned(), Value::from(content));
        } else {
            let mut description = theme
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            description.push_str(&content);

            theme.insert("description".to_owned(), Value::from(description));
        }

        themes
    }

    fn theme_actions_content(&self, manifest: &Manifest, registry: &UpdateRegistry) -> String {
        let name = if manifest.name.is_empty() {
            &manifest.slug
        } else {
            &manifest.name
        };

        let new_version = registry
            .with_update
            .get(&manifest.slug)
            .and_then(|record| record.field("new_version"))
            .and_then(|v| v.as_str().map(ToOwned::to_owned));

        let Some(new_version) = new_version else {
            let source = if manifest.git.is_empty() {
                "its update server"
            } else {
                manifest.git.as_str()
            };

            return format!(
                "<p><em>Updates for {} are provided by {}.</em></p>",
                escape_html(name),
                escape_html(source)
            );
        };

        let details_url = format!(
            "{}?{}",
            self.config().admin_page("theme-install.php"),
            form_urlencoded::Serializer::new(String::new())
                .append_pair("tab", "theme-information")
                .append_pair("theme", &manifest.slug)
                .append_pair("TB_iframe", "true")
                .append_pair("width", "270")
                .append_pair("height", "400")
                .finish()
        );

        let update_url = format!(
            "{}?{}",
            self.config().admin_page("update.php"),
            form_urlencoded::Serializer::new(String::new())
                .append_pair("action", "upgrade-theme")
                .append_pair("theme", &manifest.slug)
                .finish()
        );

        format!(
            concat!(
                "<p><strong>There is a new version of {name} available. ",
                "<a href=\"{details}\" class=\"thickbox open-plugin-details-modal\" ",
                "aria-label=\"View {name} version {version} details\">",
                "View version {version} details</a> ",
                "or <a href=\"{update}\" aria-label=\"Update {name} now\">",
                "update now</a>.</strong></p>"
            ),
            name = escape_html(name),
            version = escape_html(&new_version),
            details = escape_html(&details_url),
            update = escape_html(&update_url),
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }

    escaped
}
