use super::LiteUpdater;
use crate::api::Manifest;
use crate::identity::PackageKind;
use crate::version::{self, VersionComparison};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The host's aggregate of package update states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRegistry {
    #[serde(
        rename = "response",
        default,
        deserialize_with = "lenient_records",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub with_update: BTreeMap<String, RegistryRecord>,

    #[serde(
        rename = "no_update",
        default,
        deserialize_with = "lenient_records",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub without_update: BTreeMap<String, RegistryRecord>,

    /// Host bookkeeping fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpdateRegistry {
    /// Interpret a host value, starting empty when it is not an aggregate.
    ///
    /// Any object is an aggregate. Record maps of another shape read as
    /// empty, and entries this crate does not model are kept verbatim.
    pub fn from_host(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            tracing::debug!("Host update registry is not an aggregate, starting empty");
            return Self::default();
        };

        Self {
            with_update: fields.remove("response").map(records).unwrap_or_default(),
            without_update: fields.remove("no_update").map(records).unwrap_or_default(),
            extra: fields,
        }
    }
}

fn records(value: Value) -> BTreeMap<String, RegistryRecord> {
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, entry)| (key, RegistryRecord::from_host(entry)))
            .collect(),
        other => {
            tracing::debug!("Ignoring registry record map of unexpected shape: {}", other);
            BTreeMap::new()
        }
    }
}

fn lenient_records<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, RegistryRecord>, D::Error> {
    Value::deserialize(deserializer).map(records)
}

/// One package entry of the registry.
///
/// Plugin entries are structured objects; theme entries are open key/value
/// maps because the host's theme screens index into them by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryRecord {
    Plugin(PluginRecord),
    Theme(ThemeRecord),
    /// A host entry that is not an object, passed through untouched.
    Other(Value),
}

impl RegistryRecord {
    fn from_host(value: Value) -> Self {
        let Value::Object(entry) = value else {
            return Self::Other(value);
        };

        match PluginRecord::deserialize(&Value::Object(entry.clone())) {
            Ok(record) => Self::Plugin(record),
            Err(_) => Self::Theme(ThemeRecord(entry)),
        }
    }

    /// Look up a field regardless of the record shape.
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Self::Plugin(record) => serde_json::to_value(record)
                .ok()
                .and_then(|mut v| v.get_mut(name).map(Value::take)),
            Self::Theme(record) => record.0.get(name).cloned(),
            Self::Other(value) => value.get(name).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub slug: String,

    /// File key of the plugin.
    pub plugin: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub icons: Map<String, Value>,

    #[serde(default)]
    pub banners: Value,

    #[serde(default)]
    pub branch: String,

    #[serde(rename = "type")]
    pub update_type: String,

    #[serde(rename = "update-supported")]
    pub update_supported: bool,

    #[serde(default)]
    pub requires: String,

    #[serde(default)]
    pub requires_php: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginRecord {
    fn render(manifest: &Manifest, comparison: VersionComparison) -> Self {
        let mut record = Self {
            slug: manifest.slug.clone(),
            plugin: manifest.file.clone(),
            url: manifest.url_or_slug().to_owned(),
            icons: manifest.icons.clone(),
            banners: manifest.banners.clone(),
            branch: manifest.branch.clone(),
            update_type: update_type(manifest),
            update_supported: true,
            requires: manifest.requires.clone(),
            requires_php: manifest.requires_php.clone(),
            new_version: None,
            package: None,
            tested: None,
            extra: Map::new(),
        };

        if comparison == VersionComparison::RemoteNewer {
            record.new_version = Some(manifest.version.clone());
            record.package = Some(manifest.download_link.clone());
            record.tested = Some(manifest.tested.clone());
        }

        record
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeRecord(pub Map<String, Value>);

impl ThemeRecord {
    fn render(manifest: &Manifest, comparison: VersionComparison) -> Self {
        let url = manifest.url_or_slug();

        let mut record = Map::new();
        record.insert("slug".into(), manifest.slug.clone().into());
        record.insert("theme".into(), manifest.slug.clone().into());
        record.insert("url".into(), url.into());
        record.insert("theme_uri".into(), url.into());
        record.insert("icons".into(), Value::Object(manifest.icons.clone()));
        record.insert("banners".into(), manifest.banners.clone());
        record.insert("branch".into(), manifest.branch.clone().into());
        record.insert("type".into(), update_type(manifest).into());
        record.insert("update-supported".into(), true.into());
        record.insert("requires".into(), manifest.requires.clone().into());
        record.insert("requires_php".into(), manifest.requires_php.clone().into());

        if comparison == VersionComparison::RemoteNewer {
            record.insert("new_version".into(), manifest.version.clone().into());
            record.insert("package".into(), manifest.download_link.clone().into());
            record.insert("tested".into(), manifest.tested.clone().into());
        }

        Self(record)
    }
}

fn update_type(manifest: &Manifest) -> String {
    format!("{}-{}", manifest.git, manifest.kind)
}

impl<S, H> LiteUpdater<S, H> {
    /// Record this package's update state in the host registry.
    ///
    /// The package lands in `with_update` when the remote version is newer
    /// and in `without_update` otherwise, replacing any earlier entry under
    /// the same key in that map. Returns the registry unchanged while no
    /// manifest is loaded.
    pub fn reconcile_registry(&self, mut registry: UpdateRegistry) -> UpdateRegistry {
        let Some(manifest) = self.manifest() else {
            return registry;
        };

        let comparison = version::compare(&manifest.version, self.identity().local_version());

        let (key, record) = match manifest.kind {
            PackageKind::Plugin => (
                manifest.file.clone(),
                RegistryRecord::Plugin(PluginRecord::render(manifest, comparison)),
            ),
            PackageKind::Theme => (
                manifest.slug.clone(),
                RegistryRecord::Theme(ThemeRecord::render(manifest, comparison)),
            ),
        };

        match comparison {
            VersionComparison::RemoteNewer => {
                tracing::info!(
                    "Update available for {}: {} -> {}",
                    key,
                    self.identity().local_version(),
                    manifest.version
                );
                registry.with_update.insert(key, record);
            }
            VersionComparison::RemoteSameOrOlder => {
                tracing::debug!("{} is up to date", key);
                registry.without_update.insert(key, record);
            }
        }

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::testing::{manifest_json, updater_with};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn same_version_lands_in_without_update() {
        let updater = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.2"),
        );
        let registry = updater.reconcile_registry(UpdateRegistry::default());

        assert!(registry.with_update.is_empty());
        assert!(registry.without_update.contains_key("my-plugin/my-plugin.php"));
    }

    #[test]
    fn newer_plugin_lands_in_with_update() {
        let updater = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.3"),
        );
        let registry = updater.reconcile_registry(UpdateRegistry::default());

        let Some(RegistryRecord::Plugin(record)) =
            registry.with_update.get("my-plugin/my-plugin.php")
        else {
            panic!("no plugin record in with_update");
        };

        assert_eq!(record.new_version.as_deref(), Some("1.0.3"));
        assert_eq!(record.package.as_deref(), Some("test-download-link"));
        assert_eq!(record.tested.as_deref(), Some("10.0.0"));
        assert_eq!(record.plugin, "my-plugin/my-plugin.php");
        assert_eq!(record.update_type, "test-githost-plugin");
        assert!(registry.without_update.is_empty());
    }

    #[test]
    fn plugin_record_serializes_as_an_object() {
        let updater = updater_with(
            PackageKind::Plugin,
            "0.0.1",
            manifest_json(PackageKind::Plugin, "2.0.0"),
        );
        let registry = updater.reconcile_registry(UpdateRegistry::default());

        assert_eq!(
            serde_json::to_value(&registry).unwrap(),
            json!({
                "response": {
                    "my-plugin/my-plugin.php": {
                        "slug": "test-plugin-slug",
                        "plugin": "my-plugin/my-plugin.php",
                        "url": "http://example.org",
                        "icons": { "1x": "icon-1x.png", "2x": "icon-2x.png" },
                        "banners": { "low": "banner-low.png", "high": "banner-high.png" },
                        "branch": "test-branch",
                        "type": "test-githost-plugin",
                        "update-supported": true,
                        "requires": "test-version",
                        "requires_php": "test-php-version",
                        "new_version": "2.0.0",
                        "package": "test-download-link",
                        "tested": "10.0.0",
                    }
                }
            })
        );
    }

    #[test]
    fn theme_record_is_keyed_by_slug() {
        let mut manifest = manifest_json(PackageKind::Theme, "2.0.0");
        manifest.as_object_mut().unwrap().remove("url");

        let updater = updater_with(PackageKind::Theme, "1.0.1", manifest);
        let registry = updater.reconcile_registry(UpdateRegistry::default());

        let Some(RegistryRecord::Theme(record)) = registry.with_update.get("test-theme-slug") else {
            panic!("no theme record in with_update");
        };

        assert_eq!(record.0.get("theme"), Some(&json!("test-theme-slug")));
        assert_eq!(record.0.get("url"), Some(&json!("test-theme-slug")));
        assert_eq!(record.0.get("theme_uri"), Some(&json!("test-theme-slug")));
        assert_eq!(record.0.get("new_version"), Some(&json!("2.0.0")));
        assert_eq!(record.0.get("type"), Some(&json!("test-githost-theme")));
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let updater = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.3"),
        );
        let start = UpdateRegistry::from_host(json!({ "last_checked": 1700000000 }));

        let first = serde_json::to_string(&updater.reconcile_registry(start.clone())).unwrap();
        let second = serde_json::to_string(&updater.reconcile_registry(start)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn prior_entries_in_the_other_map_are_kept() {
        let updater = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.2"),
        );

        let newer = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.3"),
        );
        let registry =
            updater.reconcile_registry(newer.reconcile_registry(UpdateRegistry::default()));

        assert!(registry.with_update.contains_key("my-plugin/my-plugin.php"));
        assert!(registry.without_update.contains_key("my-plugin/my-plugin.php"));
    }

    #[test]
    fn non_aggregate_host_values_start_empty() {
        assert_eq!(UpdateRegistry::from_host(json!(false)), UpdateRegistry::default());
        assert_eq!(UpdateRegistry::from_host(Value::Null), UpdateRegistry::default());
    }

    #[test]
    fn foreign_entries_survive_a_round_trip() {
        let host = json!({
            "last_checked": 1700000000,
            "response": {
                "akismet/akismet.php": { "id": "w.org/plugins/akismet", "new_version": "5.3" }
            }
        });

        let registry = UpdateRegistry::from_host(host.clone());
        assert_eq!(serde_json::to_value(&registry).unwrap(), host);
    }

    #[test]
    fn odd_shapes_inside_the_aggregate_keep_other_entries() {
        let host = json!({
            "last_checked": 1700000000,
            "response": {
                "akismet/akismet.php": { "id": "w.org/plugins/akismet", "new_version": "5.3" },
                "legacy/legacy.php": "5.0",
            },
            "no_update": [],
            "translations": [],
        });

        let updater = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.2"),
        );
        let registry = updater.reconcile_registry(UpdateRegistry::from_host(host));
        let actual = serde_json::to_value(&registry).unwrap();

        assert_eq!(actual["last_checked"], json!(1700000000));
        assert_eq!(actual["translations"], json!([]));
        assert_eq!(actual["response"]["akismet/akismet.php"]["new_version"], json!("5.3"));
        assert_eq!(actual["response"]["legacy/legacy.php"], json!("5.0"));
        assert!(registry.without_update.contains_key("my-plugin/my-plugin.php"));
    }

    #[test]
    fn deserializing_tolerates_list_shaped_record_maps() {
        let registry: UpdateRegistry =
            serde_json::from_value(json!({ "response": [], "no_update": {} })).unwrap();

        assert_eq!(registry, UpdateRegistry::default());
    }

    #[test]
    fn without_manifest_the_registry_is_unchanged() {
        let mut updater = updater_with(
            PackageKind::Plugin,
            "1.0.2",
            manifest_json(PackageKind::Plugin, "1.0.3"),
        );
        updater.set_manifest(None);

        let start = UpdateRegistry::from_host(json!({ "last_checked": 1 }));
        assert_eq!(updater.reconcile_registry(start.clone()), start);
    }
}
