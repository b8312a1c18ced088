use clap::{Args, Parser, Subcommand, ValueEnum};
use lite_updater::UpdaterConfig;
use lite_updater::config::{DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_TTL};
use lite_updater::updater::InstallerKind;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct UpdaterArgs {
    #[arg(short, long, default_value = "lite-updater.db", env = "LITE_UPDATER_DB")]
    pub database: PathBuf,

    /// Host page the check runs on.
    #[arg(long, default_value = "update-core.php", env = "LITE_UPDATER_CONTEXT")]
    pub context: String,

    #[arg(long, default_value_t = false)]
    pub multisite: bool,

    #[arg(long, default_value_t = DEFAULT_CACHE_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    #[arg(long, default_value = DEFAULT_CACHE_PREFIX)]
    pub cache_prefix: String,

    #[arg(long, default_value = "/wp-admin/", env = "LITE_UPDATER_ADMIN_URL")]
    pub admin_url: String,

    #[command(subcommand)]
    pub command: Command,
}

impl UpdaterArgs {
    pub fn config(&self) -> UpdaterConfig {
        UpdaterConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_prefix: self.cache_prefix.clone(),
            multisite: self.multisite,
            admin_url: self.admin_url.clone(),
            ..UpdaterConfig::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct PackageArgs {
    /// Plugin entry file, or a theme's `style.css`/`functions.php`.
    pub package: PathBuf,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check for an update and record the result in a registry file.
    Check {
        #[command(flatten)]
        package: PackageArgs,

        /// JSON registry to reconcile in place; printed to stdout when absent.
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Print the details the host would show for a slug.
    Info {
        #[command(flatten)]
        package: PackageArgs,

        #[arg(short, long)]
        slug: String,
    },

    /// Move an extracted update into the installed package's directory.
    SelectSource {
        #[command(flatten)]
        package: PackageArgs,

        #[arg(long)]
        source: String,

        #[arg(long)]
        remote_source: String,

        #[arg(long, value_enum)]
        installer: Installer,

        #[arg(long)]
        action: Option<String>,

        /// File key of the plugin being updated.
        #[arg(long)]
        plugin: Option<String>,

        /// Slug of the theme being updated.
        #[arg(long)]
        theme: Option<String>,
    },

    /// Print the host events this package subscribes to.
    Hooks {
        #[command(flatten)]
        package: PackageArgs,
    },
}

impl Command {
    pub fn package(&self) -> &PackageArgs {
        match self {
            Self::Check { package, .. }
            | Self::Info { package, .. }
            | Self::SelectSource { package, .. }
            | Self::Hooks { package } => package,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Installer {
    Plugin,
    Theme,
}

impl From<Installer> for InstallerKind {
    fn from(value: Installer) -> Self {
        match value {
            Installer::Plugin => Self::Plugin,
            Installer::Theme => Self::Theme,
        }
    }
}
