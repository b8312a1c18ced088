mod args;

use crate::args::{Command, UpdaterArgs};
use clap::Parser as _;
use lite_updater::updater::{FsMover, HookExtra, InfoQuery, InfoResponse, UpdateRegistry};
use lite_updater::{
    AllowedContexts, Database, FileHeaderReader, LiteUpdater, PackageIdentity, ReqwestFetcher,
    UpdaterError,
};
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

fn main() {
    let indicatif_layer = tracing_indicatif::IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_env("LITE_UPDATER_LOG"))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let args = UpdaterArgs::parse();

    let result = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(v) => v.block_on(async_main(args)),
        Err(err) => {
            tracing::error!("Failed to create tokio runtime: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        tracing::error!("Error ({}): {}", err.code(), err);
        std::process::exit(1);
    }
}

async fn async_main(args: UpdaterArgs) -> Result<(), UpdaterError> {
    tracing::trace!("args = {:#?}", args);

    let config = args.config();
    let identity = PackageIdentity::resolve(&args.command.package().package, &FileHeaderReader)?;
    tracing::debug!(
        "Resolved {} {} at version {}",
        identity.kind(),
        identity.file_key(),
        identity.local_version()
    );

    let database = Database::setup(&args.database).await?;
    let purged = database.purge_expired().await?;
    if purged > 0 {
        tracing::debug!("Purged {} expired transients", purged);
    }

    let mut updater = LiteUpdater::new(identity, config.clone(), database, ReqwestFetcher::new()?);

    updater.run(&AllowedContexts::new(&args.context, &config)).await?;

    if updater.manifest().is_none() {
        tracing::warn!("No update check in context {}", args.context);
    }

    match args.command {
        Command::Check { registry, .. } => {
            let current = match &registry {
                Some(path) if tokio::fs::try_exists(path).await? => {
                    serde_json::from_str(&tokio::fs::read_to_string(path).await?)?
                }
                _ => Value::Null,
            };

            let reconciled = updater.reconcile_registry(UpdateRegistry::from_host(current));
            let output = serde_json::to_string_pretty(&reconciled)?;

            match registry {
                Some(path) => {
                    tokio::fs::write(&path, output).await?;
                    tracing::info!("Wrote registry to {}", path.display());
                }
                None => println!("{}", output),
            }
        }
        Command::Info { slug, .. } => {
            let action = format!("{}_information", updater.identity().kind());

            match updater.repo_api_details((), &action, &InfoQuery { slug }) {
                InfoResponse::Details(manifest) => {
                    println!("{}", serde_json::to_string_pretty(&manifest)?)
                }
                InfoResponse::Declined(()) => tracing::warn!("No details for this slug"),
            }
        }
        Command::SelectSource {
            source,
            remote_source,
            installer,
            action,
            plugin,
            theme,
            ..
        } => {
            let hook_extra = HookExtra {
                action,
                plugin,
                theme,
            };

            let selected = updater
                .upgrader_source_selection(
                    &source,
                    &remote_source,
                    installer.into(),
                    &hook_extra,
                    &FsMover,
                )
                .await?;

            println!("{}", selected);
        }
        Command::Hooks { .. } => {
            println!("{}", serde_json::to_string_pretty(&updater.hooks())?);
        }
    }

    Ok(())
}
