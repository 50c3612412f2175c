//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use blackhole_core::config::{DriverConfig, validate_mount};
use blackhole_core::torrent::TorrentStatus;
use blackhole_core::{
    BlackholeConfig, BlackholeError, DebridClient, HashSource, LifecycleState, PathResolver,
    RealDebridClient, Result, SubmissionPolicy, TorrentHandle, TorrentSource,
};
use clap::Subcommand;
use tokio::time::{Instant, sleep};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the content hash of a .torrent or .magnet file
    Hash {
        /// Path to the torrent or magnet file
        file: PathBuf,
    },
    /// Validate configuration, API host, API key and mount
    Check,
    /// Run a torrent or magnet file through the debrid lifecycle
    Submit {
        /// Path to the torrent or magnet file
        file: PathBuf,
        /// Reject torrents that are not already cached
        #[arg(long)]
        fail_if_not_cached: bool,
        /// Request only the largest media file
        #[arg(long)]
        only_largest_file: bool,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Hash { file } => print_hash(&file).await,
        Commands::Check => check_setup().await,
        Commands::Submit {
            file,
            fail_if_not_cached,
            only_largest_file,
        } => {
            let overrides = SubmissionPolicy {
                fail_if_not_cached,
                only_largest_file,
            };
            submit(&file, overrides).await
        }
    }
}

/// Print the content hash of a torrent source
///
/// # Errors
/// - `BlackholeError::Torrent` - File unreadable or not a valid source
pub async fn print_hash(file: &Path) -> Result<()> {
    let source = TorrentSource::from_path(file).await?;
    let hash = source.derive_hash()?;

    println!("{hash}");
    if !hash.is_info_hash() {
        println!("  Not a 40 character info hash, cache checks will be skipped");
    }

    Ok(())
}

/// Validate every setting the submit command depends on
///
/// # Errors
/// - `BlackholeError::Configuration` - Missing settings or unusable mount
/// - `BlackholeError::Debrid` - Host unreachable or API key rejected
pub async fn check_setup() -> Result<()> {
    let config = load_config()?;
    let client = RealDebridClient::new(&config.debrid)?;

    client.check_host().await?;
    println!("Real-Debrid host reachable");

    client.check_api_key().await?;
    println!("Real-Debrid API key accepted");

    let mount = mount_root(&config)?;
    validate_mount(mount).await?;
    println!("Mount {} is populated", mount.display());

    Ok(())
}

/// Submit a torrent and follow it until its files appear on the mount
///
/// Torrents that end in the error state or exceed the wait timeout are
/// deleted from the service again.
///
/// # Errors
/// - `BlackholeError::Configuration` - Missing settings
/// - `BlackholeError::Torrent` - File unreadable or not a valid source
/// - `BlackholeError::Lifecycle` - Source could not be hashed
pub async fn submit(file: &Path, overrides: SubmissionPolicy) -> Result<()> {
    let config = load_config()?;
    let policy = SubmissionPolicy {
        fail_if_not_cached: config.policy.fail_if_not_cached || overrides.fail_if_not_cached,
        only_largest_file: config.policy.only_largest_file || overrides.only_largest_file,
    };

    let client = Arc::new(RealDebridClient::new(&config.debrid)?);
    let resolver = PathResolver::new(mount_root(&config)?);
    let source = TorrentSource::from_path(file).await?;
    let mut handle = TorrentHandle::new(source, client, policy, resolver);

    let id = match handle.submit().await? {
        Ok(id) => id,
        Err(rejection) => {
            println!("Rejected {}: {rejection}", handle.label());
            return Ok(());
        }
    };
    println!("Submitted {} as {id}", handle.label());

    match follow_torrent(&mut handle, &config.driver).await? {
        Some(path) => println!("{}", path.display()),
        None => {
            if handle.delete().await? {
                println!("Deleted {} from Real-Debrid", handle.label());
            }
        }
    }

    Ok(())
}

/// Polls a submitted torrent until it is available on the mount.
///
/// Returns `None` when the torrent failed, was rejected during file
/// selection, or did not finish in time.
async fn follow_torrent<C>(
    handle: &mut TorrentHandle<TorrentSource, C>,
    driver: &DriverConfig,
) -> Result<Option<PathBuf>>
where
    C: DebridClient + ?Sized,
{
    let deadline = Instant::now() + driver.wait_for_torrent_timeout;
    let mut files_selected = false;

    loop {
        match handle.status(true).await? {
            Some(TorrentStatus::Known(LifecycleState::WaitingFilesSelection)) if !files_selected => {
                if let Err(rejection) = handle.select_files().await? {
                    println!("File selection rejected: {rejection}");
                    return Ok(None);
                }
                files_selected = true;
            }
            Some(TorrentStatus::Known(LifecycleState::Completed)) => break,
            Some(TorrentStatus::Known(LifecycleState::Error)) => {
                println!("Torrent {} failed on Real-Debrid", handle.label());
                return Ok(None);
            }
            Some(status) => tracing::debug!(torrent = %handle.label(), %status, "Waiting"),
            None => tracing::debug!(torrent = %handle.label(), "Status unavailable"),
        }

        if !sleep_until_next(deadline, driver.poll_interval).await {
            println!("Timed out waiting for {}", handle.label());
            return Ok(None);
        }
    }

    loop {
        if let Some(path) = handle.torrent_path().await? {
            return Ok(Some(path));
        }
        tracing::info!(torrent = %handle.label(), "Waiting for mount to show torrent");

        if !sleep_until_next(deadline, driver.mount_refresh_interval).await {
            println!("Timed out waiting for {} on the mount", handle.label());
            return Ok(None);
        }
    }
}

/// Sleeps for `interval` unless that would pass `deadline`.
async fn sleep_until_next(deadline: Instant, interval: Duration) -> bool {
    if Instant::now() + interval > deadline {
        return false;
    }
    sleep(interval).await;
    true
}

fn load_config() -> Result<BlackholeConfig> {
    let config = BlackholeConfig::from_env();
    let problems = config.validate();
    if problems.is_empty() {
        Ok(config)
    } else {
        Err(BlackholeError::Configuration {
            reason: problems.join(" "),
        })
    }
}

fn mount_root(config: &BlackholeConfig) -> Result<&Path> {
    config
        .debrid
        .mount_torrents_path
        .as_deref()
        .ok_or_else(|| BlackholeError::Configuration {
            reason: "RealDebrid mount torrents path is missing.".to_string(),
        })
}
