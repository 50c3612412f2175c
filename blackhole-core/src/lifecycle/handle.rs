//! Lifecycle handle for one torrent submission

use std::path::PathBuf;
use std::sync::Arc;

use super::path::PathResolver;
use super::selection::{FileSelection, check_cached_selection};
use super::{LifecycleError, Rejection, Verdict};
use crate::config::SubmissionPolicy;
use crate::debrid::{
    AddedTorrent, Availability, AvailabilitySet, DebridClient, DebridError, RemoteTorrentInfo,
    check_availability,
};
use crate::torrent::{ContentHash, HashSource, SourcePayload, TorrentStatus};

/// Drives one torrent source through the debrid service.
///
/// The remote id is assigned exactly once, by a successful [`submit`].
/// Remote info and cache availability are fetched on demand and reused until
/// a caller asks for a refresh.
///
/// [`submit`]: TorrentHandle::submit
pub struct TorrentHandle<S, C>
where
    S: HashSource,
    C: DebridClient + ?Sized,
{
    source: S,
    client: Arc<C>,
    policy: SubmissionPolicy,
    resolver: PathResolver,
    id: Option<String>,
    info: Option<RemoteTorrentInfo>,
    availability: Option<AvailabilitySet>,
    hash: Option<ContentHash>,
    incompatible_hash: bool,
}

impl<S, C> TorrentHandle<S, C>
where
    S: HashSource,
    C: DebridClient + ?Sized,
{
    pub fn new(
        source: S,
        client: Arc<C>,
        policy: SubmissionPolicy,
        resolver: PathResolver,
    ) -> Self {
        Self {
            source,
            client,
            policy,
            resolver,
            id: None,
            info: None,
            availability: None,
            hash: None,
            incompatible_hash: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn label(&self) -> &str {
        self.source.label()
    }

    /// Remote id, once submitted.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether the content hash cannot be used for cache lookups.
    ///
    /// Only meaningful after the hash has been derived.
    pub fn has_incompatible_hash(&self) -> bool {
        self.incompatible_hash
    }

    /// Derives the content hash on first use and memoizes it.
    ///
    /// # Errors
    /// - `LifecycleError::InvalidSource` - Torrent file or magnet link is malformed
    pub fn hash(&mut self) -> Result<ContentHash, LifecycleError> {
        if let Some(hash) = &self.hash {
            return Ok(hash.clone());
        }

        let hash = self.source.derive_hash()?;
        self.incompatible_hash = !hash.is_info_hash();
        if self.incompatible_hash {
            tracing::warn!(
                torrent = %self.label(),
                %hash,
                "Hash is not a 40 character info hash, cache checks disabled"
            );
        } else {
            tracing::debug!(torrent = %self.label(), %hash, "Derived content hash");
        }

        self.hash = Some(hash.clone());
        Ok(hash)
    }

    /// Cache status of this torrent.
    ///
    /// A successful lookup is kept and reused unless `refresh` is set; failed
    /// lookups are retried on the next call.
    ///
    /// # Errors
    /// - `LifecycleError::InvalidSource` - Hash could not be derived
    pub async fn instant_availability(
        &mut self,
        refresh: bool,
    ) -> Result<Availability, LifecycleError> {
        let hash = self.hash()?;

        if !refresh {
            if let Some(set) = &self.availability {
                return Ok(Availability::from(set.clone()));
            }
        }

        let availability = check_availability(self.client.as_ref(), &hash).await;
        match &availability {
            Availability::Cached(set) => self.availability = Some(set.clone()),
            Availability::NotCached => self.availability = Some(AvailabilitySet::default()),
            Availability::TreatedAsAvailable | Availability::Unknown => {}
        }

        tracing::debug!(
            torrent = %self.label(),
            cached = availability.permits_submission(),
            "Instant availability"
        );
        Ok(availability)
    }

    /// Adds the torrent to the service and records its remote id.
    ///
    /// With `fail_if_not_cached`, torrents the service does not hold are
    /// rejected before anything is uploaded. Submitting an already submitted
    /// handle returns the existing id without contacting the service.
    ///
    /// # Errors
    /// - `LifecycleError::InvalidSource` - Hash needed for the cache check could not be derived
    pub async fn submit(&mut self) -> Result<Verdict<String>, LifecycleError> {
        if let Some(id) = &self.id {
            return Ok(Ok(id.clone()));
        }

        if self.policy.fail_if_not_cached {
            match self.instant_availability(false).await? {
                availability if availability.permits_submission() => {}
                Availability::Unknown => return Ok(self.reject(Rejection::AvailabilityUnknown)),
                _ => return Ok(self.reject(Rejection::NotCached)),
            }
        }

        let added = match self.add().await {
            Ok(added) => added,
            Err(e) => return Ok(self.reject(Rejection::Remote(e))),
        };

        tracing::info!(torrent = %self.label(), id = %added.id, "Submitted torrent");
        self.id = Some(added.id.clone());
        Ok(Ok(added.id))
    }

    async fn add(&self) -> Result<AddedTorrent, DebridError> {
        let hosts = self.client.available_hosts().await?;
        let host = hosts.first().ok_or(DebridError::NoHostsAvailable)?;

        match self.source.payload() {
            SourcePayload::TorrentFile(data) => self.client.add_torrent(&host.host, data).await,
            SourcePayload::Magnet(magnet) => self.client.add_magnet(&host.host, magnet).await,
        }
    }

    /// Remote metadata, fetched on first use or when `refresh` is set.
    ///
    /// A failed fetch clears the cached info and yields `None`.
    ///
    /// # Errors
    /// - `LifecycleError::MissingId` - Torrent has not been submitted
    pub async fn info(
        &mut self,
        refresh: bool,
    ) -> Result<Option<&RemoteTorrentInfo>, LifecycleError> {
        let id = self.require_id("fetch info")?;

        if refresh || self.info.is_none() {
            self.info = match self.client.torrent_info(&id).await {
                Ok(info) => {
                    tracing::trace!(
                        torrent = %self.label(),
                        status = %info.raw_status,
                        progress = info.progress,
                        "Fetched torrent info"
                    );
                    let expected = self.hash.as_ref();
                    if expected.is_some_and(|expected| !info.hash_matches(expected)) {
                        tracing::warn!(
                            torrent = %self.label(),
                            expected = ?expected.map(ContentHash::as_str),
                            remote = ?info.hash,
                            "Remote torrent reports a different hash"
                        );
                    }
                    Some(info)
                }
                Err(e) => {
                    tracing::warn!(torrent = %self.label(), "Failed to fetch torrent info: {}", e);
                    None
                }
            };
        }

        Ok(self.info.as_ref())
    }

    /// Normalized status of the (optionally refreshed) remote info.
    ///
    /// # Errors
    /// - `LifecycleError::MissingId` - Torrent has not been submitted
    pub async fn status(&mut self, refresh: bool) -> Result<Option<TorrentStatus>, LifecycleError> {
        Ok(self.info(refresh).await?.map(RemoteTorrentInfo::status))
    }

    /// Chooses which files to download and commits the choice remotely.
    ///
    /// Returns the requested file ids.
    ///
    /// # Errors
    /// - `LifecycleError::MissingId` - Torrent has not been submitted
    pub async fn select_files(&mut self) -> Result<Verdict<Vec<String>>, LifecycleError> {
        let id = self.require_id("select files")?;
        let only_largest_file = self.policy.only_largest_file;

        let files = match self.info(false).await? {
            Some(info) => info.files.clone(),
            None => {
                return Ok(self.reject(Rejection::Remote(DebridError::RequestFailed {
                    endpoint: "torrents/info".to_string(),
                })));
            }
        };

        let Some(selection) = FileSelection::plan(&files, only_largest_file) else {
            return Ok(self.reject(Rejection::NoMediaFiles));
        };
        tracing::debug!(
            torrent = %self.label(),
            largest = %selection.largest_id,
            files = ?selection.file_ids,
            "Planned file selection"
        );

        if self.policy.fail_if_not_cached {
            let cached = match self.instant_availability(false).await? {
                Availability::TreatedAsAvailable => None,
                Availability::Unknown => return Ok(self.reject(Rejection::AvailabilityUnknown)),
                Availability::NotCached => Some(AvailabilitySet::default()),
                Availability::Cached(set) => Some(set),
            };
            if let Some(set) = cached {
                if let Err(rejection) =
                    check_cached_selection(&selection, &set, only_largest_file)
                {
                    return Ok(self.reject(rejection));
                }
            }
        }

        if only_largest_file && selection.media_count > 1 {
            tracing::info!(
                torrent = %self.label(),
                file = %selection.largest_id,
                "Selecting only the largest of {} media files",
                selection.media_count
            );
        }

        if let Err(e) = self.client.select_files(&id, &selection.file_ids).await {
            return Ok(self.reject(Rejection::Remote(e)));
        }

        Ok(Ok(selection.file_ids))
    }

    /// Removes the torrent from the service; returns whether that succeeded.
    ///
    /// # Errors
    /// - `LifecycleError::MissingId` - Torrent has not been submitted
    pub async fn delete(&mut self) -> Result<bool, LifecycleError> {
        let id = self.require_id("delete")?;

        match self.client.delete_torrent(&id).await {
            Ok(()) => {
                tracing::info!(torrent = %self.label(), %id, "Deleted torrent");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(torrent = %self.label(), %id, "Failed to delete torrent: {}", e);
                Ok(false)
            }
        }
    }

    /// Local directory of the completed torrent, if the mount shows it yet.
    ///
    /// # Errors
    /// - `LifecycleError::MissingId` - Torrent has not been submitted
    pub async fn torrent_path(&mut self) -> Result<Option<PathBuf>, LifecycleError> {
        let Some((filename, original_filename)) = self
            .info(false)
            .await?
            .map(|info| (info.filename.clone(), info.original_filename.clone()))
        else {
            return Ok(None);
        };

        Ok(self.resolver.resolve(&filename, &original_filename).await)
    }

    fn require_id(&self, operation: &'static str) -> Result<String, LifecycleError> {
        self.id
            .clone()
            .ok_or(LifecycleError::MissingId { operation })
    }

    fn reject<T>(&self, rejection: Rejection) -> Verdict<T> {
        if let Rejection::CacheMismatch {
            extra_files: Some(extra_files),
        } = &rejection
        {
            tracing::info!(
                torrent = %self.label(),
                extra = ?extra_files,
                "Extra files required for cache"
            );
        }

        if rejection.is_policy() {
            tracing::info!(torrent = %self.label(), "Rejected: {}", rejection);
        } else {
            tracing::warn!(torrent = %self.label(), "Rejected: {}", rejection);
        }
        Err(rejection)
    }
}
