//! Mock debrid client for lifecycle tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    AddedTorrent, AvailabilitySet, AvailableHost, DebridClient, DebridError, RemoteTorrentInfo,
};
use crate::torrent::ContentHash;

/// Calls recorded by [`MockDebridClient`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    InstantAvailability(String),
    AvailableHosts,
    AddTorrent { host: String, size: usize },
    AddMagnet { host: String, magnet: String },
    TorrentInfo(String),
    SelectFiles { id: String, file_ids: Vec<String> },
    DeleteTorrent(String),
}

/// In-memory debrid service.
///
/// Every response is configurable; `None` makes the corresponding call fail
/// the way an exhausted retry would.
#[derive(Debug)]
pub struct MockDebridClient {
    availability: Option<AvailabilitySet>,
    hosts: Option<Vec<AvailableHost>>,
    added_id: Option<String>,
    info: Mutex<Option<RemoteTorrentInfo>>,
    select_succeeds: bool,
    delete_succeeds: bool,
    calls: Mutex<Vec<MockCall>>,
}

impl MockDebridClient {
    /// Creates a mock with nothing cached, one upload host and id `MOCKID`.
    pub fn new() -> Self {
        Self {
            availability: Some(AvailabilitySet::default()),
            hosts: Some(vec![AvailableHost {
                host: "real-debrid.com".to_string(),
            }]),
            added_id: Some("MOCKID".to_string()),
            info: Mutex::new(None),
            select_succeeds: true,
            delete_succeeds: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_availability(mut self, availability: AvailabilitySet) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn with_failing_availability(mut self) -> Self {
        self.availability = None;
        self
    }

    pub fn with_hosts(mut self, hosts: Vec<AvailableHost>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    pub fn with_failing_hosts(mut self) -> Self {
        self.hosts = None;
        self
    }

    pub fn with_failing_add(mut self) -> Self {
        self.added_id = None;
        self
    }

    pub fn with_info(self, info: RemoteTorrentInfo) -> Self {
        self.set_info(Some(info));
        self
    }

    pub fn with_failing_select(mut self) -> Self {
        self.select_succeeds = false;
        self
    }

    pub fn with_failing_delete(mut self) -> Self {
        self.delete_succeeds = false;
        self
    }

    /// Replaces the info returned by later `torrent_info` calls.
    pub fn set_info(&self, info: Option<RemoteTorrentInfo>) {
        *self.info.lock().unwrap() = info;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(endpoint: &str) -> DebridError {
        DebridError::RequestFailed {
            endpoint: endpoint.to_string(),
        }
    }
}

impl Default for MockDebridClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DebridClient for MockDebridClient {
    async fn instant_availability(
        &self,
        hash: &ContentHash,
    ) -> Result<AvailabilitySet, DebridError> {
        self.record(MockCall::InstantAvailability(hash.to_string()));
        self.availability
            .clone()
            .ok_or_else(|| Self::failure("torrents/instantAvailability"))
    }

    async fn available_hosts(&self) -> Result<Vec<AvailableHost>, DebridError> {
        self.record(MockCall::AvailableHosts);
        self.hosts
            .clone()
            .ok_or_else(|| Self::failure("torrents/availableHosts"))
    }

    async fn add_torrent(&self, host: &str, torrent: &[u8]) -> Result<AddedTorrent, DebridError> {
        self.record(MockCall::AddTorrent {
            host: host.to_string(),
            size: torrent.len(),
        });
        self.added_id
            .clone()
            .map(|id| AddedTorrent { id })
            .ok_or_else(|| Self::failure("torrents/addTorrent"))
    }

    async fn add_magnet(&self, host: &str, magnet: &str) -> Result<AddedTorrent, DebridError> {
        self.record(MockCall::AddMagnet {
            host: host.to_string(),
            magnet: magnet.to_string(),
        });
        self.added_id
            .clone()
            .map(|id| AddedTorrent { id })
            .ok_or_else(|| Self::failure("torrents/addMagnet"))
    }

    async fn torrent_info(&self, id: &str) -> Result<RemoteTorrentInfo, DebridError> {
        self.record(MockCall::TorrentInfo(id.to_string()));
        self.info
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Self::failure("torrents/info"))
    }

    async fn select_files(&self, id: &str, file_ids: &[String]) -> Result<(), DebridError> {
        self.record(MockCall::SelectFiles {
            id: id.to_string(),
            file_ids: file_ids.to_vec(),
        });
        if self.select_succeeds {
            Ok(())
        } else {
            Err(Self::failure("torrents/selectFiles"))
        }
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        self.record(MockCall::DeleteTorrent(id.to_string()));
        if self.delete_succeeds {
            Ok(())
        } else {
            Err(Self::failure("torrents/delete"))
        }
    }
}
