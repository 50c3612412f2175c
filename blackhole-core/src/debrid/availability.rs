//! Instant availability (cache) lookups

use std::collections::BTreeSet;

use serde_json::Value;

use super::DebridClient;
use crate::torrent::ContentHash;

/// File ids the service holds cached together as one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AvailabilityGroup(BTreeSet<String>);

impl AvailabilityGroup {
    pub fn new<I, S>(file_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(file_ids.into_iter().map(Into::into).collect())
    }

    pub fn file_ids(&self) -> &BTreeSet<String> {
        &self.0
    }

    /// Set equality with `file_ids`, ignoring order.
    pub fn matches(&self, file_ids: &BTreeSet<String>) -> bool {
        &self.0 == file_ids
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.0.contains(file_id)
    }
}

/// Cached bundles of the first hoster, in service order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AvailabilitySet(Vec<AvailabilityGroup>);

impl AvailabilitySet {
    pub fn new(groups: Vec<AvailabilityGroup>) -> Self {
        Self(groups)
    }

    /// Builds the set from an instant availability response body.
    ///
    /// The body maps hash to hoster to a list of bundles, each bundle mapping
    /// file id to file metadata. Only the first hash and first hoster entry
    /// are read. Anything missing or of the wrong shape yields an empty set.
    pub fn from_response(body: &Value) -> Self {
        let first_hoster = body
            .as_object()
            .and_then(|by_hash| by_hash.values().next())
            .and_then(Value::as_object)
            .and_then(|by_hoster| by_hoster.values().next());

        let bundles: Vec<&Value> = match first_hoster {
            Some(Value::Array(bundles)) => bundles.iter().collect(),
            Some(Value::Object(bundles)) => bundles.values().collect(),
            _ => Vec::new(),
        };

        let groups = bundles
            .into_iter()
            .filter_map(Value::as_object)
            .map(|bundle| AvailabilityGroup::new(bundle.keys().cloned()))
            .collect();

        Self(groups)
    }

    pub fn groups(&self) -> &[AvailabilityGroup] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether some bundle is exactly `file_ids`.
    pub fn has_exact_group(&self, file_ids: &BTreeSet<String>) -> bool {
        self.0.iter().any(|group| group.matches(file_ids))
    }

    /// First bundle that contains `file_id`.
    pub fn group_containing(&self, file_id: &str) -> Option<&AvailabilityGroup> {
        self.0.iter().find(|group| group.contains(file_id))
    }
}

/// Outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Hash is not a 40-character info hash; cache gating is skipped.
    TreatedAsAvailable,
    /// At least one bundle is cached.
    Cached(AvailabilitySet),
    /// The service holds nothing for this hash.
    NotCached,
    /// The lookup itself failed.
    Unknown,
}

impl Availability {
    /// Whether a cache-only submission may proceed.
    pub fn permits_submission(&self) -> bool {
        matches!(
            self,
            Availability::TreatedAsAvailable | Availability::Cached(_)
        )
    }
}

impl From<AvailabilitySet> for Availability {
    fn from(set: AvailabilitySet) -> Self {
        if set.is_empty() {
            Availability::NotCached
        } else {
            Availability::Cached(set)
        }
    }
}

/// Checks the cache status of `hash`.
///
/// Hashes that are not 40 characters long are never looked up; the service
/// only indexes hex info hashes.
pub async fn check_availability<C>(client: &C, hash: &ContentHash) -> Availability
where
    C: DebridClient + ?Sized,
{
    if !hash.is_info_hash() {
        tracing::debug!(%hash, "Hash is not an info hash, skipping cache lookup");
        return Availability::TreatedAsAvailable;
    }

    match client.instant_availability(hash).await {
        Ok(set) => Availability::from(set),
        Err(e) => {
            tracing::warn!(%hash, "Instant availability lookup failed: {}", e);
            Availability::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::debrid::test_mocks::MockDebridClient;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_from_response_uses_first_hoster() {
        let body = json!({
            "0123456789abcdef0123456789abcdef01234567": {
                "rd": [
                    {"1": {"filename": "a.mkv", "filesize": 100}, "2": {"filename": "b.mkv", "filesize": 200}},
                    {"2": {"filename": "b.mkv", "filesize": 200}}
                ],
                "other": [
                    {"3": {"filename": "c.mkv", "filesize": 1}}
                ]
            }
        });

        let set = AvailabilitySet::from_response(&body);
        assert_eq!(set.groups().len(), 2);
        assert!(set.has_exact_group(&ids(&["1", "2"])));
        assert!(set.has_exact_group(&ids(&["2"])));
        assert!(!set.has_exact_group(&ids(&["3"])));
    }

    #[test]
    fn test_from_response_empty_shapes() {
        assert!(AvailabilitySet::from_response(&json!({})).is_empty());
        assert!(AvailabilitySet::from_response(&json!([])).is_empty());
        assert!(
            AvailabilitySet::from_response(&json!({"0123456789abcdef0123456789abcdef01234567": []}))
                .is_empty()
        );
        assert!(
            AvailabilitySet::from_response(&json!({"0123456789abcdef0123456789abcdef01234567": {"rd": []}}))
                .is_empty()
        );
    }

    #[test]
    fn test_group_containing() {
        let set = AvailabilitySet::new(vec![
            AvailabilityGroup::new(["1"]),
            AvailabilityGroup::new(["2", "3"]),
        ]);
        assert_eq!(
            set.group_containing("3").map(AvailabilityGroup::file_ids),
            Some(&ids(&["2", "3"]))
        );
        assert!(set.group_containing("4").is_none());
    }

    #[tokio::test]
    async fn test_check_availability_skips_lookup_for_short_hash() {
        let client = MockDebridClient::new();
        let hash = ContentHash::new("MFRGGZDFMZTWQ2LKNNWG23TPOBYXE43U");

        let availability = check_availability(&client, &hash).await;
        assert_eq!(availability, Availability::TreatedAsAvailable);
        assert!(availability.permits_submission());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_check_availability_not_cached() {
        let client = MockDebridClient::new();
        let hash = ContentHash::new("0123456789abcdef0123456789abcdef01234567");

        let availability = check_availability(&client, &hash).await;
        assert_eq!(availability, Availability::NotCached);
        assert!(!availability.permits_submission());
    }

    #[tokio::test]
    async fn test_check_availability_failure_is_unknown() {
        let client = MockDebridClient::new().with_failing_availability();
        let hash = ContentHash::new("0123456789abcdef0123456789abcdef01234567");

        let availability = check_availability(&client, &hash).await;
        assert_eq!(availability, Availability::Unknown);
        assert!(!availability.permits_submission());
    }
}
