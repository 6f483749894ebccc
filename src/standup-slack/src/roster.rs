//! Roster resolution: channel name to ID, channel ID to members.
//!
//! Channel names are looked up in a [`ChannelDirectory`] filled from
//! `conversations.list` on first use and kept for the life of the process.
//! [`RosterResolver::force_refresh`] rebuilds it on demand.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{ChannelInfo, PlatformClient};
use crate::error::{SlackError, SlackResult};

/// Channel display name to channel entry.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    by_name: HashMap<String, ChannelInfo>,
}

impl ChannelDirectory {
    /// Build the directory from a channel listing.
    pub fn from_channels(channels: Vec<ChannelInfo>) -> Self {
        Self {
            by_name: channels
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
        }
    }

    /// Look up a channel by name; a leading `#` is ignored.
    pub fn get(&self, name: &str) -> Option<&ChannelInfo> {
        self.by_name.get(name.trim().trim_start_matches('#'))
    }

    /// All entries, sorted by name.
    pub fn channels(&self) -> Vec<ChannelInfo> {
        let mut channels: Vec<ChannelInfo> = self.by_name.values().cloned().collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        channels
    }
}

/// Resolves the main channel and its members through the platform client.
pub struct RosterResolver {
    client: Arc<dyn PlatformClient>,
    directory: RwLock<Option<ChannelDirectory>>,
}

impl RosterResolver {
    /// Create a resolver with an empty cache.
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
            directory: RwLock::new(None),
        }
    }

    /// Resolve a channel name to its ID, filling the cache if needed.
    pub async fn resolve_channel(&self, name: &str) -> SlackResult<String> {
        {
            let guard = self.directory.read().await;
            if let Some(directory) = guard.as_ref() {
                return lookup(directory, name);
            }
        }

        let mut guard = self.directory.write().await;
        if guard.is_none() {
            let channels = self.client.list_channels().await?;
            info!(count = channels.len(), "Populated channel directory");
            *guard = Some(ChannelDirectory::from_channels(channels));
        }

        match guard.as_ref() {
            Some(directory) => lookup(directory, name),
            None => Err(SlackError::Internal("Channel directory missing".to_string())),
        }
    }

    /// Fetch the ordered member IDs of a channel.
    pub async fn resolve_members(&self, channel_id: &str) -> SlackResult<Vec<String>> {
        let members = self.client.list_members(channel_id).await?;
        debug!(channel = channel_id, count = members.len(), "Resolved members");
        Ok(members)
    }

    /// Rebuild the channel directory from a fresh listing.
    pub async fn force_refresh(&self) -> SlackResult<Vec<ChannelInfo>> {
        let channels = self.client.list_channels().await?;
        let directory = ChannelDirectory::from_channels(channels);
        let listing = directory.channels();
        *self.directory.write().await = Some(directory);
        info!(count = listing.len(), "Refreshed channel directory");
        Ok(listing)
    }

    #[cfg(test)]
    async fn is_cached(&self) -> bool {
        self.directory.read().await.is_some()
    }
}

fn lookup(directory: &ChannelDirectory, name: &str) -> SlackResult<String> {
    directory
        .get(name)
        .map(|c| c.id.clone())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SlackError::Channel(format!("Channel '{}' not found", name)))
}
