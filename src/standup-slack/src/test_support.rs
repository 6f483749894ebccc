//! In-memory [`PlatformClient`] that records every call.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::client::{ChannelInfo, PlatformClient};
use crate::error::{SlackError, SlackResult};

/// One recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListChannels,
    ListMembers(String),
    OpenDm(String),
    Post {
        channel: String,
        text: String,
        thread: Option<String>,
    },
    DisplayName(String),
    TestApi(Option<String>),
}

impl Call {
    fn op(&self) -> &'static str {
        match self {
            Call::ListChannels => "list_channels",
            Call::ListMembers(_) => "list_members",
            Call::OpenDm(_) => "open_direct_message",
            Call::Post { .. } => "post_message",
            Call::DisplayName(_) => "display_name",
            Call::TestApi(_) => "test_api",
        }
    }
}

#[derive(Default)]
pub struct MockPlatform {
    channels: Mutex<Vec<ChannelInfo>>,
    members: Mutex<HashMap<String, Vec<String>>>,
    names: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Call>>,
    slow_posts: Mutex<Vec<(String, Duration)>>,
    next_ts: AtomicU64,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(self, id: &str, name: &str) -> Self {
        self.add_channel(id, name);
        self
    }

    pub fn add_channel(&self, id: &str, name: &str) {
        self.channels.lock().unwrap().push(ChannelInfo {
            id: id.to_string(),
            name: name.to_string(),
            is_member: true,
        });
    }

    pub fn with_members(self, channel: &str, members: &[&str]) -> Self {
        self.members.lock().unwrap().insert(
            channel.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn with_name(self, member: &str, name: &str) -> Self {
        self.names
            .lock()
            .unwrap()
            .insert(member.to_string(), name.to_string());
        self
    }

    /// Make every call to `op` fail with a transport error.
    pub fn failing(self, op: &'static str) -> Self {
        self.fail(op);
        self
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Delay posts whose text contains `fragment` before they are recorded.
    pub fn with_slow_post(self, fragment: &str, delay: Duration) -> Self {
        self.slow_posts
            .lock()
            .unwrap()
            .push((fragment.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    /// Posts as `(channel, text, thread)`.
    pub fn posts(&self) -> Vec<(String, String, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Post {
                    channel,
                    text,
                    thread,
                } => Some((channel, text, thread)),
                _ => None,
            })
            .collect()
    }

    /// Texts posted into the DM channel of `member`.
    pub fn dms_to(&self, member: &str) -> Vec<String> {
        let dm = dm_channel(member);
        self.posts()
            .into_iter()
            .filter(|(channel, _, _)| *channel == dm)
            .map(|(_, text, _)| text)
            .collect()
    }

    fn record(&self, call: Call) -> SlackResult<()> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(op) {
            return Err(SlackError::Network(format!("{} failed", op)));
        }
        Ok(())
    }
}

pub fn dm_channel(member: &str) -> String {
    format!("D{}", member)
}

#[async_trait::async_trait]
impl PlatformClient for MockPlatform {
    async fn list_channels(&self) -> SlackResult<Vec<ChannelInfo>> {
        self.record(Call::ListChannels)?;
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn list_members(&self, channel_id: &str) -> SlackResult<Vec<String>> {
        self.record(Call::ListMembers(channel_id.to_string()))?;
        self.members
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .ok_or_else(|| SlackError::Channel(format!("channel_not_found: {}", channel_id)))
    }

    async fn open_direct_message(&self, member_id: &str) -> SlackResult<String> {
        self.record(Call::OpenDm(member_id.to_string()))?;
        Ok(dm_channel(member_id))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> SlackResult<String> {
        let delay = self
            .slow_posts
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| text.contains(fragment.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Call::Post {
            channel: channel_id.to_string(),
            text: text.to_string(),
            thread: thread_ts.map(str::to_string),
        })?;
        let n = self.next_ts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("1700000000.{:06}", n))
    }

    async fn display_name(&self, member_id: &str) -> SlackResult<String> {
        self.record(Call::DisplayName(member_id.to_string()))?;
        self.names
            .lock()
            .unwrap()
            .get(member_id)
            .cloned()
            .ok_or_else(|| SlackError::User(format!("user_not_found: {}", member_id)))
    }

    async fn test_api(&self, error: Option<&str>) -> SlackResult<()> {
        self.record(Call::TestApi(error.map(str::to_string)))?;
        match error {
            Some(e) => Err(SlackError::Api(format!("api.test: {}", e))),
            None => Ok(()),
        }
    }
}
