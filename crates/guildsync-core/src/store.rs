//! JSON-file backed [`SyncStore`].
//!
//! All records live in memory; every write persists a full snapshot
//! (temp file + rename) when a path is configured.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{domain::*, errors::Error, ports::SyncStore, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    guilds: Vec<GuildRecord>,
    #[serde(default)]
    groups: Vec<SyncGroup>,
    #[serde(default)]
    links: Vec<ChannelLink>,
}

#[derive(Debug, Default, Clone)]
struct State {
    users: HashMap<UserId, UserRecord>,
    guilds: HashMap<GuildId, GuildRecord>,
    groups: HashMap<SyncGroupId, SyncGroup>,
    // Keyed by channel: one active link per channel.
    links: HashMap<ChannelId, ChannelLink>,
}

impl State {
    fn from_snapshot(s: Snapshot) -> Self {
        Self {
            users: s.users.into_iter().map(|u| (u.id, u)).collect(),
            guilds: s.guilds.into_iter().map(|g| (g.id, g)).collect(),
            groups: s.groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            links: s.links.into_iter().map(|l| (l.channel_id, l)).collect(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        let mut links: Vec<_> = self.links.values().cloned().collect();
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let mut groups: Vec<_> = self.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Snapshot {
            users: self.users.values().cloned().collect(),
            guilds: self.guilds.values().cloned().collect(),
            groups,
            links,
        }
    }
}

pub struct JsonFileStore {
    path: Option<PathBuf>,
    state: RwLock<State>,
}

impl JsonFileStore {
    /// Open (or start) a store persisted at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(txt) if txt.trim().is_empty() => State::default(),
            Ok(txt) => State::from_snapshot(serde_json::from_str(&txt)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(Error::Io(e)),
        };
        tracing::info!(
            path = %path.display(),
            groups = state.groups.len(),
            links = state.links.len(),
            "store loaded"
        );
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Store without persistence.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(State::default()),
        }
    }

    async fn persist(&self, state: &State) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let txt = serde_json::to_string_pretty(&state.snapshot())?;
        write_atomic(path, txt.as_bytes()).await
    }

    /// Persist `next`, then make it the live state. A failed write leaves
    /// `current` untouched.
    async fn commit(&self, current: &mut State, next: State) -> Result<()> {
        self.persist(&next).await?;
        *current = next;
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl SyncStore for JsonFileStore {
    async fn find_group_for_channel(&self, channel_id: ChannelId) -> Result<Option<SyncGroupId>> {
        let state = self.state.read().await;
        Ok(state
            .links
            .get(&channel_id)
            .map(|l| l.sync_group_id.clone()))
    }

    async fn list_channels_in_group(&self, group_id: &SyncGroupId) -> Result<Vec<ChannelLink>> {
        let state = self.state.read().await;
        let mut links: Vec<_> = state
            .links
            .values()
            .filter(|l| &l.sync_group_id == group_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.channel_id.0.cmp(&b.channel_id.0))
        });
        Ok(links)
    }

    async fn get_group(&self, group_id: &SyncGroupId) -> Result<Option<SyncGroup>> {
        Ok(self.state.read().await.groups.get(group_id).cloned())
    }

    async fn upsert_user(&self, user: UserRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.get(&user.id) == Some(&user) {
            return Ok(());
        }
        let mut next = state.clone();
        next.users.insert(user.id, user);
        self.commit(&mut state, next).await
    }

    async fn upsert_guild(&self, guild: GuildRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.guilds.get(&guild.id) == Some(&guild) {
            return Ok(());
        }
        let mut next = state.clone();
        next.guilds.insert(guild.id, guild);
        self.commit(&mut state, next).await
    }

    async fn create_group(&self, created_by: UserId) -> Result<SyncGroup> {
        let group = SyncGroup {
            id: SyncGroupId(uuid::Uuid::new_v4().to_string()),
            name: "Unnamed Group".to_string(),
            description: String::new(),
            created_by,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.groups.insert(group.id.clone(), group.clone());
        self.commit(&mut state, next).await?;
        tracing::info!(group = %group.id, created_by = created_by.0, "sync group created");
        Ok(group)
    }

    async fn delete_group(&self, group_id: &SyncGroupId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(group_id) {
            return Ok(());
        }
        if state.links.values().any(|l| &l.sync_group_id == group_id) {
            return Err(Error::Store(format!(
                "sync group {group_id} still has linked channels"
            )));
        }
        let mut next = state.clone();
        next.groups.remove(group_id);
        self.commit(&mut state, next).await?;
        tracing::info!(group = %group_id, "sync group deleted");
        Ok(())
    }

    async fn link_channel(&self, link: ChannelLink) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&link.sync_group_id) {
            return Err(Error::Store(format!(
                "unknown sync group {}",
                link.sync_group_id
            )));
        }
        if let Some(existing) = state.links.get(&link.channel_id) {
            return Err(Error::Store(format!(
                "channel {} is already linked to group {}",
                link.channel_id, existing.sync_group_id
            )));
        }
        let (channel, group) = (link.channel_id, link.sync_group_id.clone());
        let language = link.language_code.clone();
        let mut next = state.clone();
        next.links.insert(link.channel_id, link);
        self.commit(&mut state, next).await?;
        tracing::info!(
            channel = channel.0,
            group = %group,
            language = language.as_deref().unwrap_or("-"),
            "channel linked"
        );
        Ok(())
    }

    async fn unlink_channel(&self, channel_id: ChannelId) -> Result<Option<ChannelLink>> {
        let mut state = self.state.write().await;
        if !state.links.contains_key(&channel_id) {
            return Ok(None);
        }
        let mut next = state.clone();
        let removed = next.links.remove(&channel_id);
        self.commit(&mut state, next).await?;
        tracing::info!(channel = channel_id.0, "channel unlinked");
        Ok(removed)
    }
}
