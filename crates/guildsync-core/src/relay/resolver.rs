use std::sync::Arc;

use crate::{
    domain::{ChannelId, SyncGroupId},
    languages::normalize_language,
    ports::SyncStore,
    Result,
};

/// A sibling channel and the language it reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub channel_id: ChannelId,
    pub language: String,
}

/// Point-in-time view of a source channel's sync group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub group_id: SyncGroupId,
    pub source_language: String,
    /// Every other channel in the group; never contains the source.
    pub destinations: Vec<Destination>,
}

#[derive(Clone)]
pub struct DestinationResolver {
    store: Arc<dyn SyncStore>,
}

impl DestinationResolver {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` means the channel is not linked to any group.
    pub async fn resolve(&self, source: ChannelId) -> Result<Option<Resolution>> {
        let Some(group_id) = self.store.find_group_for_channel(source).await? else {
            return Ok(None);
        };

        let links = self.store.list_channels_in_group(&group_id).await?;

        let mut source_language = None;
        let mut destinations = Vec::with_capacity(links.len().saturating_sub(1));
        for link in links {
            let language = normalize_language(link.language_code.as_deref());
            if link.channel_id == source {
                source_language = Some(language);
            } else {
                destinations.push(Destination {
                    channel_id: link.channel_id,
                    language,
                });
            }
        }

        Ok(Some(Resolution {
            group_id,
            // The store can drop the source link between the two reads.
            source_language: source_language.unwrap_or_else(|| normalize_language(None)),
            destinations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store_with_group;

    #[tokio::test]
    async fn excludes_source_and_normalizes_languages() {
        let (store, group_id) =
            store_with_group(&[(1, Some("ES")), (2, None), (3, Some(" fr "))]).await;
        let resolver = DestinationResolver::new(Arc::new(store));

        let r = resolver.resolve(ChannelId(1)).await.unwrap().unwrap();
        assert_eq!(r.group_id, group_id);
        assert_eq!(r.source_language, "es");
        assert_eq!(
            r.destinations,
            vec![
                Destination {
                    channel_id: ChannelId(2),
                    language: "en".to_string()
                },
                Destination {
                    channel_id: ChannelId(3),
                    language: "fr".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn untagged_source_defaults_to_english() {
        let (store, _) = store_with_group(&[(1, None), (2, Some("de"))]).await;
        let resolver = DestinationResolver::new(Arc::new(store));
        let r = resolver.resolve(ChannelId(1)).await.unwrap().unwrap();
        assert_eq!(r.source_language, "en");
        assert_eq!(r.destinations.len(), 1);
    }

    #[tokio::test]
    async fn unlinked_channel_resolves_to_none() {
        let (store, _) = store_with_group(&[(1, None), (2, None)]).await;
        let resolver = DestinationResolver::new(Arc::new(store));
        assert!(resolver.resolve(ChannelId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lone_channel_has_no_destinations() {
        let (store, _) = store_with_group(&[(1, Some("en"))]).await;
        let resolver = DestinationResolver::new(Arc::new(store));
        let r = resolver.resolve(ChannelId(1)).await.unwrap().unwrap();
        assert!(r.destinations.is_empty());
    }
}
