use std::sync::Arc;

use futures::future::join_all;

use crate::{
    domain::{ChannelId, RelayMessage, SyncGroupId, UserId},
    messaging::port::RelayPlatform,
    ports::{SyncStore, Translator},
    relay::{
        batcher::{partition, LanguagePartition},
        delivery::{DeliveryAgent, DeliveryOutcome},
        identity::IdentityCache,
        resolver::DestinationResolver,
    },
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    SelfAuthored,
    IgnoredBot,
    NotLinked,
    NoDestinations,
    Relayed { group_id: SyncGroupId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestinationStatus {
    Delivery(DeliveryOutcome),
    TranslationUnavailable(String),
}

impl DestinationStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DestinationStatus::Delivery(o) if o.is_delivered())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestinationResult {
    pub channel_id: ChannelId,
    pub language: String,
    pub status: DestinationStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayReport {
    pub outcome: RelayOutcome,
    pub results: Vec<DestinationResult>,
    pub translation_calls: usize,
}

impl RelayReport {
    fn skipped(outcome: RelayOutcome) -> Self {
        Self {
            outcome,
            results: Vec::new(),
            translation_calls: 0,
        }
    }

    pub fn delivered(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status.is_delivered())
            .count()
    }
}

/// Entry point for relaying one inbound message to its sync group.
pub struct Relay {
    self_user_id: UserId,
    relay_bot_messages: bool,
    resolver: DestinationResolver,
    translator: Arc<dyn Translator>,
    identities: Arc<IdentityCache>,
    delivery: DeliveryAgent,
}

impl Relay {
    pub fn new(
        self_user_id: UserId,
        store: Arc<dyn SyncStore>,
        translator: Arc<dyn Translator>,
        platform: Arc<dyn RelayPlatform>,
        identities: Arc<IdentityCache>,
    ) -> Self {
        Self {
            self_user_id,
            relay_bot_messages: false,
            resolver: DestinationResolver::new(store),
            translator,
            delivery: DeliveryAgent::new(platform, identities.clone()),
            identities,
        }
    }

    pub fn relay_bot_messages(mut self, enabled: bool) -> Self {
        self.relay_bot_messages = enabled;
        self
    }

    /// Relay `message` to every sibling channel.
    ///
    /// Only store failures surface as `Err`; they happen before any side
    /// effect. Per-destination failures are reported in the returned report.
    pub async fn relay(&self, message: &RelayMessage) -> Result<RelayReport> {
        if self.is_self_authored(message).await {
            return Ok(RelayReport::skipped(RelayOutcome::SelfAuthored));
        }
        if message.author.is_bot && !self.relay_bot_messages {
            return Ok(RelayReport::skipped(RelayOutcome::IgnoredBot));
        }

        let Some(resolution) = self.resolver.resolve(message.source_channel_id).await? else {
            tracing::debug!(channel = message.source_channel_id.0, "channel not linked");
            return Ok(RelayReport::skipped(RelayOutcome::NotLinked));
        };
        if resolution.destinations.is_empty() {
            return Ok(RelayReport::skipped(RelayOutcome::NoDestinations));
        }

        let partitions = partition(&resolution.destinations, &resolution.source_language);
        let runs = join_all(
            partitions
                .iter()
                .map(|p| self.run_partition(p, message)),
        )
        .await;

        let mut results = Vec::new();
        let mut translation_calls = 0;
        for (called, partition_results) in runs {
            translation_calls += usize::from(called);
            results.extend(partition_results);
        }

        let report = RelayReport {
            outcome: RelayOutcome::Relayed {
                group_id: resolution.group_id,
            },
            results,
            translation_calls,
        };
        tracing::info!(
            channel = message.source_channel_id.0,
            message = message.message_id.0,
            destinations = report.results.len(),
            delivered = report.delivered(),
            translation_calls = report.translation_calls,
            "relayed message"
        );
        Ok(report)
    }

    async fn is_self_authored(&self, message: &RelayMessage) -> bool {
        if message.author.id == self.self_user_id {
            return true;
        }
        match &message.webhook_id {
            Some(id) => self.identities.owns(id).await,
            None => false,
        }
    }

    /// Render once, then deliver to every channel of the partition.
    ///
    /// Returns whether the translator was called, plus per-channel results.
    async fn run_partition(
        &self,
        part: &LanguagePartition,
        message: &RelayMessage,
    ) -> (bool, Vec<DestinationResult>) {
        let text = message.text_content.as_str();
        let needs_translation = !part.pass_through && !text.trim().is_empty();

        let rendered = if needs_translation {
            self.translator.translate(text, &part.language).await
        } else {
            Ok(text.to_string())
        };

        let results = match rendered {
            Ok(rendered) => {
                let deliveries = part.channel_ids.iter().map(|&channel_id| {
                    let rendered = rendered.as_str();
                    async move {
                        let outcome = self.delivery.deliver(channel_id, rendered, message).await;
                        DestinationResult {
                            channel_id,
                            language: part.language.clone(),
                            status: DestinationStatus::Delivery(outcome),
                        }
                    }
                });
                join_all(deliveries).await
            }
            Err(e) => {
                tracing::error!(
                    language = %part.language,
                    channels = part.channel_ids.len(),
                    error = %e,
                    "translation unavailable, skipping partition"
                );
                let reason = e.to_string();
                part.channel_ids
                    .iter()
                    .map(|&channel_id| DestinationResult {
                        channel_id,
                        language: part.language.clone(),
                        status: DestinationStatus::TranslationUnavailable(reason.clone()),
                    })
                    .collect()
            }
        };

        (needs_translation, results)
    }
}
