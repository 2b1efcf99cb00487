use crate::{domain::ChannelId, relay::resolver::Destination};

/// Destinations sharing one target language within a single relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguagePartition {
    pub language: String,
    pub channel_ids: Vec<ChannelId>,
    /// Same language as the source: forward verbatim, no translation call.
    pub pass_through: bool,
}

/// Group destinations by language, in order of first occurrence.
///
/// Every non-pass-through partition costs exactly one translation call, so the
/// number of calls equals the number of distinct non-source languages.
pub fn partition(destinations: &[Destination], source_language: &str) -> Vec<LanguagePartition> {
    let mut out: Vec<LanguagePartition> = Vec::new();
    for dest in destinations {
        let idx = match out.iter().position(|p| p.language == dest.language) {
            Some(idx) => idx,
            None => {
                out.push(LanguagePartition {
                    language: dest.language.clone(),
                    channel_ids: Vec::new(),
                    pass_through: dest.language == source_language,
                });
                out.len() - 1
            }
        };
        let channels = &mut out[idx].channel_ids;
        if !channels.contains(&dest.channel_id) {
            channels.push(dest.channel_id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(channel: u64, lang: &str) -> Destination {
        Destination {
            channel_id: ChannelId(channel),
            language: lang.to_string(),
        }
    }

    #[test]
    fn groups_by_language_in_first_seen_order() {
        let parts = partition(
            &[dest(2, "es"), dest(3, "en"), dest(4, "es"), dest(5, "fr")],
            "en",
        );
        let summary: Vec<_> = parts
            .iter()
            .map(|p| (p.language.as_str(), p.channel_ids.len(), p.pass_through))
            .collect();
        assert_eq!(
            summary,
            vec![("es", 2, false), ("en", 1, true), ("fr", 1, false)]
        );
        assert_eq!(parts[0].channel_ids, vec![ChannelId(2), ChannelId(4)]);
    }

    #[test]
    fn translation_partitions_equal_distinct_foreign_languages() {
        let dests: Vec<_> = (0..30u64)
            .map(|i| dest(i, ["en", "es", "ja", "es", "de"][(i % 5) as usize]))
            .collect();
        let parts = partition(&dests, "en");
        let needing_translation = parts.iter().filter(|p| !p.pass_through).count();
        assert_eq!(needing_translation, 3);
        let total: usize = parts.iter().map(|p| p.channel_ids.len()).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn duplicate_channels_are_collapsed() {
        let parts = partition(&[dest(2, "es"), dest(2, "es")], "en");
        assert_eq!(parts[0].channel_ids, vec![ChannelId(2)]);
    }

    #[test]
    fn empty_input_yields_no_partitions() {
        assert!(partition(&[], "en").is_empty());
    }
}
