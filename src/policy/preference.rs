//! Static format policies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{FormatChoiceRequest, FormatPolicy};
use crate::types::ConnectionFormat;

/// Accepts every candidate in ascending format order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptAll;

impl FormatPolicy for AcceptAll {
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat> {
        request.candidates.to_vec()
    }
}

/// Fixed preference list.
///
/// Candidates named in `order` come first, in list order of their first
/// mention. Candidates not named are appended in ascending order when
/// `allow_unlisted` is set and dropped otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceOrder {
    /// Most preferred first.
    pub order: Vec<ConnectionFormat>,
    /// Whether formats missing from `order` remain usable.
    #[serde(default)]
    pub allow_unlisted: bool,
}

impl PreferenceOrder {
    /// Preference list that only allows the listed formats.
    pub fn strict(order: Vec<ConnectionFormat>) -> Self {
        Self {
            order,
            allow_unlisted: false,
        }
    }

    /// Preference list that keeps unlisted formats as a last resort.
    pub fn lenient(order: Vec<ConnectionFormat>) -> Self {
        Self {
            order,
            allow_unlisted: true,
        }
    }
}

impl FormatPolicy for PreferenceOrder {
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat> {
        let mut seen = BTreeSet::new();
        let mut chosen: Vec<ConnectionFormat> = self
            .order
            .iter()
            .copied()
            .filter(|f| request.candidates.contains(f) && seen.insert(*f))
            .collect();
        if self.allow_unlisted {
            chosen.extend(
                request
                    .candidates
                    .iter()
                    .copied()
                    .filter(|f| !self.order.contains(f)),
            );
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Route, SinkId, SourceId};

    const PCM: ConnectionFormat = ConnectionFormat::new(0x100);
    const MP3: ConnectionFormat = ConnectionFormat::new(0x101);

    fn ask<P: FormatPolicy>(policy: &P, candidates: &[ConnectionFormat]) -> Vec<ConnectionFormat> {
        let route = Route::new(SourceId::new(1), SinkId::new(1), Vec::new());
        policy.choose_formats(&FormatChoiceRequest {
            source_id: SourceId::new(1),
            sink_id: SinkId::new(1),
            route: &route,
            candidates,
        })
    }

    #[test]
    fn test_accept_all() {
        assert_eq!(ask(&AcceptAll, &[ConnectionFormat::STEREO, PCM]), vec![ConnectionFormat::STEREO, PCM]);
        assert!(ask(&AcceptAll, &[]).is_empty());
    }

    #[test]
    fn test_strict_preference() {
        let policy = PreferenceOrder::strict(vec![MP3, ConnectionFormat::STEREO]);
        assert_eq!(ask(&policy, &[ConnectionFormat::STEREO, PCM, MP3]), vec![MP3, ConnectionFormat::STEREO]);
        assert!(ask(&policy, &[PCM]).is_empty());
    }

    #[test]
    fn test_repeated_preference_keeps_first_mention() {
        let policy = PreferenceOrder::strict(vec![MP3, PCM, MP3]);
        assert_eq!(ask(&policy, &[PCM, MP3]), vec![MP3, PCM]);

        let policy = PreferenceOrder::lenient(vec![PCM, MP3, PCM]);
        assert_eq!(ask(&policy, &[ConnectionFormat::STEREO, PCM, MP3]), vec![PCM, MP3, ConnectionFormat::STEREO]);
    }

    #[test]
    fn test_lenient_preference() {
        let policy = PreferenceOrder::lenient(vec![MP3]);
        assert_eq!(ask(&policy, &[ConnectionFormat::STEREO, PCM, MP3]), vec![MP3, ConnectionFormat::STEREO, PCM]);
    }

    #[test]
    fn test_preference_from_json() {
        let policy: PreferenceOrder = serde_json::from_str(r#"{"order":[257,2]}"#).unwrap();
        assert_eq!(policy, PreferenceOrder::strict(vec![MP3, ConnectionFormat::STEREO]));
    }
}
