use tracing::{debug, info};

use super::vote::{majority_vote, rank_by_frequency, union_first_seen};
use crate::config::ConsensusSettings;
use crate::pipeline::domain::{
    AnalysisResult, ConsensusCharacters, ConsensusMap, ConsensusResult, ConsensusSituation,
    FrameOutcome, Resolved,
};

/// Fuses per-frame analyses into one report.
pub struct ConsensusAggregator {
    max_tags: usize,
}

impl ConsensusAggregator {
    pub fn new(max_tags: usize) -> Self {
        Self { max_tags }
    }

    pub fn from_settings(settings: &ConsensusSettings) -> Self {
        Self::new(settings.max_tags)
    }

    /// `None` unless every outcome carries an analysis.
    pub fn aggregate(&self, outcomes: &[FrameOutcome]) -> Option<ConsensusResult> {
        if outcomes.is_empty() {
            debug!("No outcomes to aggregate");
            return None;
        }
        let results: Option<Vec<&AnalysisResult>> =
            outcomes.iter().map(FrameOutcome::result).collect();
        match results {
            Some(results) => Some(self.aggregate_results(&results)),
            None => {
                let analyzed = outcomes.iter().filter(|o| o.result().is_some()).count();
                info!(
                    "Withholding consensus, {} of {} frames analyzed",
                    analyzed,
                    outcomes.len()
                );
                None
            }
        }
    }

    /// Aggregates a non-empty list of results.
    pub fn aggregate_results(&self, results: &[&AnalysisResult]) -> ConsensusResult {
        let vote = |pick: fn(&AnalysisResult) -> Option<&str>| -> Resolved {
            majority_vote(results.iter().map(|r| pick(*r))).into()
        };

        let game = vote(AnalysisResult::game);
        let player = vote(AnalysisResult::player);
        let action = vote(AnalysisResult::action);
        let game_phase = vote(AnalysisResult::game_phase);
        let location = vote(AnalysisResult::location);

        // Status prose rarely repeats, so the middle frame speaks for the run.
        let player_status: Resolved = results
            .get(results.len() / 2)
            .and_then(|r| r.player_status())
            .map(|status| status.render())
            .into();

        let summary = summarize(&game, &player, &location, &action, &game_phase);

        ConsensusResult {
            characters: ConsensusCharacters {
                player,
                allies: union_first_seen(results.iter().map(|r| r.allies())),
                enemies: union_first_seen(results.iter().map(|r| r.enemies())),
            },
            situation: ConsensusSituation {
                action,
                game_phase,
                player_status,
            },
            map: ConsensusMap {
                location,
                features: union_first_seen(results.iter().map(|r| r.features())),
            },
            tags: rank_by_frequency(results.iter().map(|r| r.tags()), self.max_tags),
            game,
            summary,
            frame_count: results.len(),
        }
    }
}

impl Default for ConsensusAggregator {
    fn default() -> Self {
        Self::from_settings(&ConsensusSettings::default())
    }
}

fn summarize(
    game: &Resolved,
    player: &Resolved,
    location: &Resolved,
    action: &Resolved,
    game_phase: &Resolved,
) -> String {
    format!(
        "Playing as {} in {}, in a {} situation at {}. The game is currently in the {} stage.",
        player.or("the player"),
        game.or("the game"),
        action.or("gameplay"),
        location.or("the map"),
        game_phase.or("in-progress"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::error::AnalysisError;
    use crate::pipeline::context::FrameMetrics;
    use crate::pipeline::testing::{result_for, result_from_json};
    use bytes::Bytes;
    use proptest::prelude::*;

    fn analyzed(result: AnalysisResult) -> FrameOutcome {
        FrameOutcome::analyzed(
            Frame::captured(1.0, Bytes::from_static(b"jpeg")),
            result,
            FrameMetrics::new(),
        )
    }

    fn rejected() -> FrameOutcome {
        FrameOutcome::rejected(
            Frame::captured(1.0, Bytes::from_static(b"jpeg")),
            AnalysisError::EmptyResponse,
            FrameMetrics::new(),
        )
    }

    #[test]
    fn combines_games_and_tags() {
        let outcomes = vec![
            analyzed(result_from_json(r##"{"game": "LoL", "tags": ["#fight", "#gank"]}"##)),
            analyzed(result_from_json(r##"{"game": "LoL", "tags": ["#fight"]}"##)),
            analyzed(result_from_json(r##"{"game": "Dota", "tags": ["#push"]}"##)),
        ];
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();

        assert_eq!(consensus.game, Resolved::Value("LoL".to_string()));
        assert_eq!(consensus.tags, vec!["#fight", "#gank", "#push"]);
        assert_eq!(consensus.frame_count, 3);
    }

    #[test]
    fn withholds_when_any_frame_lacks_a_result() {
        let aggregator = ConsensusAggregator::default();
        let outcomes = vec![analyzed(result_for("LoL")), rejected(), analyzed(result_for("LoL"))];
        assert!(aggregator.aggregate(&outcomes).is_none());
        assert!(aggregator.aggregate(&[]).is_none());
    }

    #[test]
    fn merges_character_and_map_lists() {
        let outcomes = vec![
            analyzed(result_from_json(
                r#"{"characters": {"allies": ["x"]}, "map": {"features": ["river"]}}"#,
            )),
            analyzed(result_from_json(
                r#"{"characters": {"allies": ["y", "x"], "enemies": ["Zed"]}, "map": null}"#,
            )),
        ];
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();

        assert_eq!(consensus.characters.allies, vec!["x", "y"]);
        assert_eq!(consensus.characters.enemies, vec!["Zed"]);
        assert_eq!(consensus.map.features, vec!["river"]);
    }

    #[test]
    fn status_comes_from_the_middle_frame() {
        let outcomes: Vec<FrameOutcome> = ["first", "second", "third", "fourth"]
            .iter()
            .map(|s| {
                analyzed(result_from_json(&format!(
                    r#"{{"situation": {{"playerStatus": "{s}"}}}}"#
                )))
            })
            .collect();
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();
        assert_eq!(
            consensus.situation.player_status,
            Resolved::Value("third".to_string())
        );
    }

    #[test]
    fn structured_status_is_rendered() {
        let outcomes = vec![analyzed(result_from_json(
            r#"{"situation": {"playerStatus": {"health": "50%", "gold": 1200}}}"#,
        ))];
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();
        assert_eq!(
            consensus.situation.player_status.value(),
            Some("health: 50%, gold: 1200")
        );
    }

    #[test]
    fn missing_fields_resolve_to_unknown_and_placeholder_summary() {
        let outcomes = vec![analyzed(AnalysisResult::default()); 3];
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();

        assert!(consensus.game.is_unknown());
        assert!(consensus.characters.player.is_unknown());
        assert!(consensus.situation.player_status.is_unknown());
        assert!(consensus.tags.is_empty());
        assert_eq!(
            consensus.summary,
            "Playing as the player in the game, in a gameplay situation at the map. \
             The game is currently in the in-progress stage."
        );
    }

    #[test]
    fn summary_uses_voted_values() {
        let outcomes = vec![
            analyzed(result_from_json(
                r#"{"game": "League of Legends",
                    "characters": {"player": "Ahri"},
                    "situation": {"action": "team fight", "gamePhase": "late"},
                    "map": {"location": "Baron pit"}}"#,
            )),
            analyzed(result_from_json(r#"{"game": "League of Legends", "characters": {"player": "Lux"}}"#)),
        ];
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();
        assert_eq!(
            consensus.summary,
            "Playing as Ahri in League of Legends, in a team fight situation at Baron pit. \
             The game is currently in the late stage."
        );
    }

    #[test]
    fn partial_fields_count_only_where_present() {
        let outcomes = vec![
            analyzed(result_from_json(r#"{"map": {"location": "top lane"}}"#)),
            analyzed(result_from_json(r#"{"map": {"location": "mid lane"}}"#)),
            analyzed(result_from_json(r#"{"map": {"location": "mid lane"}}"#)),
            analyzed(result_from_json(r#"{}"#)),
            analyzed(result_from_json(r#"{}"#)),
        ];
        let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();
        assert_eq!(consensus.map.location.value(), Some("mid lane"));
    }

    #[test]
    fn tag_limit_is_configurable() {
        let outcomes = vec![analyzed(result_from_json(
            r##"{"tags": ["#a", "#b", "#c", "#d"]}"##,
        ))];
        let consensus = ConsensusAggregator::new(2).aggregate(&outcomes).unwrap();
        assert_eq!(consensus.tags, vec!["#a", "#b"]);
    }

    proptest! {
        #[test]
        fn any_missing_result_withholds_consensus(mask in prop::collection::vec(any::<bool>(), 1..8)) {
            let outcomes: Vec<FrameOutcome> = mask
                .iter()
                .map(|ok| if *ok { analyzed(result_for("LoL")) } else { rejected() })
                .collect();
            let consensus = ConsensusAggregator::default().aggregate(&outcomes);
            prop_assert_eq!(consensus.is_some(), mask.iter().all(|ok| *ok));
        }

        #[test]
        fn status_tracks_middle_index(n in 1usize..10) {
            let outcomes: Vec<FrameOutcome> = (0..n)
                .map(|i| analyzed(result_from_json(&format!(
                    r#"{{"situation": {{"playerStatus": "status {i}"}}}}"#
                ))))
                .collect();
            let consensus = ConsensusAggregator::default().aggregate(&outcomes).unwrap();
            let expected = format!("status {}", n / 2);
            prop_assert_eq!(consensus.situation.player_status.value(), Some(expected.as_str()));
        }
    }
}
