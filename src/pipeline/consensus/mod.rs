pub mod aggregator;
pub mod vote;

pub use aggregator::ConsensusAggregator;
pub use vote::{majority_vote, rank_by_frequency, union_first_seen};
