pub mod analysis_result;
pub mod consensus_result;
pub mod field;
pub mod frame_outcome;

pub use analysis_result::{
    AnalysisResult, Characters, MapInfo, PlayerStatus, Situation, StatusDetails, UiAnalysis,
};
pub use consensus_result::{
    ConsensusCharacters, ConsensusMap, ConsensusResult, ConsensusSituation, Resolved, UNKNOWN,
};
pub use field::Field;
pub use frame_outcome::{FrameOutcome, ANALYZING, CAPTURE_FAILED};
