pub mod resolver;
pub mod stages;

pub use resolver::{
    ApproverTarget, Resolution, ResolutionPlan, SkipReason, SkippedStage, StageResolver,
};
pub use stages::{ResolutionMode, StageDefinition, StageTable, StageTableError};
