// conform-core/src/domain/rules/builtin/mod.rs

pub mod approval;
pub mod basic;
pub mod third_party;

use std::sync::Arc;

use super::ConformanceRule;

pub use approval::{ApprovalSequence, SegregationOfDuties, TitleBasedApproval};
pub use basic::{FieldEquals, FieldMatches, NotNull};
pub use third_party::ThirdPartyRiskValidation;

pub fn all() -> Vec<Arc<dyn ConformanceRule>> {
    vec![
        Arc::new(FieldEquals),
        Arc::new(FieldMatches),
        Arc::new(NotNull),
        Arc::new(SegregationOfDuties),
        Arc::new(ApprovalSequence),
        Arc::new(TitleBasedApproval),
        Arc::new(ThirdPartyRiskValidation),
    ]
}
