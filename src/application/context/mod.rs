//! Context aggregation for the conversational agent.

mod aggregator;
mod themes;

pub use aggregator::{
    CategorySection, ContextAggregator, ContextRequest, ContextSnapshot, ContextType, SessionData,
};
pub use themes::detect_themes;
