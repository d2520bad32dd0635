//! Memory domain - entities persisted for each user of the voice companion.

mod entries;
mod profile;

pub use entries::{
    BreakthroughMoment, ContextEntry, ConversationEntry, SessionTheme, SpeakerRole,
    StageProgression,
};
pub use profile::{ProfilePatch, UserProfile};
