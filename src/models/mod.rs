pub mod agenda;
pub mod campaign;
pub mod handoff;
pub mod memory;
pub mod message;
pub mod session;

pub use agenda::{AgendaEntry, AgendaEntryCreate, AgendaStatus};
pub use campaign::{CampaignOverlay, CampaignRecord, CampaignRecordCreate};
pub use handoff::{HandoffStatus, HandoffTask, HandoffTaskCreate};
pub use memory::{MemoryRecord, MemoryRecordCreate};
pub use message::{ChatMessage, ChatMessageCreate, MessageMetadata, Role};
pub use session::{ChatSession, ChatSessionCreate};
