pub mod calendar;
pub mod completion;
pub mod image;
pub mod messaging;

pub use calendar::{CalendarEvent, CalendarSync, NoopCalendarSync};
pub use completion::{
    ChatRole, CompletionRequest, CompletionService, OpenAiCompletionService, PromptMessage,
};
pub use image::{GeneratedAsset, ImageRequest, ImageService, OpenAiImageService};
pub use messaging::{HttpMessagingService, MessagingService, OutboundMessage};
