//! Conversation sessions and the archive ledger.

pub mod archive;
pub mod message;
pub mod repository;

pub use archive::{ConversationArchive, SavedConversation};
pub use message::{ChatMessage, ImageContext, MessageSender};
pub use repository::ArchiveRepository;
