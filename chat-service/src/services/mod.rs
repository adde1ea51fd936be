pub mod conversation;
pub mod providers;

pub use conversation::Conversation;
