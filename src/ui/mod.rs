//! Outbound presentation: message text and the channel notifier.

pub mod messages;
pub mod notifier;

pub use notifier::{ChannelNotifier, Notifier};
