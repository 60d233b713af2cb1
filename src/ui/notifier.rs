use serenity::{
    builder::CreateMessage,
    http::Http,
    model::{channel::MessageFlags, id::ChannelId},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// "Send this text to that channel" capability used by the session and the
/// dispatcher.
///
/// Implementations must not block the caller; delivery failures are logged
/// and dropped.
pub trait Notifier: Send + Sync {
    fn notify(&self, channel_id: ChannelId, text: String);
}

/// Delivers notifications through the Discord HTTP API.
///
/// Messages are handed to a single background task so they reach each
/// channel in the order they were produced.
pub struct ChannelNotifier {
    outbox: mpsc::UnboundedSender<(ChannelId, String)>,
}

impl ChannelNotifier {
    pub fn spawn(http: Arc<Http>) -> Self {
        let (outbox, mut pending) = mpsc::unbounded_channel::<(ChannelId, String)>();

        tokio::spawn(async move {
            while let Some((channel_id, text)) = pending.recv().await {
                let message = CreateMessage::new()
                    .content(text)
                    .flags(MessageFlags::SUPPRESS_EMBEDS);

                if let Err(why) = channel_id.send_message(&*http, message).await {
                    error!("Error al enviar mensaje al canal {}: {:?}", channel_id, why);
                }
            }
            debug!("📪 Notificador cerrado");
        });

        Self { outbox }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, channel_id: ChannelId, text: String) {
        if self.outbox.send((channel_id, text)).is_err() {
            error!("Notificador detenido, mensaje descartado para {}", channel_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notification in memory.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<(ChannelId, String)>>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, text)| text.clone())
                .collect()
        }

        pub fn sent(&self) -> Vec<(ChannelId, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.messages().iter().any(|text| text.contains(needle))
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, channel_id: ChannelId, text: String) {
            self.sent.lock().unwrap().push((channel_id, text));
        }
    }
}
