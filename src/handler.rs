use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error};

use crate::error::HandlerError;
use crate::platform::{InboundMessage, Transport};
use crate::summary::{summarize, Summary};

pub const WELCOME_TEXT: &str =
    "Just forward me some message and I will send you all available information.";

pub const SEND_FAILED_TEXT: &str = "Cannot send message, maybe it's too long?";

/// Routes inbound messages and reports failures back to the user
pub struct Handler {
    transport: Arc<dyn Transport>,
}

impl Handler {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Reply for a message given its leading command
    pub fn reply(&self, command: &str, msg: &InboundMessage) -> Summary {
        match command {
            "start" => Summary {
                chat_id: msg.chat_id,
                text: WELCOME_TEXT.to_string(),
                markup: false,
            },
            _ => summarize(msg),
        }
    }

    /// Build the reply and deliver it
    pub async fn dispatch(&self, command: &str, msg: &InboundMessage) -> Result<(), HandlerError> {
        let reply = self.reply(command, msg);
        let sent = self
            .transport
            .send(reply.chat_id, &reply.text, reply.markup)
            .await
            .context("cannot send message");

        match command {
            "start" => sent.map_err(HandlerError::from),
            _ => sent.map_err(|e| HandlerError::reportable(SEND_FAILED_TEXT, e)),
        }
    }

    /// Log a failure and, when it carries a human message, tell the user
    pub async fn report(&self, chat_id: i64, err: &HandlerError) {
        error!("Error occurred in handler: {:#}", err);

        let Some(human) = err.human() else {
            return;
        };

        if let Err(e) = self.transport.send(chat_id, human, false).await {
            error!("Cannot send message with human readable error: {:#}", e);
        }
    }

    /// Dispatch one message, reporting any failure
    pub async fn handle(&self, command: &str, msg: &InboundMessage) {
        debug!("Message in chat {} (command: {:?})", msg.chat_id, command);

        if let Err(e) = self.dispatch(command, msg).await {
            self.report(msg.chat_id, &e).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UserIdentity;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Records every send; the first `fail_first` calls fail
    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(i64, String, bool)>>,
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl FakeTransport {
        fn failing(fail_first: usize) -> Self {
            Self {
                fail_first,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, chat_id: i64, text: &str, markup: bool) -> anyhow::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(anyhow!("Bad Request: message is too long"));
            }
            self.sent
                .lock()
                .await
                .push((chat_id, text.to_string(), markup));
            Ok(())
        }
    }

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: 99,
            text: Some(text.to_string()),
            media: None,
            caption: None,
            sender: UserIdentity {
                id: 42,
                is_bot: false,
                first_name: "Ann".to_string(),
                last_name: None,
                username: None,
                language_code: None,
            },
            forward: None,
            date: 0,
        }
    }

    fn handler(transport: &Arc<FakeTransport>) -> Handler {
        Handler::new(transport.clone())
    }

    #[tokio::test]
    async fn test_start_sends_welcome() {
        let transport = Arc::new(FakeTransport::default());
        handler(&transport)
            .dispatch("start", &message("/start whatever"))
            .await
            .unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(*sent, vec![(99, WELCOME_TEXT.to_string(), false)]);
    }

    #[test]
    fn test_start_reply_ignores_content() {
        let transport = Arc::new(FakeTransport::default());
        let handler = handler(&transport);
        assert_eq!(
            handler.reply("start", &message("/start a")),
            handler.reply("start", &message("/start b"))
        );
    }

    #[tokio::test]
    async fn test_default_sends_summary() {
        let transport = Arc::new(FakeTransport::default());
        let msg = message("hello");
        handler(&transport).dispatch("", &msg).await.unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 99);
        assert_eq!(sent[0].1, summarize(&msg).text);
        assert!(sent[0].2);
    }

    #[tokio::test]
    async fn test_unknown_command_gets_summary() {
        let transport = Arc::new(FakeTransport::default());
        handler(&transport).dispatch("help", &message("/help")).await.unwrap();

        let sent = transport.sent.lock().await;
        assert!(sent[0].1.starts_with("<b>Message:</b> /help"));
    }

    #[tokio::test]
    async fn test_summary_delivery_failure_is_reportable() {
        let transport = Arc::new(FakeTransport::failing(1));
        let err = handler(&transport)
            .dispatch("", &message("hello"))
            .await
            .unwrap_err();

        assert_eq!(err.human(), Some(SEND_FAILED_TEXT));
        assert!(err.to_string().contains("cannot send message"));
    }

    #[tokio::test]
    async fn test_start_delivery_failure_is_technical() {
        let transport = Arc::new(FakeTransport::failing(1));
        let err = handler(&transport)
            .dispatch("start", &message("/start"))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Technical(_)));
        assert_eq!(err.human(), None);
    }

    #[tokio::test]
    async fn test_handle_reports_human_text() {
        let transport = Arc::new(FakeTransport::failing(1));
        handler(&transport).handle("", &message("hello")).await;

        let sent = transport.sent.lock().await;
        assert_eq!(*sent, vec![(99, SEND_FAILED_TEXT.to_string(), false)]);
    }

    #[tokio::test]
    async fn test_technical_error_stays_silent() {
        let transport = Arc::new(FakeTransport::default());
        let err = HandlerError::from(anyhow!("network down"));
        handler(&transport).report(99, &err).await;

        assert!(transport.sent.lock().await.is_empty());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_notification_is_not_retried() {
        let transport = Arc::new(FakeTransport::failing(2));
        handler(&transport).handle("", &message("hello")).await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert!(transport.sent.lock().await.is_empty());
    }
}
