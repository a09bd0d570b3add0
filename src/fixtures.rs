#[cfg(test)]
pub mod test {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::ReplyError;
    use crate::reply::{Replier, Reply};
    use crate::types::{Channel, ServerId};

    pub fn server() -> ServerId {
        ServerId::new("100")
    }

    /// Channels of the test server. Names may contain spaces.
    pub fn channels() -> Vec<Channel> {
        vec![
            Channel::new("10", "general"),
            Channel::new("20", "boosts"),
            Channel::new("30", "boost wall"),
        ]
    }

    /// Keeps every reply it is asked to send.
    #[derive(Debug, Default)]
    pub struct RecordingReplier {
        sent: Mutex<Vec<Reply>>,
    }

    impl RecordingReplier {
        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn last(&self) -> Option<Reply> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Replier for RecordingReplier {
        async fn send(&self, reply: Reply) -> Result<(), ReplyError> {
            self.sent.lock().unwrap().push(reply);
            Ok(())
        }
    }

    /// Rejects every reply, like a channel the bot can no longer post in.
    pub struct FailingReplier;

    #[async_trait]
    impl Replier for FailingReplier {
        async fn send(&self, _reply: Reply) -> Result<(), ReplyError> {
            Err(ReplyError("missing permissions".into()))
        }
    }

    #[test]
    fn recording_replier_starts_empty() {
        let replier = RecordingReplier::default();
        assert_eq!(replier.count(), 0);
        assert!(replier.last().is_none());
    }
}
