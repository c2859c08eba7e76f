use chrono::{DateTime, Utc};

/// A single chat message as returned by the chat-log endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sent_at: DateTime<Utc>,
    pub sender: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn chat_message_holds_fields() {
        let msg = ChatMessage {
            sent_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            sender: "viewer".to_string(),
            text: "hello".to_string(),
        };
        assert_eq!(msg.sender, "viewer");
        assert_eq!(msg.text, "hello");
    }
}
