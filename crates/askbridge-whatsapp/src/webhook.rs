//! Inbound webhook notification parsing.
//!
//! Meta delivers batched notifications: `entry[].changes[].value` carries
//! parallel `contacts` and `messages` arrays. Only `type: "text"` messages
//! are bridged; statuses, media, and reactions are ignored.

use serde::Deserialize;

/// One inbound text message, flattened for the handler.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Sender's WhatsApp account id.
    pub wa_id: String,
    /// Sender's display name from the contact block, when present.
    pub username: Option<String>,
    /// Platform message id — used for the read receipt and typing indicator.
    pub message_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
}

#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct Contact {
    wa_id: String,
    profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    from: String,
    id: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

/// Flatten a notification into the text messages it carries.
pub fn extract_text_messages(notification: &Notification) -> Vec<InboundMessage> {
    let mut inbound = Vec::new();

    for entry in &notification.entry {
        for change in &entry.changes {
            let value = &change.value;
            for msg in &value.messages {
                if msg.kind != "text" {
                    continue;
                }
                let Some(text) = msg.text.as_ref() else {
                    continue;
                };
                let username = value
                    .contacts
                    .iter()
                    .find(|c| c.wa_id == msg.from)
                    .and_then(|c| c.profile.as_ref())
                    .and_then(|p| p.name.clone());

                inbound.push(InboundMessage {
                    wa_id: msg.from.clone(),
                    username,
                    message_id: msg.id.clone(),
                    text: text.body.clone(),
                });
            }
        }
    }

    inbound
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT_NOTIFICATION: &str = r#"{
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "1000",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "contacts": [{"profile": {"name": "Ada"}, "wa_id": "15550001111"}],
                    "messages": [{
                        "from": "15550001111",
                        "id": "wamid.abc",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": "hello there"}
                    }]
                }
            }]
        }]
    }"#;

    #[test]
    fn text_message_is_extracted_with_contact_name() {
        let notification: Notification =
            serde_json::from_str(TEXT_NOTIFICATION).expect("decode");
        let inbound = extract_text_messages(&notification);

        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].wa_id, "15550001111");
        assert_eq!(inbound[0].username.as_deref(), Some("Ada"));
        assert_eq!(inbound[0].message_id, "wamid.abc");
        assert_eq!(inbound[0].text, "hello there");
    }

    #[test]
    fn non_text_messages_are_skipped() {
        let payload = r#"{
            "entry": [{"changes": [{"value": {
                "contacts": [{"profile": {"name": "Ada"}, "wa_id": "1555"}],
                "messages": [{"from": "1555", "id": "wamid.x", "type": "image"}]
            }}]}]
        }"#;
        let notification: Notification = serde_json::from_str(payload).expect("decode");
        assert!(extract_text_messages(&notification).is_empty());
    }

    #[test]
    fn status_only_notification_yields_nothing() {
        let payload = r#"{"entry": [{"changes": [{"value": {"statuses": [{"id": "wamid.y"}]}}]}]}"#;
        let notification: Notification = serde_json::from_str(payload).expect("decode");
        assert!(extract_text_messages(&notification).is_empty());
    }

    #[test]
    fn missing_contact_leaves_username_empty() {
        let payload = r#"{
            "entry": [{"changes": [{"value": {
                "messages": [{"from": "1555", "id": "wamid.z", "type": "text", "text": {"body": "hi"}}]
            }}]}]
        }"#;
        let notification: Notification = serde_json::from_str(payload).expect("decode");
        let inbound = extract_text_messages(&notification);
        assert_eq!(inbound.len(), 1);
        assert!(inbound[0].username.is_none());
    }
}
