use serde::Deserialize;

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_text_update() {
        let payload = r#"{
            "ok": true,
            "result": [{
                "update_id": 42,
                "message": {
                    "message_id": 7,
                    "from": { "id": 1001, "is_bot": false, "first_name": "Ana" },
                    "chat": { "id": 1001, "type": "private" },
                    "date": 1700000000,
                    "text": "What does collision coverage include?"
                }
            }]
        }"#;

        let response: ApiResponse<Vec<Update>> =
            serde_json::from_str(payload).expect("decodes");
        assert!(response.ok);
        let updates = response.result.expect("result present");
        assert_eq!(updates.len(), 1);
        let update = updates.first().expect("one update");
        assert_eq!(update.update_id, 42);
        let message = update.message.as_ref().expect("message present");
        assert_eq!(message.chat.id, 1001);
        assert_eq!(
            message.text.as_deref(),
            Some("What does collision coverage include?")
        );
    }

    #[test]
    fn decodes_an_error_envelope() {
        let payload = r#"{ "ok": false, "error_code": 401, "description": "Unauthorized" }"#;
        let response: ApiResponse<Vec<Update>> =
            serde_json::from_str(payload).expect("decodes");
        assert!(!response.ok);
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn non_text_messages_decode_without_text() {
        let payload = r#"{
            "update_id": 43,
            "message": {
                "message_id": 8,
                "chat": { "id": 1001, "type": "private" },
                "date": 1700000001,
                "sticker": { "file_id": "abc" }
            }
        }"#;
        let update: Update = serde_json::from_str(payload).expect("decodes");
        let message = update.message.expect("message present");
        assert!(message.text.is_none());
    }
}
