/// The user-visible part of a message, rendered by the device's system tray.
///
/// See https://firebase.google.com/docs/cloud-messaging/http-server-ref#notification-payload-support
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_loc_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_loc_args: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_args: Option<Vec<String>>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Notification {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_unset_fields() {
        let notification = Notification::new("Hi", "there");
        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(serde_json::json!({"title": "Hi", "body": "there"}), json);
    }

    #[test]
    fn uses_wire_field_names() {
        let notification = Notification {
            click_action: Some("OPEN".into()),
            body_loc_args: Some(vec!["a".into()]),
            ..Notification::new("t", "b")
        };
        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!("OPEN", json["click_action"]);
        assert_eq!("a", json["body_loc_args"][0]);
    }
}
