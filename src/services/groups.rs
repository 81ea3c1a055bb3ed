//! Device groups: one notification key standing for several registration tokens.
//!
//! See https://firebase.google.com/docs/cloud-messaging/android/device-group

use crate::error::FcmError;
use crate::FcmClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperation {
    Create,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationGroupRequest {
    pub operation: GroupOperation,
    pub notification_key_name: String,
    /// The group's key; required to add or remove members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_key: Option<String>,
    pub registration_ids: Vec<String>,
}

impl NotificationGroupRequest {
    pub fn create(name: impl Into<String>, registration_ids: Vec<String>) -> Self {
        NotificationGroupRequest {
            operation: GroupOperation::Create,
            notification_key_name: name.into(),
            notification_key: None,
            registration_ids,
        }
    }

    pub fn add(name: impl Into<String>, notification_key: impl Into<String>, registration_ids: Vec<String>) -> Self {
        NotificationGroupRequest {
            operation: GroupOperation::Add,
            notification_key_name: name.into(),
            notification_key: Some(notification_key.into()),
            registration_ids,
        }
    }

    pub fn remove(name: impl Into<String>, notification_key: impl Into<String>, registration_ids: Vec<String>) -> Self {
        NotificationGroupRequest {
            operation: GroupOperation::Remove,
            ..Self::add(name, notification_key, registration_ids)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationGroupResponse {
    pub notification_key: String,
}

impl FcmClient {
    /// Creates a group or changes its members. The response carries the
    /// group's notification key.
    pub async fn notification_group(
        &self,
        request: &NotificationGroupRequest,
    ) -> Result<NotificationGroupResponse, FcmError> {
        debug!("{:?} on group {}", request.operation, request.notification_key_name);

        let url = &self.config().endpoints.notification_group;
        Ok(self.post::<_, NotificationGroupResponse>(url, Some(request)).await?.body)
    }
}
