// SPDX-License-Identifier: PMPL-1.0-or-later
//! CloudFormation custom resource request

use serde::{Deserialize, Serialize};

use crate::error::{AmiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    /// Whether the existing image and snapshot are removed first
    pub fn retires_image(self) -> bool {
        matches!(self, RequestType::Update | RequestType::Delete)
    }

    /// Whether a new image is baked
    pub fn creates_image(self) -> bool {
        matches!(self, RequestType::Create | RequestType::Update)
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestType::Create => "Create",
            RequestType::Update => "Update",
            RequestType::Delete => "Delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    /// Absent on Create
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceProperties {
    #[serde(default)]
    pub instance_id: Option<String>,
}

impl CustomResourceEvent {
    /// Instance to image; only Create and Update need one
    pub fn instance_id(&self) -> Result<&str> {
        self.resource_properties
            .instance_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AmiError::MissingProperty("InstanceId"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE: &str = r#"{
        "RequestType": "Create",
        "ServiceToken": "arn:aws:lambda:us-east-1:111111111111:function:amibot",
        "ResponseURL": "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/signed",
        "StackId": "arn:aws:cloudformation:us-east-1:111111111111:stack/demo/guid",
        "RequestId": "unique-request-id",
        "LogicalResourceId": "DemoAMI",
        "ResourceType": "Custom::AMI",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:111111111111:function:amibot",
            "InstanceId": "i-0123456789abcdef0"
        }
    }"#;

    #[test]
    fn test_parse_create_event() {
        let event: CustomResourceEvent = serde_json::from_str(CREATE).unwrap();
        assert_eq!(event.request_type, RequestType::Create);
        assert_eq!(event.logical_resource_id, "DemoAMI");
        assert!(event.physical_resource_id.is_none());
        assert_eq!(event.instance_id().unwrap(), "i-0123456789abcdef0");
    }

    #[test]
    fn test_delete_without_properties() {
        let event: CustomResourceEvent = serde_json::from_str(
            r#"{
                "RequestType": "Delete",
                "ResponseURL": "http://localhost/r",
                "StackId": "stack",
                "RequestId": "req",
                "LogicalResourceId": "DemoAMI",
                "PhysicalResourceId": "2024/01/01/[$LATEST]abc"
            }"#,
        )
        .unwrap();
        assert_eq!(event.request_type, RequestType::Delete);
        assert!(matches!(event.instance_id(), Err(AmiError::MissingProperty("InstanceId"))));
    }

    #[test]
    fn test_request_type_actions() {
        assert!(RequestType::Create.creates_image());
        assert!(!RequestType::Create.retires_image());
        assert!(RequestType::Update.creates_image() && RequestType::Update.retires_image());
        assert!(!RequestType::Delete.creates_image());
    }
}
