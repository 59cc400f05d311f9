// SPDX-License-Identifier: PMPL-1.0-or-later
//! Request dispatch: run the lifecycle for the request type, then respond.

use std::collections::BTreeMap;
use tracing::{error, info};

use crate::error::Result;
use crate::event::CustomResourceEvent;
use crate::images::{ImageLifecycle, ImageService};
use crate::response::{CustomResourceResponse, ResponseSender, ResponseStatus};

/// Handles custom resource requests for the managed image
pub struct ResourceHandler<I, R> {
    lifecycle: ImageLifecycle<I>,
    sender: R,
    /// Lambda log stream, used as the physical id of a new resource
    log_stream: Option<String>,
}

impl<I: ImageService, R: ResponseSender> ResourceHandler<I, R> {
    pub fn new(lifecycle: ImageLifecycle<I>, sender: R, log_stream: Option<String>) -> Self {
        Self {
            lifecycle,
            sender,
            log_stream,
        }
    }

    /// Process the request and deliver the response.
    ///
    /// Lifecycle errors become a `FAILED` response. Only a response that
    /// could not be delivered is returned as an error.
    pub async fn handle(&self, event: &CustomResourceEvent) -> Result<CustomResourceResponse> {
        info!("The event is: {}", event.request_type);

        let response = match self.process(event).await {
            Ok(data) => {
                info!("Operation successful");
                self.response(event, ResponseStatus::Success, self.success_reason(), data)
            }
            Err(e) => {
                error!("Operation failed: {}", e);
                let mut data = BTreeMap::new();
                data.insert("Data".to_string(), e.to_string());
                self.response(event, ResponseStatus::Failed, e.to_string(), data)
            }
        };

        self.sender.send(&event.response_url, &response).await?;
        Ok(response)
    }

    async fn process(&self, event: &CustomResourceEvent) -> Result<BTreeMap<String, String>> {
        let kind = event.request_type;
        let instance_id = if kind.creates_image() {
            Some(event.instance_id()?)
        } else {
            None
        };

        let mut data = BTreeMap::new();
        if kind.retires_image() {
            if let Some(snapshot_id) = self.lifecycle.retire().await? {
                data.insert("SnapshotId".to_string(), snapshot_id);
            }
        }
        if let Some(instance_id) = instance_id {
            let image_id = self.lifecycle.create(instance_id).await?;
            data.insert("ImageId".to_string(), image_id);
        }
        Ok(data)
    }

    fn success_reason(&self) -> String {
        match &self.log_stream {
            Some(stream) => format!("See the details in CloudWatch Log Stream: {}", stream),
            None => "Operation successful".to_string(),
        }
    }

    fn response(
        &self,
        event: &CustomResourceEvent,
        status: ResponseStatus,
        reason: String,
        data: BTreeMap<String, String>,
    ) -> CustomResourceResponse {
        let physical_resource_id = event
            .physical_resource_id
            .clone()
            .or_else(|| self.log_stream.clone())
            .unwrap_or_else(|| event.request_id.clone());

        CustomResourceResponse {
            status,
            reason,
            physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            no_echo: false,
            data,
        }
    }
}
