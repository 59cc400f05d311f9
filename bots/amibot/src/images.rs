// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image lifecycle: bake an AMI from an instance, or retire it with its snapshot.

use async_trait::async_trait;
use rusoto_ec2::{
    CreateImageRequest, DeleteSnapshotRequest, DeregisterImageRequest, DescribeImagesRequest,
    DescribeSnapshotsRequest, Ec2, Ec2Client, Filter, Tag, TagSpecification,
};
use tracing::{debug, info, warn};

use crate::config::{ImageConfig, WaitConfig};
use crate::error::{AmiError, Result};

/// EC2 image state as reported by DescribeImages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Available,
    Failed,
    Error,
    Invalid,
    Deregistered,
    Other(String),
}

impl ImageState {
    pub fn parse(state: &str) -> Self {
        match state {
            "pending" => ImageState::Pending,
            "available" => ImageState::Available,
            "failed" => ImageState::Failed,
            "error" => ImageState::Error,
            "invalid" => ImageState::Invalid,
            "deregistered" => ImageState::Deregistered,
            other => ImageState::Other(other.to_string()),
        }
    }

    /// States an image never leaves on its way to `available`
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            ImageState::Failed | ImageState::Error | ImageState::Invalid | ImageState::Deregistered
        )
    }
}

impl std::fmt::Display for ImageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageState::Pending => write!(f, "pending"),
            ImageState::Available => write!(f, "available"),
            ImageState::Failed => write!(f, "failed"),
            ImageState::Error => write!(f, "error"),
            ImageState::Invalid => write!(f, "invalid"),
            ImageState::Deregistered => write!(f, "deregistered"),
            ImageState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Parameters for baking an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub instance_id: String,
    pub name: String,
    pub description: String,
    pub snapshot_tag: String,
    pub no_reboot: bool,
}

/// The EC2 calls the lifecycle needs
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Start image creation, returning the new image id
    async fn create_image(&self, request: &ImageRequest) -> Result<String>;

    /// Current state, or `None` if EC2 does not know the image (yet)
    async fn image_state(&self, image_id: &str) -> Result<Option<ImageState>>;

    async fn find_image_by_name(&self, name: &str) -> Result<Option<String>>;

    async fn deregister_image(&self, image_id: &str) -> Result<()>;

    /// Snapshot carrying the given `Name` tag
    async fn find_snapshot_by_tag(&self, name: &str) -> Result<Option<String>>;

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()>;
}

/// EC2-backed image service
pub struct Ec2ImageService {
    client: Ec2Client,
}

impl Ec2ImageService {
    pub fn new(client: Ec2Client) -> Self {
        Self { client }
    }

    /// Client for the region taken from the environment
    pub fn from_env() -> Self {
        Self::new(Ec2Client::new(rusoto_core::Region::default()))
    }
}

fn filter(name: &str, value: &str) -> Filter {
    Filter {
        name: Some(name.to_string()),
        values: Some(vec![value.to_string()]),
    }
}

fn name_tag(resource_type: &str, value: &str) -> TagSpecification {
    TagSpecification {
        resource_type: Some(resource_type.to_string()),
        tags: Some(vec![Tag {
            key: Some("Name".to_string()),
            value: Some(value.to_string()),
        }]),
    }
}

#[async_trait]
impl ImageService for Ec2ImageService {
    async fn create_image(&self, request: &ImageRequest) -> Result<String> {
        let input = CreateImageRequest {
            description: Some(request.description.clone()),
            instance_id: request.instance_id.clone(),
            name: request.name.clone(),
            no_reboot: Some(request.no_reboot),
            tag_specifications: Some(vec![
                name_tag("image", &request.name),
                name_tag("snapshot", &request.snapshot_tag),
            ]),
            ..Default::default()
        };
        let output = self.client.create_image(input).await?;
        output
            .image_id
            .ok_or_else(|| AmiError::Ec2("CreateImage returned no image id".to_string()))
    }

    async fn image_state(&self, image_id: &str) -> Result<Option<ImageState>> {
        let input = DescribeImagesRequest {
            image_ids: Some(vec![image_id.to_string()]),
            ..Default::default()
        };
        let output = self.client.describe_images(input).await?;
        Ok(output
            .images
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|image| image.state)
            .map(|state| ImageState::parse(&state)))
    }

    async fn find_image_by_name(&self, name: &str) -> Result<Option<String>> {
        let input = DescribeImagesRequest {
            owners: Some(vec!["self".to_string()]),
            filters: Some(vec![filter("name", name)]),
            ..Default::default()
        };
        let output = self.client.describe_images(input).await?;
        Ok(output
            .images
            .unwrap_or_default()
            .into_iter()
            .find_map(|image| image.image_id))
    }

    async fn deregister_image(&self, image_id: &str) -> Result<()> {
        let input = DeregisterImageRequest {
            image_id: image_id.to_string(),
            dry_run: None,
        };
        self.client.deregister_image(input).await?;
        Ok(())
    }

    async fn find_snapshot_by_tag(&self, name: &str) -> Result<Option<String>> {
        let input = DescribeSnapshotsRequest {
            owner_ids: Some(vec!["self".to_string()]),
            filters: Some(vec![filter("tag:Name", name)]),
            ..Default::default()
        };
        let output = self.client.describe_snapshots(input).await?;
        Ok(output
            .snapshots
            .unwrap_or_default()
            .into_iter()
            .find_map(|snapshot| snapshot.snapshot_id))
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let input = DeleteSnapshotRequest {
            snapshot_id: snapshot_id.to_string(),
            dry_run: None,
        };
        self.client.delete_snapshot(input).await?;
        Ok(())
    }
}

/// Creates and retires the configured image through an [`ImageService`]
pub struct ImageLifecycle<I> {
    images: I,
    image: ImageConfig,
    wait: WaitConfig,
}

impl<I: ImageService> ImageLifecycle<I> {
    pub fn new(images: I, image: ImageConfig, wait: WaitConfig) -> Self {
        Self { images, image, wait }
    }

    #[cfg(test)]
    pub(crate) fn images(&self) -> &I {
        &self.images
    }

    /// Bake an image from `instance_id` and wait until it is available.
    pub async fn create(&self, instance_id: &str) -> Result<String> {
        let request = ImageRequest {
            instance_id: instance_id.to_string(),
            name: self.image.name.clone(),
            description: self.image.description.clone(),
            snapshot_tag: self.image.snapshot_tag.clone(),
            no_reboot: self.image.no_reboot,
        };

        info!("Creating image {} from {}", request.name, instance_id);
        let image_id = self.images.create_image(&request).await?;
        self.wait_until_available(&image_id).await?;
        info!("Image {} is available", image_id);
        Ok(image_id)
    }

    async fn wait_until_available(&self, image_id: &str) -> Result<()> {
        let attempts = self.wait.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.images.image_state(image_id).await? {
                Some(ImageState::Available) => return Ok(()),
                Some(state) if state.is_terminal_failure() => {
                    return Err(AmiError::ImageFailed {
                        image_id: image_id.to_string(),
                        state: state.to_string(),
                    });
                }
                state => debug!(
                    "Image {} is {} (check {}/{})",
                    image_id,
                    state.map(|s| s.to_string()).unwrap_or_else(|| "not visible".to_string()),
                    attempt,
                    attempts
                ),
            }

            if attempt < attempts {
                tokio::time::sleep(self.wait.poll_interval()).await;
            }
        }

        Err(AmiError::WaitTimeout {
            image_id: image_id.to_string(),
            attempts,
        })
    }

    /// Deregister the named image and delete its snapshot.
    ///
    /// Either may already be gone; that is logged and skipped. Returns the
    /// id of the deleted snapshot, if there was one.
    pub async fn retire(&self) -> Result<Option<String>> {
        match self.images.find_image_by_name(&self.image.name).await? {
            Some(image_id) => {
                info!("Deregistering image {} ({})", image_id, self.image.name);
                self.images.deregister_image(&image_id).await?;
            }
            None => warn!("No image named {}, nothing to deregister", self.image.name),
        }

        match self.images.find_snapshot_by_tag(&self.image.snapshot_tag).await? {
            Some(snapshot_id) => {
                info!("Deleting snapshot {} ({})", snapshot_id, self.image.snapshot_tag);
                self.images.delete_snapshot(&snapshot_id).await?;
                Ok(Some(snapshot_id))
            }
            None => {
                warn!("No snapshot tagged {}, nothing to delete", self.image.snapshot_tag);
                Ok(None)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeImages;
    use super::*;

    fn fast_wait(max_attempts: u32) -> WaitConfig {
        WaitConfig {
            poll_interval_secs: 0,
            max_attempts,
        }
    }

    fn lifecycle(images: FakeImages, max_attempts: u32) -> ImageLifecycle<FakeImages> {
        ImageLifecycle::new(images, ImageConfig::default(), fast_wait(max_attempts))
    }

    #[test]
    fn test_state_parse() {
        assert_eq!(ImageState::parse("available"), ImageState::Available);
        assert!(ImageState::parse("deregistered").is_terminal_failure());
        assert!(!ImageState::parse("pending").is_terminal_failure());
        assert_eq!(ImageState::parse("transient"), ImageState::Other("transient".to_string()));
    }

    #[tokio::test]
    async fn test_create_waits_for_available() {
        let images = FakeImages::default().with_states(vec![
            None,
            Some(ImageState::Pending),
            Some(ImageState::Available),
        ]);
        let lifecycle = lifecycle(images, 5);

        let image_id = lifecycle.create("i-123").await.unwrap();
        assert_eq!(image_id, "ami-new");

        let created = lifecycle.images.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "DemoWebServerAMI");
        assert_eq!(created[0].snapshot_tag, "DemoWebServerSnapshot");
        assert!(created[0].no_reboot);
        assert!(lifecycle.images.states.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_aborts_on_failed_state() {
        let images = FakeImages::default()
            .with_states(vec![Some(ImageState::Pending), Some(ImageState::Failed)]);
        let err = lifecycle(images, 5).create("i-123").await.unwrap_err();

        match err {
            AmiError::ImageFailed { image_id, state } => {
                assert_eq!(image_id, "ami-new");
                assert_eq!(state, "failed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_times_out() {
        let images = FakeImages::default().with_states(vec![Some(ImageState::Pending); 3]);
        let err = lifecycle(images, 3).create("i-123").await.unwrap_err();
        assert!(matches!(err, AmiError::WaitTimeout { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_retire_removes_image_and_snapshot() {
        let lifecycle = lifecycle(FakeImages::with_existing("ami-old", "snap-old"), 1);

        let snapshot = lifecycle.retire().await.unwrap();
        assert_eq!(snapshot.as_deref(), Some("snap-old"));
        assert_eq!(*lifecycle.images.deregistered.lock().unwrap(), vec!["ami-old"]);
        assert_eq!(*lifecycle.images.deleted.lock().unwrap(), vec!["snap-old"]);
    }

    #[tokio::test]
    async fn test_retire_with_nothing_left() {
        let lifecycle = lifecycle(FakeImages::default(), 1);

        assert_eq!(lifecycle.retire().await.unwrap(), None);
        assert!(lifecycle.images.deregistered.lock().unwrap().is_empty());
        assert!(lifecycle.images.deleted.lock().unwrap().is_empty());
    }
}
