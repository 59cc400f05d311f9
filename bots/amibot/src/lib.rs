// SPDX-License-Identifier: PMPL-1.0-or-later
//! Amibot - AMI lifecycle custom resource
//!
//! CloudFormation invokes amibot when the stack that owns the demo web
//! server is created, updated or deleted. On create it bakes an image from
//! the running instance; on delete it deregisters that image and removes
//! its snapshot; an update does both. The outcome is always reported back
//! to the stack through the pre-signed response URL.

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod images;
pub mod response;

pub use config::Config;
pub use error::{AmiError, Result};
