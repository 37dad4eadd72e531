//! 档案来源
//!
//! 填充前需要先拿到档案（可能是异步的），拿到之后整个填充过程同步执行。

use super::record::Profile;
use crate::error::{AppResult, ProfileError};
use std::future::Future;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 档案来源
pub trait ProfileSource {
    fn fetch(&self) -> impl Future<Output = AppResult<Profile>> + Send;
}

/// 从 JSON 文件读取档案
#[derive(Debug, Clone)]
pub struct FileProfileSource {
    path: PathBuf,
}

impl FileProfileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProfileSource for FileProfileSource {
    async fn fetch(&self) -> AppResult<Profile> {
        debug!("读取档案文件: {}", self.path.display());
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| ProfileError::ReadFailed {
                path: self.path.display().to_string(),
                source,
            })?;
        let profile = Profile::from_json_str(&content)?;
        debug!("档案包含 {} 个字段", profile.len());
        Ok(profile)
    }
}

/// 即时填充使用的缓存档案（JSON 文本）
#[derive(Debug, Clone)]
pub struct BlobProfileSource {
    blob: String,
}

impl BlobProfileSource {
    pub fn new(blob: impl Into<String>) -> Self {
        Self { blob: blob.into() }
    }
}

impl ProfileSource for BlobProfileSource {
    async fn fetch(&self) -> AppResult<Profile> {
        if self.blob.trim().is_empty() {
            return Err(ProfileError::Empty.into());
        }
        Ok(Profile::from_json_str(&self.blob)?)
    }
}
