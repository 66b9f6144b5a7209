use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use tracing::instrument;

use crate::backend::{AccessToken, ObjectStorage};
use crate::errors::ServiceError;
use crate::supabase::encode_path;

/// Mount point of the local object directory in the HTTP server.
pub const PUBLIC_MOUNT: &str = "/storage";

/// Directory-backed object storage. Objects live at `{root}/{bucket}/{path}`
/// and are served by the HTTP layer under [`PUBLIC_MOUNT`].
pub struct DirObjectStorage {
    root: PathBuf,
    public_base: String,
}

impl DirObjectStorage {
    pub fn new<P: Into<PathBuf>>(root: P, public_base: &str) -> Self {
        Self { root: root.into(), public_base: public_base.trim_end_matches('/').to_string() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path below the root, rejecting `..` and absolute
    /// components.
    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, ServiceError> {
        let rel = Path::new(bucket).join(path);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(ServiceError::Validation(format!("invalid object path `{bucket}/{path}`")));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStorage for DirObjectStorage {
    #[instrument(skip(self, _token, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        _token: &AccessToken,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<(), ServiceError> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        // create_new: an existing object is never overwritten
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => ServiceError::Remote {
                    status: 409,
                    message: "The resource already exists".into(),
                },
                _ => e.into(),
            })?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}{}/{}/{}", self.public_base, PUBLIC_MOUNT, encode_path(bucket), encode_path(path))
    }
}
