//! Wiring of the backend collaborators selected by configuration.

use std::{path::PathBuf, sync::Arc};

use configs::{AppConfig, BackendKind};
use tracing::info;

use crate::backend::{IdentityProvider, ObjectStorage, RecordStore};
use crate::console::{Console, FailurePolicy, ImageUploader};
use crate::errors::ServiceError;
use crate::file::{DirObjectStorage, FileRecordStore, LocalIdentity};
use crate::supabase::{SupabaseAuth, SupabaseClient, SupabaseRest, SupabaseStorage};

pub struct Backends {
    pub identity: Arc<dyn IdentityProvider>,
    pub records: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStorage>,
    /// Set for the local backend: the directory the HTTP layer serves
    /// objects from.
    pub local_storage_root: Option<PathBuf>,
}

impl Backends {
    pub fn console(&self, cfg: &AppConfig) -> Console {
        Console::new(
            self.identity.clone(),
            self.records.clone(),
            ImageUploader::new(self.objects.clone(), &cfg.storage.bucket, &cfg.storage.project_image_prefix),
            FailurePolicy { surface: cfg.console.surface_failures },
        )
    }
}

pub async fn build_backends(cfg: &AppConfig) -> Result<Backends, ServiceError> {
    match cfg.backend.kind {
        BackendKind::Supabase => {
            let client = SupabaseClient::new(&cfg.supabase)?;
            info!(url = %client.base_url(), "using hosted backend");
            Ok(Backends {
                identity: Arc::new(SupabaseAuth::new(client.clone())),
                records: Arc::new(SupabaseRest::new(client.clone())),
                objects: Arc::new(SupabaseStorage::new(client)),
                local_storage_root: None,
            })
        }
        BackendKind::Local => {
            let data_dir = PathBuf::from(&cfg.local.data_dir);
            let objects_dir = data_dir.join("objects");
            info!(data_dir = %data_dir.display(), "using local file backend");
            Ok(Backends {
                identity: Arc::new(LocalIdentity::from_config(&cfg.local)?),
                records: Arc::new(FileRecordStore::open(&data_dir).await?),
                objects: Arc::new(DirObjectStorage::new(&objects_dir, &cfg.local.public_base_url)),
                local_storage_root: Some(objects_dir),
            })
        }
    }
}
