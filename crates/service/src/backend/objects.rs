use async_trait::async_trait;

use super::identity::AccessToken;
use crate::errors::ServiceError;

/// Object storage abstraction (bucketed blobs with public URLs).
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`. Existing objects are not
    /// overwritten.
    async fn upload(
        &self,
        token: &AccessToken,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Public URL of an object. Pure string construction, no request.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    pub const PUBLIC_BASE: &str = "https://cdn.test/public";

    #[derive(Default)]
    pub struct MemoryObjectStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        failing: AtomicBool,
    }

    impl MemoryObjectStorage {
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Keys as `bucket/path`.
        pub fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }

        pub fn get(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(&format!("{bucket}/{path}")).cloned()
        }
    }

    #[async_trait]
    impl ObjectStorage for MemoryObjectStorage {
        async fn upload(
            &self,
            _token: &AccessToken,
            bucket: &str,
            path: &str,
            bytes: Vec<u8>,
            _content_type: Option<&str>,
        ) -> Result<(), ServiceError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::Remote { status: 500, message: "storage unavailable".into() });
            }
            let mut objects = self.objects.lock().unwrap();
            let key = format!("{bucket}/{path}");
            if objects.contains_key(&key) {
                return Err(ServiceError::Remote { status: 409, message: "The resource already exists".into() });
            }
            objects.insert(key, bytes);
            Ok(())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("{PUBLIC_BASE}/{bucket}/{path}")
        }
    }
}
