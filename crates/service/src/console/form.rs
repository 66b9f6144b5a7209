use models::{Draft, ModelError, Project, Record, RecordId};
use thiserror::Error;
use tracing::{info, instrument};

use super::notice::{FailurePolicy, Notice};
use super::session::SessionContext;
use super::upload::{ImageUploader, LocalFile};
use crate::errors::ServiceError;
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

/// How a form was closed, reported back to the list that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Saved,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ModelError),
    #[error("save failed: {0}")]
    Store(ServiceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    NoFile,
    Uploaded(String),
    Failed,
}

/// Create/edit form for one record. The draft survives a failed save so the
/// operator can retry without retyping.
pub struct RecordForm<T: Record> {
    repo: Repository<T>,
    session: SessionContext,
    policy: FailurePolicy,
    mode: FormMode,
    pub draft: T::Draft,
    notice: Option<Notice>,
}

impl<T: Record> RecordForm<T> {
    pub(crate) fn new(
        repo: Repository<T>,
        session: SessionContext,
        policy: FailurePolicy,
        mode: FormMode,
        draft: T::Draft,
    ) -> Self {
        Self { repo, session, policy, mode, draft, notice: None }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Validate, then insert or update. Nothing reaches the store when
    /// validation fails.
    #[instrument(skip(self), fields(collection = %T::COLLECTION))]
    pub async fn submit(&mut self) -> Result<FormOutcome, SubmitError> {
        self.draft.validate()?;
        self.notice = None;
        let res = match &self.mode {
            FormMode::Edit(id) => self.repo.update(&self.session.token, id, &self.draft).await.map(|_| "update"),
            FormMode::Create => self.repo.insert(&self.session.token, &self.draft).await.map(|_| "create"),
        };
        match res {
            Ok(kind) => {
                common::metrics::record_mutation(T::COLLECTION.as_str(), kind);
                info!(kind, "record saved");
                Ok(FormOutcome::Saved)
            }
            Err(e) => {
                self.notice = self.policy.report("save", &e);
                Err(SubmitError::Store(e))
            }
        }
    }

    pub fn cancel(self) -> FormOutcome {
        FormOutcome::Cancelled
    }
}

impl RecordForm<Project> {
    /// Upload a background image and put its public URL into the draft.
    /// `&mut self` keeps uploads on one form strictly sequential.
    pub async fn upload_image(&mut self, uploader: &ImageUploader, file: Option<LocalFile>) -> UploadOutcome {
        let Some(file) = file.filter(|f| !f.is_empty()) else {
            return UploadOutcome::NoFile;
        };
        match uploader.upload(&self.session.token, file).await {
            Ok(url) => {
                self.draft.bg_image = url.clone();
                UploadOutcome::Uploaded(url)
            }
            Err(e) => {
                self.notice = self.policy.report("upload image", &e);
                UploadOutcome::Failed
            }
        }
    }
}
