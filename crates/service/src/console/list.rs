use models::{sort_for_display, Record, RecordId};
use tracing::{debug, instrument};

use super::form::{FormMode, FormOutcome, RecordForm};
use super::notice::{FailurePolicy, Notice};
use super::session::SessionContext;
use crate::repository::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    NotConfirmed,
    Deleted,
    Failed,
}

/// Ordered list of one collection with delete and the entry points to the
/// form.
pub struct RecordList<T: Record> {
    repo: Repository<T>,
    session: SessionContext,
    policy: FailurePolicy,
    records: Vec<T>,
    loading: bool,
    notice: Option<Notice>,
}

impl<T: Record> RecordList<T> {
    pub(crate) fn new(repo: Repository<T>, session: SessionContext, policy: FailurePolicy) -> Self {
        Self { repo, session, policy, records: Vec::new(), loading: false, notice: None }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn find(&self, id: &RecordId) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Refresh from the store. On failure the previous list stays; returns
    /// whether the refresh succeeded.
    #[instrument(skip(self), fields(collection = %T::COLLECTION))]
    pub async fn load(&mut self) -> bool {
        self.loading = true;
        let res = self.repo.list(&self.session.token).await;
        self.loading = false;
        match res {
            Ok(mut records) => {
                sort_for_display(&mut records);
                debug!(count = records.len(), "records loaded");
                self.records = records;
                self.notice = None;
                true
            }
            Err(e) => {
                self.notice = self.policy.report("load", &e);
                false
            }
        }
    }

    #[instrument(skip(self), fields(collection = %T::COLLECTION))]
    pub async fn delete(&mut self, id: &RecordId, confirmed: bool) -> DeleteOutcome {
        if !confirmed {
            return DeleteOutcome::NotConfirmed;
        }
        match self.repo.delete(&self.session.token, id).await {
            Ok(()) => {
                common::metrics::record_mutation(T::COLLECTION.as_str(), "delete");
                self.load().await;
                DeleteOutcome::Deleted
            }
            Err(e) => {
                self.notice = self.policy.report("delete", &e);
                DeleteOutcome::Failed
            }
        }
    }

    pub fn open_create(&self) -> RecordForm<T> {
        self.form(FormMode::Create, T::Draft::default())
    }

    pub fn open_edit(&self, record: &T) -> RecordForm<T> {
        self.form(FormMode::Edit(record.id().clone()), record.to_draft())
    }

    /// A form carrying a draft that was already being edited, as when a
    /// submitted page is re-rendered.
    pub fn form(&self, mode: FormMode, draft: T::Draft) -> RecordForm<T> {
        RecordForm::new(self.repo.clone(), self.session.clone(), self.policy, mode, draft)
    }

    /// Saved forms trigger a reload; cancelled ones do not.
    pub async fn form_closed(&mut self, outcome: FormOutcome) {
        if outcome == FormOutcome::Saved {
            self.load().await;
        }
    }
}
