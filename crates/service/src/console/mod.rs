//! The operator console: session gate, login, per-collection list and form,
//! and image upload. Everything here is view state over the backend traits;
//! rendering lives in the server crate.

pub mod form;
pub mod list;
pub mod login;
pub mod notice;
pub mod session;
pub mod upload;

use std::sync::Arc;

use models::Record;

use crate::backend::{IdentityProvider, RecordStore};
use crate::repository::Repository;

pub use form::{FormMode, FormOutcome, RecordForm, SubmitError, UploadOutcome};
pub use list::{DeleteOutcome, RecordList};
pub use login::{LoginView, PendingSignIn, SignInGate};
pub use notice::{FailurePolicy, Notice};
pub use session::{GuardOutcome, Route, SessionContext, SessionGuard};
pub use upload::{ImageUploader, LocalFile};

/// Collaborators shared by every view, cheap to clone per request.
#[derive(Clone)]
pub struct Console {
    identity: Arc<dyn IdentityProvider>,
    records: Arc<dyn RecordStore>,
    uploader: Arc<ImageUploader>,
    sign_ins: SignInGate,
    policy: FailurePolicy,
}

impl Console {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        records: Arc<dyn RecordStore>,
        uploader: ImageUploader,
        policy: FailurePolicy,
    ) -> Self {
        Self { identity, records, uploader: Arc::new(uploader), sign_ins: SignInGate::default(), policy }
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.identity.clone())
    }

    pub fn login_view(&self) -> LoginView {
        LoginView::new(self.identity.clone(), self.sign_ins.clone())
    }

    pub fn uploader(&self) -> &ImageUploader {
        &self.uploader
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// An unloaded list for `T`; call [`RecordList::load`] before reading.
    pub fn list<T: Record>(&self, session: &SessionContext) -> RecordList<T> {
        RecordList::new(Repository::new(self.records.clone()), session.clone(), self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::identity::mock::MockIdentityProvider;
    use crate::backend::objects::mock::{MemoryObjectStorage, PUBLIC_BASE};
    use crate::backend::records::mock::MemoryRecordStore;
    use models::{Collection, OrderIndex, Project, ProjectDraft, Service, ServiceDraft};

    struct Harness {
        console: Console,
        records: Arc<MemoryRecordStore>,
        objects: Arc<MemoryObjectStorage>,
        session: SessionContext,
    }

    async fn harness() -> Harness {
        let idp = Arc::new(MockIdentityProvider::with_user("admin@example.com", "pw"));
        let records = Arc::new(MemoryRecordStore::default());
        let objects = Arc::new(MemoryObjectStorage::default());
        let console = Console::new(
            idp.clone(),
            records.clone(),
            ImageUploader::new(objects.clone(), "portfolio-images", "projects"),
            FailurePolicy::default(),
        );
        let token = idp.issue("admin@example.com");
        let GuardOutcome::Authenticated(session) = console.guard().check(Some(token)).await else {
            panic!("mock session should be valid");
        };
        Harness { console, records, objects, session }
    }

    fn project(title: &str, order: i64) -> ProjectDraft {
        ProjectDraft { title: title.into(), description: "desc".into(), order_index: OrderIndex::new(order), ..Default::default() }
    }

    async fn create(h: &Harness, draft: ProjectDraft) {
        let list = h.console.list::<Project>(&h.session);
        let mut form = list.open_create();
        form.draft = draft;
        assert_eq!(form.submit().await.unwrap(), FormOutcome::Saved);
    }

    #[tokio::test]
    async fn alpha_beta_load_in_order_index_order() {
        let h = harness().await;
        create(&h, project("Alpha", 2)).await;
        create(&h, project("Beta", 1)).await;

        let mut list = h.console.list::<Project>(&h.session);
        assert!(list.load().await);
        let titles: Vec<&str> = list.records().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Beta", "Alpha"]);
    }

    #[tokio::test]
    async fn ties_keep_store_order_and_nan_sorts_last() {
        let h = harness().await;
        create(&h, project("first", 1)).await;
        create(&h, ProjectDraft { order_index: OrderIndex::parse_input("abc"), ..project("nan", 0) }).await;
        create(&h, project("second", 1)).await;

        let mut list = h.console.list::<Project>(&h.session);
        list.load().await;
        let titles: Vec<&str> = list.records().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "nan"]);

        let stored = h.records.rows(Collection::Projects);
        let nan_row = stored.iter().find(|r| r["title"] == "nan").unwrap();
        assert!(nan_row["order_index"].is_null());
    }

    #[tokio::test]
    async fn empty_title_is_rejected_before_any_store_call() {
        let h = harness().await;
        let list = h.console.list::<Project>(&h.session);
        let mut form = list.open_create();
        form.draft.description = "desc".into();

        let before = h.records.calls();
        let err = form.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert_eq!(h.records.calls(), before);
        assert_eq!(form.draft.description, "desc");
    }

    #[tokio::test]
    async fn service_requires_icon() {
        let h = harness().await;
        let list = h.console.list::<Service>(&h.session);
        let mut form = list.open_create();
        form.draft = ServiceDraft { title: "Web".into(), description: "d".into(), ..Default::default() };
        assert!(matches!(form.submit().await, Err(SubmitError::Invalid(_))));
        form.draft.icon = "*".into();
        assert_eq!(form.submit().await.unwrap(), FormOutcome::Saved);
    }

    #[tokio::test]
    async fn edit_updates_only_the_given_record() {
        let h = harness().await;
        create(&h, project("Alpha", 0)).await;
        create(&h, project("Beta", 1)).await;

        let mut list = h.console.list::<Project>(&h.session);
        list.load().await;
        let beta = list.records()[1].clone();
        let mut form = list.open_edit(&beta);
        assert_eq!(form.mode(), &FormMode::Edit(beta.id.clone()));
        form.draft.title = "Beta v2".into();
        let outcome = form.submit().await.unwrap();
        list.form_closed(outcome).await;

        let titles: Vec<&str> = list.records().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "Beta v2"]);
    }

    #[tokio::test]
    async fn failed_save_keeps_draft_and_surfaces_notice() {
        let h = harness().await;
        let list = h.console.list::<Project>(&h.session);
        let mut form = list.open_create();
        form.draft = project("Alpha", 3);
        h.records.set_failing(true);

        assert!(matches!(form.submit().await, Err(SubmitError::Store(_))));
        assert_eq!(form.draft.title, "Alpha");
        assert_eq!(form.notice().map(|n| n.operation), Some("save"));
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let h = harness().await;
        create(&h, project("Alpha", 0)).await;
        let mut list = h.console.list::<Project>(&h.session);
        list.load().await;
        let id = list.records()[0].id.clone();

        assert_eq!(list.delete(&id, false).await, DeleteOutcome::NotConfirmed);
        assert_eq!(list.records().len(), 1);
        assert_eq!(h.records.rows(Collection::Projects).len(), 1);

        assert_eq!(list.delete(&id, true).await, DeleteOutcome::Deleted);
        assert!(list.records().is_empty());
    }

    #[tokio::test]
    async fn failed_load_and_delete_keep_stale_list() {
        let h = harness().await;
        create(&h, project("Alpha", 0)).await;
        let mut list = h.console.list::<Project>(&h.session);
        list.load().await;
        let id = list.records()[0].id.clone();

        h.records.set_failing(true);
        assert!(!list.load().await);
        assert!(!list.is_loading());
        assert_eq!(list.records().len(), 1);
        assert_eq!(list.delete(&id, true).await, DeleteOutcome::Failed);
        assert_eq!(list.records().len(), 1);
        assert!(list.notice().is_some());
    }

    #[tokio::test]
    async fn successful_reload_clears_load_notice() {
        let h = harness().await;
        create(&h, project("Alpha", 0)).await;
        let mut list = h.console.list::<Project>(&h.session);

        h.records.set_failing(true);
        assert!(!list.load().await);
        assert!(list.notice().is_some());

        h.records.set_failing(false);
        assert!(list.load().await);
        assert!(list.notice().is_none());
        assert_eq!(list.records().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_form_does_not_reload() {
        let h = harness().await;
        let mut list = h.console.list::<Project>(&h.session);
        list.load().await;
        let calls = h.records.calls();
        let form = list.open_create();
        list.form_closed(form.cancel()).await;
        assert_eq!(h.records.calls(), calls);
    }

    #[tokio::test]
    async fn upload_then_save_persists_public_url() {
        let h = harness().await;
        let list = h.console.list::<Project>(&h.session);
        let mut form = list.open_create();
        form.draft = project("Alpha", 0);

        assert_eq!(form.upload_image(h.console.uploader(), None).await, UploadOutcome::NoFile);
        assert_eq!(form.upload_image(h.console.uploader(), Some(LocalFile::default())).await, UploadOutcome::NoFile);

        let file = LocalFile { file_name: "cover.webp".into(), content_type: Some("image/webp".into()), bytes: vec![7; 8] };
        let UploadOutcome::Uploaded(url) = form.upload_image(h.console.uploader(), Some(file)).await else {
            panic!("upload should succeed");
        };
        assert!(url.starts_with(&format!("{PUBLIC_BASE}/portfolio-images/projects/")));
        assert!(url.ends_with(".webp"));
        assert_eq!(h.objects.keys().len(), 1);

        form.submit().await.unwrap();
        let rows = h.records.rows(Collection::Projects);
        assert_eq!(rows[0]["bg_image"], serde_json::json!(url));
    }

    #[tokio::test]
    async fn failed_upload_leaves_bg_image_unchanged() {
        let h = harness().await;
        let list = h.console.list::<Project>(&h.session);
        let mut form = list.open_create();
        form.draft.bg_image = "https://old.example/img.png".into();
        h.objects.set_failing(true);

        let file = LocalFile { file_name: "x.png".into(), content_type: None, bytes: vec![1] };
        assert_eq!(form.upload_image(h.console.uploader(), Some(file)).await, UploadOutcome::Failed);
        assert_eq!(form.draft.bg_image, "https://old.example/img.png");
    }

    #[tokio::test]
    async fn silent_policy_hides_notices() {
        let mut h = harness().await;
        h.console.policy = FailurePolicy::silent();
        h.records.set_failing(true);
        let mut list = h.console.list::<Project>(&h.session);
        assert!(!list.load().await);
        assert!(list.notice().is_none());
    }
}
