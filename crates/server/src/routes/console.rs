use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use models::{Collection, Project, RecordId, Service};
use service::console::{DeleteOutcome, FormMode, LocalFile, SessionContext, SubmitError, UploadOutcome};

use super::auth::ServerState;
use crate::errors::PageError;
use crate::views::{self, list_path, RecordView};

/// Run a generic handler body for the record type behind a collection.
macro_rules! for_collection {
    ($collection:expr, $f:ident ( $($arg:expr),* )) => {
        match $collection {
            Collection::Projects => $f::<Project>($($arg),*).await,
            Collection::Services => $f::<Service>($($arg),*).await,
        }
    };
}

fn collection(raw: &str) -> Result<Collection, PageError> {
    raw.parse().map_err(|e: models::ModelError| PageError::NotFound(e.to_string()))
}

fn operator(session: &SessionContext) -> &str {
    session.identity.email.as_deref().unwrap_or(&session.identity.id)
}

/// Fields of a submitted record form, urlencoded or multipart. The first
/// file part, if any, is kept aside.
pub struct SubmittedForm {
    pub fields: HashMap<String, String>,
    pub file: Option<LocalFile>,
}

impl SubmittedForm {
    fn action(&self) -> &str {
        self.fields.get("action").map_or("save", String::as_str)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for SubmittedForm {
    type Rejection = PageError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));
        if !multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| PageError::BadRequest(e.body_text()))?;
            return Ok(Self { fields, file: None });
        }

        let mut parts = Multipart::from_request(req, state)
            .await
            .map_err(|e| PageError::BadRequest(e.body_text()))?;
        let bad = |e: axum::extract::multipart::MultipartError| PageError::BadRequest(e.body_text());
        let mut fields = HashMap::new();
        let mut file = None;
        while let Some(part) = parts.next_field().await.map_err(bad)? {
            let name = part.name().unwrap_or_default().to_string();
            match part.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = part.content_type().map(str::to_string);
                    let bytes = part.bytes().await.map_err(bad)?.to_vec();
                    if file.is_none() {
                        file = Some(LocalFile { file_name, content_type, bytes });
                    }
                }
                None => {
                    fields.insert(name, part.text().await.map_err(bad)?);
                }
            }
        }
        Ok(Self { fields, file })
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteInput {
    #[serde(default)]
    confirm: String,
}

pub async fn index() -> Redirect {
    Redirect::to(&list_path(Collection::Projects))
}

async fn render_list<T: RecordView>(state: &ServerState, session: &SessionContext) -> Response {
    let mut list = state.console.list::<T>(session);
    list.load().await;
    Html(views::list_page(list.records(), list.notice(), operator(session))).into_response()
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(raw): Path<String>,
) -> Result<Response, PageError> {
    Ok(for_collection!(collection(&raw)?, render_list(&state, &session)))
}

async fn render_new<T: RecordView>(_state: &ServerState, session: &SessionContext) -> Response {
    let draft = T::Draft::default();
    Html(views::form_page::<T>(&FormMode::Create, &draft, None, None, operator(session))).into_response()
}

pub async fn new_form(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(raw): Path<String>,
) -> Result<Response, PageError> {
    Ok(for_collection!(collection(&raw)?, render_new(&state, &session)))
}

/// The store has no get-by-id; the record is looked up in a fresh list.
async fn render_edit<T: RecordView>(state: &ServerState, session: &SessionContext, id: &RecordId) -> Result<Response, PageError> {
    let mut list = state.console.list::<T>(session);
    if !list.load().await {
        return Ok(Html(views::list_page(list.records(), list.notice(), operator(session))).into_response());
    }
    let record = list
        .find(id)
        .ok_or_else(|| PageError::NotFound(format!("{} {id} not found", T::COLLECTION.singular())))?;
    let form = list.open_edit(record);
    Ok(Html(views::form_page::<T>(form.mode(), &form.draft, None, list.notice(), operator(session))).into_response())
}

pub async fn edit_form(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path((raw, id)): Path<(String, String)>,
) -> Result<Response, PageError> {
    let id = RecordId::new(id);
    for_collection!(collection(&raw)?, render_edit(&state, &session, &id))
}

async fn save<T: RecordView>(state: &ServerState, session: &SessionContext, mode: FormMode, submitted: SubmittedForm) -> Response {
    let list = state.console.list::<T>(session);
    let mut form = list.form(mode, T::draft_from_fields(&submitted.fields));
    match form.submit().await {
        Ok(_) => Redirect::to(&list_path(T::COLLECTION)).into_response(),
        Err(SubmitError::Invalid(e)) => {
            let html = views::form_page::<T>(form.mode(), &form.draft, Some(&e.to_string()), None, operator(session));
            (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
        }
        Err(SubmitError::Store(_)) => {
            Html(views::form_page::<T>(form.mode(), &form.draft, None, form.notice(), operator(session))).into_response()
        }
    }
}

/// Project forms also carry an image. `action=upload` only uploads and
/// re-renders; a save with a file attached uploads first and stops there if
/// the upload fails.
async fn save_project(state: &ServerState, session: &SessionContext, mode: FormMode, mut submitted: SubmittedForm) -> Response {
    let file = submitted.file.take().filter(|f| !f.is_empty());
    if submitted.action() != "upload" && file.is_none() {
        return save::<Project>(state, session, mode, submitted).await;
    }

    let list = state.console.list::<Project>(session);
    let mut form = list.form(mode, Project::draft_from_fields(&submitted.fields));
    let outcome = form.upload_image(state.console.uploader(), file).await;
    if submitted.action() == "upload" || outcome == UploadOutcome::Failed {
        if outcome == UploadOutcome::NoFile {
            warn!("upload requested without a file");
        }
        let html = views::form_page::<Project>(form.mode(), &form.draft, None, form.notice(), operator(session));
        return Html(html).into_response();
    }
    submitted.fields.insert("bg_image".into(), form.draft.bg_image.clone());
    save::<Project>(state, session, form.mode().clone(), submitted).await
}

async fn dispatch_save(state: &ServerState, session: &SessionContext, raw: &str, mode: FormMode, submitted: SubmittedForm) -> Result<Response, PageError> {
    Ok(match collection(raw)? {
        Collection::Projects => save_project(state, session, mode, submitted).await,
        Collection::Services => save::<Service>(state, session, mode, submitted).await,
    })
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(raw): Path<String>,
    submitted: SubmittedForm,
) -> Result<Response, PageError> {
    dispatch_save(&state, &session, &raw, FormMode::Create, submitted).await
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path((raw, id)): Path<(String, String)>,
    submitted: SubmittedForm,
) -> Result<Response, PageError> {
    dispatch_save(&state, &session, &raw, FormMode::Edit(RecordId::new(id)), submitted).await
}

async fn render_confirm<T: RecordView>(state: &ServerState, session: &SessionContext, id: &RecordId) -> Result<Response, PageError> {
    let mut list = state.console.list::<T>(session);
    if !list.load().await {
        return Ok(Html(views::list_page(list.records(), list.notice(), operator(session))).into_response());
    }
    let record = list
        .find(id)
        .ok_or_else(|| PageError::NotFound(format!("{} {id} not found", T::COLLECTION.singular())))?;
    Ok(Html(views::confirm_delete_page(record, operator(session))).into_response())
}

pub async fn confirm_delete(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path((raw, id)): Path<(String, String)>,
) -> Result<Response, PageError> {
    let id = RecordId::new(id);
    for_collection!(collection(&raw)?, render_confirm(&state, &session, &id))
}

async fn delete_record<T: RecordView>(state: &ServerState, session: &SessionContext, id: &RecordId, confirmed: bool) -> Response {
    let mut list = state.console.list::<T>(session);
    list.load().await;
    match list.delete(id, confirmed).await {
        DeleteOutcome::Deleted | DeleteOutcome::NotConfirmed => Redirect::to(&list_path(T::COLLECTION)).into_response(),
        DeleteOutcome::Failed => Html(views::list_page(list.records(), list.notice(), operator(session))).into_response(),
    }
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path((raw, id)): Path<(String, String)>,
    Form(input): Form<DeleteInput>,
) -> Result<Response, PageError> {
    let id = RecordId::new(id);
    let confirmed = input.confirm == "yes";
    Ok(for_collection!(collection(&raw)?, delete_record(&state, &session, &id, confirmed)))
}
