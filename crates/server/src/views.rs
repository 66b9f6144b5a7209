//! Server-side HTML for the console. Pages are plain strings; every
//! interpolated value goes through [`escape`].

use std::collections::HashMap;

use axum::http::StatusCode;
use models::{Collection, OrderIndex, Project, ProjectDraft, Record, Service, ServiceDraft};
use service::console::{FormMode, Notice};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn list_path(collection: Collection) -> String {
    format!("/admin/{}", collection.as_str())
}

/// Disables a form's buttons once it is submitting. Deferred so the clicked
/// button's `name=value` still goes out with the form.
const DISABLE_ON_SUBMIT: &str =
    r#"onsubmit="setTimeout(() => this.querySelectorAll('button').forEach(b => b.disabled = true))""#;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/assets/admin.css">
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title)
    )
}

/// Header with collection tabs, operator and sign-out.
fn console_page(active: Collection, operator: &str, title: &str, body: &str) -> String {
    let tabs: String = Collection::ALL
        .iter()
        .map(|c| {
            let class = if *c == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{class}>{}</a>"#, list_path(*c), c.label())
        })
        .collect();
    let html = format!(
        r#"<header class="console">
<h1>Portfolio admin</h1>
<nav>{tabs}</nav>
<a href="/" class="site" target="_blank" rel="noopener">View Site</a>
<form method="post" action="/logout" class="signout"><span>{operator}</span> <button type="submit">Sign out</button></form>
</header>
<main>
{body}
</main>"#,
        operator = escape(operator)
    );
    page(title, &html)
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        Some(n) => format!(
            r#"<div class="notice" role="alert">{} <button type="button" onclick="this.parentElement.remove()">Dismiss</button></div>"#,
            escape(&n.message)
        ),
        None => String::new(),
    }
}

pub fn home_page() -> String {
    page(
        "Portfolio",
        r#"<main class="home"><h1>Portfolio</h1><p><a href="/admin">Admin console</a></p></main>"#,
    )
}

pub fn login_page(email: &str, error: Option<&str>) -> String {
    let banner = error
        .map(|e| format!(r#"<div class="error" role="alert">{}</div>"#, escape(e)))
        .unwrap_or_default();
    let body = format!(
        r#"<main class="login">
<h1>Sign in</h1>
{banner}
<form method="post" action="/login" {DISABLE_ON_SUBMIT}>
<label>Email <input type="email" name="email" value="{email}" required autofocus></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Sign in</button>
</form>
<p><a href="/">Back to Portfolio</a></p>
</main>"#,
        email = escape(email)
    );
    page("Sign in", &body)
}

pub fn list_page<T: RecordView>(records: &[T], notice: Option<&Notice>, operator: &str) -> String {
    let collection = T::COLLECTION;
    let base = list_path(collection);
    let rows: String = records
        .iter()
        .map(|r| {
            let id = escape(r.id().as_str());
            format!(
                r#"<tr><td>{order}</td><td>{title}</td>{detail}<td class="actions"><a href="{base}/{id}/edit">Edit</a> <a href="{base}/{id}/delete">Delete</a></td></tr>"#,
                order = escape(&r.order_index().to_input_value()),
                title = escape(r.title()),
                detail = r.detail_cells(),
            )
        })
        .collect();
    let body = if records.is_empty() {
        format!(r#"<p class="empty">No {} yet.</p>"#, collection.label().to_lowercase())
    } else {
        format!(
            r#"<table>
<thead><tr><th>Order</th><th>Title</th>{headers}<th></th></tr></thead>
<tbody>
{rows}
</tbody>
</table>"#,
            headers = T::detail_headers()
        )
    };
    let html = format!(
        r#"{notice}
<div class="toolbar"><h2>{label}</h2><a class="button" href="{base}/new">Add {singular}</a></div>
{body}"#,
        notice = notice_html(notice),
        label = collection.label(),
        singular = collection.singular(),
    );
    console_page(collection, operator, collection.label(), &html)
}

pub fn form_page<T: RecordView>(
    mode: &FormMode,
    draft: &T::Draft,
    error: Option<&str>,
    notice: Option<&Notice>,
    operator: &str,
) -> String {
    let collection = T::COLLECTION;
    let base = list_path(collection);
    let (heading, action) = match mode {
        FormMode::Create => (format!("New {}", collection.singular()), base.clone()),
        FormMode::Edit(id) => (format!("Edit {}", collection.singular()), format!("{base}/{}", escape(id.as_str()))),
    };
    let enctype = if T::MULTIPART { r#" enctype="multipart/form-data""# } else { "" };
    let error = error
        .map(|e| format!(r#"<div class="error" role="alert">{}</div>"#, escape(e)))
        .unwrap_or_default();
    let html = format!(
        r#"{notice}
<h2>{heading}</h2>
{error}
<form method="post" action="{action}"{enctype} class="record" {DISABLE_ON_SUBMIT}>
{fields}
<div class="buttons"><button type="submit" name="action" value="save">Save</button> <a href="{base}">Cancel</a></div>
</form>"#,
        notice = notice_html(notice),
        fields = T::fields_html(draft),
    );
    console_page(collection, operator, &heading, &html)
}

pub fn confirm_delete_page<T: RecordView>(record: &T, operator: &str) -> String {
    let collection = T::COLLECTION;
    let base = list_path(collection);
    let html = format!(
        r#"<h2>Delete {singular}</h2>
<p>Delete “{title}”? This cannot be undone.</p>
<form method="post" action="{base}/{id}/delete">
<button type="submit" name="confirm" value="yes">Delete</button> <a href="{base}">Keep</a>
</form>"#,
        singular = collection.singular(),
        title = escape(record.title()),
        id = escape(record.id().as_str()),
    );
    console_page(collection, operator, "Delete", &html)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"<main class="error-page"><h1>{}</h1><p>{}</p><p><a href="/admin">Back to the console</a></p></main>"#,
        status.as_u16(),
        escape(message)
    );
    page(status.canonical_reason().unwrap_or("Error"), &body)
}

fn text_input(label: &str, name: &str, kind: &str, value: &str, required: bool) -> String {
    let required = if required { " required" } else { "" };
    format!(
        r#"<label>{label} <input type="{kind}" name="{name}" value="{value}"{required}></label>"#,
        value = escape(value)
    )
}

fn textarea(label: &str, name: &str, value: &str) -> String {
    format!(r#"<label>{label} <textarea name="{name}" rows="4" required>{}</textarea></label>"#, escape(value))
}

fn order_input(order: &OrderIndex) -> String {
    text_input("Order", "order_index", "number", &order.to_input_value(), false)
}

fn field(fields: &HashMap<String, String>, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

fn order_field(fields: &HashMap<String, String>) -> OrderIndex {
    fields.get("order_index").map_or(OrderIndex::default(), |raw| OrderIndex::parse_input(raw))
}

/// Per-record presentation: list columns, form inputs and reading a
/// submitted form back into a draft.
pub trait RecordView: Record {
    const MULTIPART: bool = false;

    fn detail_headers() -> &'static str;
    fn detail_cells(&self) -> String;
    fn fields_html(draft: &Self::Draft) -> String;
    fn draft_from_fields(fields: &HashMap<String, String>) -> Self::Draft;
}

impl RecordView for Project {
    const MULTIPART: bool = true;

    fn detail_headers() -> &'static str {
        "<th>Description</th><th>Image</th><th>Link</th>"
    }

    fn detail_cells(&self) -> String {
        let image = match self.bg_image.as_deref().filter(|s| !s.is_empty()) {
            Some(url) => format!(r#"<img src="{}" alt="" class="thumb">"#, escape(url)),
            None => String::new(),
        };
        format!(
            r#"<td class="description">{}</td><td>{image}</td><td>{}</td>"#,
            escape(&self.description),
            escape(self.link.as_deref().unwrap_or_default())
        )
    }

    fn fields_html(draft: &ProjectDraft) -> String {
        let preview = if draft.bg_image.is_empty() {
            String::new()
        } else {
            format!(r#"<img src="{}" alt="" class="preview">"#, escape(&draft.bg_image))
        };
        [
            text_input("Title", "title", "text", &draft.title, true),
            textarea("Description", "description", &draft.description),
            format!(
                r#"<fieldset class="image"><legend>Background image</legend>{preview}{url}<input type="file" name="image" accept="image/*"> <button type="submit" name="action" value="upload" formnovalidate>Upload</button></fieldset>"#,
                url = text_input("URL", "bg_image", "url", &draft.bg_image, false)
            ),
            text_input("Link", "link", "url", &draft.link, false),
            order_input(&draft.order_index),
        ]
        .join("\n")
    }

    fn draft_from_fields(fields: &HashMap<String, String>) -> ProjectDraft {
        ProjectDraft {
            title: field(fields, "title"),
            description: field(fields, "description"),
            bg_image: field(fields, "bg_image"),
            link: field(fields, "link"),
            order_index: order_field(fields),
        }
    }
}

impl RecordView for Service {
    fn detail_headers() -> &'static str {
        "<th>Icon</th><th>Description</th>"
    }

    fn detail_cells(&self) -> String {
        format!("<td>{}</td><td>{}</td>", escape(&self.icon), escape(&self.description))
    }

    fn fields_html(draft: &ServiceDraft) -> String {
        [
            text_input("Title", "title", "text", &draft.title, true),
            textarea("Description", "description", &draft.description),
            text_input("Icon", "icon", "text", &draft.icon, true),
            text_input("Link", "link", "url", &draft.link, false),
            order_input(&draft.order_index),
        ]
        .join("\n")
    }

    fn draft_from_fields(fields: &HashMap<String, String>) -> ServiceDraft {
        ServiceDraft {
            title: field(fields, "title"),
            description: field(fields, "description"),
            icon: field(fields, "icon"),
            link: field(fields, "link"),
            order_index: order_field(fields),
        }
    }
}
