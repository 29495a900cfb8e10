use crate::http::middleware::access_log::AccessLogMw;
use crate::http::parse::parse_params;
use crate::http::response::no_content;
use crate::http::router::Router;
use crate::http::{HttpError, Method, RequestContext, Response};
use crate::store::{RecordStore, Subject};
use std::fmt::Write;
use std::sync::Arc;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Routes of the grade book application.
pub fn router(store: Arc<RecordStore>) -> Router {
    let mut router = Router::new();
    router.add_middleware(Box::new(AccessLogMw));

    let s = Arc::clone(&store);
    router.add_handler(Method::GET, "/", Box::new(move |r| index(r, &s)));

    let s = Arc::clone(&store);
    router.add_handler(
        Method::POST,
        "/set_subject",
        Box::new(move |r| set_subject(r, &s)),
    );

    let s = Arc::clone(&store);
    router.add_handler(Method::GET, "/grades", Box::new(move |r| grades(r, &s)));

    router.add_any_method_handler("/favicon.ico", Box::new(|_| Ok(no_content())));

    router
}

fn index(_r: &mut RequestContext, store: &RecordStore) -> Result<Response, HttpError> {
    Ok(Response::html(render_index(&store.snapshot())))
}

fn set_subject(r: &mut RequestContext, store: &RecordStore) -> Result<Response, HttpError> {
    let mut params = r.request().query.clone();

    if params.is_empty() {
        let is_form = r
            .get_header("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(FORM_CONTENT_TYPE));
        if is_form {
            let body = r.read_body()?;
            let body = std::str::from_utf8(&body).map_err(|e| HttpError::MalformedForm {
                reason: e.to_string(),
            })?;
            params = parse_params(body)?;
        }
    }

    let title = first_param(&params, "title").ok_or(HttpError::MissingFormField { field: "title" })?;
    let grade = first_param(&params, "grade").ok_or(HttpError::MissingFormField { field: "grade" })?;

    store.record_grade(title, grade)?;

    Ok(Response::see_other("/"))
}

fn grades(_r: &mut RequestContext, store: &RecordStore) -> Result<Response, HttpError> {
    let body = serde_json::to_vec_pretty(&store.snapshot()).map_err(HttpError::internal)?;
    Ok(Response::json(body))
}

fn first_param<'p>(params: &'p [(String, String)], name: &str) -> Option<&'p str> {
    params
        .iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

fn render_index(subjects: &[Subject]) -> String {
    let mut body = String::from(
        r#"<html><head><title>Grades</title></head><body>
<h1>Add a grade</h1>
<form method="POST" action="/set_subject">
  Subject: <input type="text" name="title"><br>
  Grade: <input type="text" name="grade"><br>
  <input type="submit" value="Add">
</form>
<hr>
<h2>Grades</h2><ul>"#,
    );

    for subject in subjects {
        let grades = subject
            .grades
            .iter()
            .map(|g| escape_html(g))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(body, "<li>{}: {}</li>", escape_html(&subject.title), grades);
    }

    body.push_str("</ul></body></html>");
    body
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
