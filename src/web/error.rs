use crate::middleware::ClientCtx;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpMessage, HttpResponse, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    client: ClientCtx,
    status: u16,
    reason: &'static str,
    message: String,
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "The request could not be understood.")
}

pub fn render_401<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "You must be logged in to do that.")
}

pub fn render_403<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "You do not have permission to do that.")
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "The page you requested does not exist.")
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Something went wrong on our end.")
}

/// Replaces the body of an error response with the error page.
/// The message of an `actix_web::Error` wins over `fallback`.
fn render_error<B>(res: ServiceResponse<B>, fallback: &str) -> Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    let message = match res.response().error() {
        // 500 details stay in the log.
        Some(err) if status != StatusCode::INTERNAL_SERVER_ERROR => err.to_string(),
        Some(err) => {
            log::error!("render_error: {}", err);
            fallback.to_owned()
        }
        None => fallback.to_owned(),
    };

    let (req, _) = res.into_parts();
    let client = ClientCtx::get_or_default_from_extensions(&mut req.extensions_mut());

    let body = ErrorTemplate {
        client,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error"),
        message,
    }
    .render()
    .unwrap_or_else(|e| {
        log::error!("render_error: template failed: {}", e);
        format!("{} {}", status.as_u16(), fallback)
    });

    let new_res = HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .body(body);

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, new_res).map_into_right_body(),
    ))
}
