use super::see_other;
use crate::middleware::ClientCtx;
use crate::session::end_session;
use actix_session::Session;
use actix_web::{get, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

#[get("/logout")]
pub async fn view_logout(client: ClientCtx, session: Session) -> HttpResponse {
    if let Some(user_id) = client.get_id() {
        log::info!("User {} logged out", user_id);
    }
    end_session(&session);
    see_other("/")
}
