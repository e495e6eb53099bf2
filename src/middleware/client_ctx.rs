//! Per-request view of who is asking.
//!
//! [`ClientCtx`] runs as middleware inside the session layer. It resolves the
//! session's user once, then stores the result in request extensions where
//! handlers pick it up as an extractor. Without the middleware the extractor
//! yields a guest, which keeps handlers testable in isolation.

use crate::constants::GUEST_USERNAME;
use crate::db::get_db_pool;
use crate::user::Profile;
use actix_session::Session;
use actix_web::dev::{
    self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::{error, web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Everything resolved for one request.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// None for guests.
    pub client: Option<Profile>,
    pub csrf_token: String,
    pub unread_notifications: i64,
    pub unread_messages: i64,
    pub request_start: Instant,
}

impl ClientCtxInner {
    fn guest() -> Self {
        Self {
            client: None,
            csrf_token: String::new(),
            unread_notifications: 0,
            unread_messages: 0,
            request_start: Instant::now(),
        }
    }

    /// Loads the user, CSRF token and badge counts for `session`.
    /// Storage errors degrade to guest-like defaults and are logged.
    pub async fn from_session(session: &Session) -> Self {
        let request_start = Instant::now();
        let db = get_db_pool();

        let csrf_token = crate::middleware::csrf::get_or_create_csrf_token(session)
            .unwrap_or_else(|e| {
                log::error!("ClientCtxInner::from_session: {}", e);
                String::new()
            });

        let client = crate::session::authenticate_client_by_session(db, session).await;
        let (unread_notifications, unread_messages) = match &client {
            Some(user) => {
                if let Err(e) = crate::user::touch_last_seen(db, user.id).await {
                    log::warn!("touch_last_seen failed for user {}: {}", user.id, e);
                }
                (
                    crate::notifications::count_unread_notifications(db, user.id)
                        .await
                        .unwrap_or(0),
                    crate::messages::count_unread(db, user.id).await.unwrap_or(0),
                )
            }
            None => (0, 0),
        };

        Self {
            client,
            csrf_token,
            unread_notifications,
            unread_messages,
            request_start,
        }
    }
}

/// Extractor and middleware factory. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::guest()))
    }
}

impl ClientCtx {
    pub async fn from_session(session: &Session) -> Self {
        Self(Data::new(ClientCtxInner::from_session(session).await))
    }

    /// The context the middleware stored, or a guest stored in its place.
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        if let Some(inner) = extensions.get::<Data<ClientCtxInner>>() {
            return Self(inner.clone());
        }

        let ctx = Self::default();
        extensions.insert(ctx.0.clone());
        ctx
    }

    pub fn get_id(&self) -> Option<i32> {
        self.get_user().map(|u| u.id)
    }

    /// Display name, or the guest label.
    pub fn get_name(&self) -> String {
        self.get_user()
            .map_or(GUEST_USERNAME, |u| u.display())
            .to_owned()
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.client.as_ref()
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn get_unread_notifications(&self) -> i64 {
        self.0.unread_notifications
    }

    pub fn get_unread_messages(&self) -> i64 {
        self.0.unread_messages
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.get_user().map_or(false, Profile::is_staff)
    }

    pub fn is_admin(&self) -> bool {
        self.get_user().map_or(false, Profile::is_admin)
    }

    /// Staff may modify anything; members only what they own.
    pub fn can_modify(&self, owner_id: Option<i32>) -> bool {
        self.is_staff() || (self.is_user() && owner_id.is_some() && owner_id == self.get_id())
    }

    pub fn request_time(&self) -> Duration {
        self.0.request_start.elapsed()
    }

    /// Footer timing, in µs under 5ms and ms above.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }

    /// 401 for guests, else the user's id.
    pub fn require_login(&self) -> Result<i32, Error> {
        self.get_id()
            .ok_or_else(|| error::ErrorUnauthorized("Login required"))
    }

    /// 403 unless a moderator or admin.
    pub fn require_staff(&self) -> Result<i32, Error> {
        let user_id = self.require_login()?;
        if self.is_staff() {
            Ok(user_id)
        } else {
            Err(error::ErrorForbidden("Moderators only"))
        }
    }

    /// 403 unless an admin.
    pub fn require_admin(&self) -> Result<i32, Error> {
        let user_id = self.require_login()?;
        if self.is_admin() {
            Ok(user_id)
        } else {
            Err(error::ErrorForbidden("Administrators only"))
        }
    }

    /// 403 unless the owner or staff.
    pub fn require_ownership(&self, owner_id: Option<i32>) -> Result<i32, Error> {
        let user_id = self.require_login()?;
        if self.can_modify(owner_id) {
            Ok(user_id)
        } else {
            Err(error::ErrorForbidden("You don't own this resource"))
        }
    }
}

impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Must run inside SessionMiddleware.
            match req.extract::<Session>().await {
                Ok(session) => {
                    let inner = ClientCtxInner::from_session(&session).await;
                    req.extensions_mut().insert(Data::new(inner));
                }
                Err(e) => log::error!("ClientCtxMiddleware: no session available: {}", e),
            }

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn signed_in(role: &str) -> ClientCtx {
        let mut inner = ClientCtxInner::guest();
        inner.client = Some(Profile {
            id: 7,
            name: "someone".to_owned(),
            display_name: None,
            role: role.to_owned(),
            created_at: chrono::Utc::now().naive_utc(),
            last_seen: None,
            post_count: 0,
            topic_count: 0,
        });
        ClientCtx(Data::new(inner))
    }

    fn status_of(result: Result<i32, Error>) -> Option<StatusCode> {
        result.err().map(|e| e.error_response().status())
    }

    #[test]
    fn test_guest_context() {
        let ctx = ClientCtx::default();
        assert!(!ctx.is_user());
        assert_eq!(None, ctx.get_id());
        assert_eq!(GUEST_USERNAME, ctx.get_name());
        assert!(!ctx.can_modify(None));
        assert!(!ctx.can_modify(Some(1)));
        assert!(ctx.require_login().is_err());
        assert!(ctx.require_ownership(Some(1)).is_err());
    }

    #[test]
    fn test_extensions_are_reused() {
        let mut extensions = Extensions::new();
        let first = ClientCtx::get_or_default_from_extensions(&mut extensions);
        let second = ClientCtx::get_or_default_from_extensions(&mut extensions);
        assert_eq!(first.get_csrf_token(), second.get_csrf_token());
        assert!(extensions.contains::<Data<ClientCtxInner>>());
    }

    #[test]
    fn test_require_admin() {
        assert_eq!(
            Some(StatusCode::UNAUTHORIZED),
            status_of(ClientCtx::default().require_admin())
        );
        assert_eq!(
            Some(StatusCode::FORBIDDEN),
            status_of(signed_in("member").require_admin())
        );
        assert_eq!(
            Some(StatusCode::FORBIDDEN),
            status_of(signed_in("moderator").require_admin())
        );
        assert_eq!(7, signed_in("admin").require_admin().unwrap());
        assert_eq!(7, signed_in("moderator").require_staff().unwrap());
    }
}
