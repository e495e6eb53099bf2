pub mod error;
pub mod forum;
pub mod index;
pub mod login;
pub mod logout;
pub mod member;
pub mod messages;
pub mod notifications;
pub mod post;
pub mod reactions;
pub mod search;
pub mod topic;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    index::configure(conf);
    forum::configure(conf);
    topic::configure(conf);
    post::configure(conf);
    reactions::configure(conf);
    notifications::configure(conf);
    messages::configure(conf);
    member::configure(conf);
    search::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    crate::create_user::configure(conf);
}

/// 303 to `location`, the answer to every successful form post.
pub fn see_other(location: &str) -> actix_web::HttpResponse {
    actix_web::HttpResponse::SeeOther()
        .append_header((actix_web::http::header::LOCATION, location))
        .finish()
}
