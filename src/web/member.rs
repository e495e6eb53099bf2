use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::reactions::{reactions_given_by_user, GivenReaction};
use crate::topics::{posts_by_user, PostWithTopic};
use crate::user::Profile as UserProfile;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_member);
}

#[get("/members/{user_id}")]
pub async fn view_member(client: ClientCtx, path: web::Path<i32>) -> Result<impl Responder, Error> {
    #[derive(Template)]
    #[template(path = "member.html")]
    pub struct MemberTemplate {
        pub client: ClientCtx,
        pub user: UserProfile,
        pub posts: Vec<PostWithTopic>,
        pub reactions: Vec<GivenReaction>,
        pub is_self: bool,
    }

    let user_id = path.into_inner();
    let db = get_db_pool();

    let user = UserProfile::get_by_id(db, user_id)
        .await
        .map_err(|e| {
            log::error!("error {:?}", e);
            error::ErrorInternalServerError("Couldn't load user.")
        })?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    let posts = posts_by_user(db, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let reactions = reactions_given_by_user(db, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(MemberTemplate {
        is_self: client.get_id() == Some(user.id),
        client,
        user,
        posts,
        reactions,
    }
    .to_response())
}
