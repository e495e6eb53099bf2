pub mod announcements;
pub mod categories;
pub mod forums;
pub mod notifications;
pub mod post_reactions;
pub mod posts;
pub mod private_messages;
pub mod topics;
pub mod users;
