//! Integration tests for private messages

mod common;

use common::{database::*, fixtures::*};
use liteforum::messages::{
    count_unread, delete_for_user, get_message, inbox, mark_read, send_message, sent, SendError,
};

fn invalid(result: Result<liteforum::orm::private_messages::Model, SendError>) -> Vec<&'static str> {
    match result {
        Err(SendError::Invalid(errors)) => errors,
        other => panic!("Expected validation errors, got {:?}", other.map(|m| m.id)),
    }
}

#[actix_rt::test]
async fn test_send_and_read_message() {
    let db = setup_test_database().await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();
    let bob = create_test_user(&db, "bob", "password123").await.unwrap();

    let message = send_message(&db, alice.id, " bob ", "  Lunch? ", "[b]Noon[/b] works")
        .await
        .expect("Failed to send message");
    assert_eq!(bob.id, message.recipient_id);
    assert_eq!("Lunch?", message.title);
    assert!(!message.is_read);

    assert_eq!(1, count_unread(&db, bob.id).await.unwrap());
    assert_eq!(0, count_unread(&db, alice.id).await.unwrap());

    let received = inbox(&db, bob.id).await.unwrap();
    assert_eq!(1, received.len());
    assert_eq!("alice", received[0].other_username);

    let outgoing = sent(&db, alice.id).await.unwrap();
    assert_eq!(1, outgoing.len());
    assert_eq!("bob", outgoing[0].other_username);
    assert!(inbox(&db, alice.id).await.unwrap().is_empty());

    let view = get_message(&db, message.id, bob.id).await.unwrap().unwrap();
    assert_eq!("alice", view.sender_username);
    assert_eq!("bob", view.recipient_username);
    assert!(view.render_body().contains("<strong>Noon</strong>"));
}

#[actix_rt::test]
async fn test_send_validation_collects_every_error() {
    let db = setup_test_database().await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();
    create_test_user(&db, "bob", "password123").await.unwrap();

    assert_eq!(
        vec![
            "Recipient username is required.",
            "Subject is required.",
            "Message body is required."
        ],
        invalid(send_message(&db, alice.id, "  ", "", " ").await)
    );
    assert_eq!(
        vec!["Recipient not found."],
        invalid(send_message(&db, alice.id, "nobody", "Hi", "Hello").await)
    );
    assert_eq!(
        vec!["You cannot send a message to yourself."],
        invalid(send_message(&db, alice.id, "alice", "Hi", "Hello").await)
    );
    assert_eq!(0, count_rows(&db, "private_messages").await.unwrap());
}

#[actix_rt::test]
async fn test_only_participants_can_view() {
    let db = setup_test_database().await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();
    create_test_user(&db, "bob", "password123").await.unwrap();
    let mallory = create_test_user(&db, "mallory", "password123").await.unwrap();

    let message = send_message(&db, alice.id, "bob", "Secret", "psst").await.unwrap();

    assert!(get_message(&db, message.id, alice.id).await.unwrap().is_some());
    assert!(get_message(&db, message.id, mallory.id).await.unwrap().is_none());
    assert!(get_message(&db, message.id + 1, alice.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_mark_read_only_applies_to_recipient() {
    let db = setup_test_database().await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();
    let bob = create_test_user(&db, "bob", "password123").await.unwrap();
    let message = send_message(&db, alice.id, "bob", "Hi", "Hello").await.unwrap();

    mark_read(&db, message.id, alice.id).await.unwrap();
    assert_eq!(1, count_unread(&db, bob.id).await.unwrap());

    mark_read(&db, message.id, bob.id).await.unwrap();
    assert_eq!(0, count_unread(&db, bob.id).await.unwrap());
    assert!(inbox(&db, bob.id).await.unwrap()[0].is_read);
}

#[actix_rt::test]
async fn test_delete_hides_message_from_one_side_only() {
    let db = setup_test_database().await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();
    let bob = create_test_user(&db, "bob", "password123").await.unwrap();
    let mallory = create_test_user(&db, "mallory", "password123").await.unwrap();
    let message = send_message(&db, alice.id, "bob", "Hi", "Hello").await.unwrap();

    assert!(!delete_for_user(&db, message.id, mallory.id).await.unwrap());
    assert!(delete_for_user(&db, message.id, bob.id).await.unwrap());

    assert!(inbox(&db, bob.id).await.unwrap().is_empty());
    assert_eq!(0, count_unread(&db, bob.id).await.unwrap());
    assert!(get_message(&db, message.id, bob.id).await.unwrap().is_none());

    // The sender still has their copy.
    assert_eq!(1, sent(&db, alice.id).await.unwrap().len());
    let view = get_message(&db, message.id, alice.id).await.unwrap().unwrap();
    assert!(view.deleted_for(bob.id));
    assert!(!view.deleted_for(alice.id));

    assert!(delete_for_user(&db, message.id, alice.id).await.unwrap());
    assert!(sent(&db, alice.id).await.unwrap().is_empty());
    // Rows are soft-deleted, never removed.
    assert_eq!(1, count_rows(&db, "private_messages").await.unwrap());
}
