mod common;

use common::{user, Harness, DEVELOPER};
use pretty_assertions::assert_eq;
use workdesk_protocol::{Command, Role};
use workdesk_session::State;

#[tokio::test]
async fn compose_to_one_user_with_attachment() {
    let h = Harness::new();
    let admin = user(1, "boss");
    let dana = user(2, "dana");
    h.enroll(&admin, Role::Administrator);
    h.enroll(&dana, Role::Driver);

    h.command(&admin, Command::Mail).await;
    h.press(&admin, "Send message").await;
    h.press(&admin, "One user").await;
    h.press(&admin, "@dana (Driver)").await;
    h.text(&admin, "   ").await;
    assert!(h.last_text(1).contains("must not be empty"));
    h.text(&admin, "Shift").await;
    h.text(&admin, "Bring gloves").await;
    h.upload(&admin, "gloves.pdf", b"gloves").await;
    assert!(h.last_text(1).contains("A file is attached."));
    h.press(&admin, "Send").await;
    assert!(h.saw_text(1, "Message sent to 1 recipients."));
    assert_eq!(h.desk.sessions().checkout(1).await.lock().await.state(), State::MailMenu);

    let unread = h.desk.mailbox().list_unread(2);
    assert_eq!(unread.len(), 1);
    let reference = unread[0].attachment.clone().expect("attachment stored");
    assert!(reference.starts_with("attachments/"));

    h.command(&dana, Command::Mail).await;
    h.press(&dana, "Unread (1)").await;
    h.press(&dana, "Shift").await;
    assert!(h.last_text(2).contains("Bring gloves"));
    assert_eq!(h.documents(2).len(), 1);
    assert!(h.documents(2)[0].ends_with(&reference));
}

#[tokio::test]
async fn members_cannot_open_admin_surfaces() {
    let h = Harness::new();
    let dana = user(2, "dana");
    h.enroll(&dana, Role::Driver);

    h.command(&dana, Command::Admin).await;
    assert_eq!(h.last_text(2), "You do not have permission for this action.");
    h.command(&dana, Command::Mail).await;
    let menu = h.screens(2).last().cloned().unwrap();
    assert!(menu.find_action("Send message").is_none());
    assert!(menu.find_action("All messages").is_none());
}

#[tokio::test]
async fn broadcast_reaches_everyone_and_audit_can_delete() {
    let h = Harness::new();
    let admin = user(1, "boss");
    h.enroll(&admin, Role::Administrator);
    h.enroll(&user(2, "dana"), Role::Driver);
    h.enroll(&user(3, "acc"), Role::Accountant);

    h.command(&admin, Command::Admin).await;
    h.press(&admin, "Broadcast").await;
    h.text(&admin, "Office closed on Friday").await;
    assert!(h.saw_text(1, "Broadcast sent to 3 users."));
    for id in [1, 2, 3] {
        let unread = h.desk.mailbox().list_unread(id);
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].subject, "Broadcast");
    }

    h.command(&admin, Command::Mail).await;
    h.press(&admin, "All messages").await;
    h.press(&admin, "Driver (1)").await;
    let message = h.desk.mailbox().list_unread(2).remove(0);
    h.press(
        &admin,
        &format!("#{} @dana - Broadcast (unread)", message.id),
    )
    .await;
    assert!(h.last_text(1).contains("Status: unread"));
    h.press(&admin, "Delete").await;
    assert!(h.desk.mailbox().list_unread(2).is_empty());
    assert!(h.last_text(1).starts_with("Messages for role Driver (0)"));
}

#[tokio::test]
async fn reset_moves_mail_to_no_role_bucket() {
    let h = Harness::new();
    let admin = user(1, "boss");
    h.enroll(&admin, Role::Administrator);
    h.enroll(&user(2, "dana"), Role::Driver);

    h.command(&admin, Command::Admin).await;
    h.press(&admin, "Broadcast").await;
    h.text(&admin, "hello").await;
    h.press(&admin, "Users").await;
    h.press(&admin, "@dana - Driver").await;
    assert!(h.desk.users().get(2).is_none());
    assert_eq!(h.alerts(1), vec!["@dana was reset.".to_string()]);

    h.press(&admin, "@boss - Administrator").await;
    assert!(h.desk.users().get(1).is_some());
    assert!(h.last_text(1).contains("cannot reset your own registration"));

    let groups = h.desk.mailbox().group_by_role();
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn restart_drops_other_sessions() {
    let h = Harness::new();
    let admin = user(1, "boss");
    let dana = user(2, "dana");
    h.enroll(&admin, Role::Administrator);
    h.enroll(&dana, Role::Driver);

    h.command(&dana, Command::Search).await;
    h.command(&admin, Command::Admin).await;
    assert_eq!(h.desk.sessions().len().await, 2);

    h.press(&admin, "Restart sessions").await;
    assert!(h.saw_text(1, "Sessions restarted (1 dropped)."));
    assert_eq!(h.desk.sessions().len().await, 1);
    assert_eq!(
        h.desk.sessions().checkout(2).await.lock().await.state(),
        State::Idle
    );
}

#[tokio::test]
async fn assistant_director_cannot_restart() {
    let h = Harness::new();
    let deputy = user(7, "deputy");
    h.enroll(&deputy, Role::AssistantDirector);

    h.command(&deputy, Command::Admin).await;
    let panel = h.screens(7).last().cloned().unwrap();
    assert_eq!(panel.text, "Admin panel");
    assert!(panel.find_action("Restart sessions").is_none());
}

#[tokio::test]
async fn startup_is_announced_to_the_operator() {
    let h = Harness::new();
    h.enroll(&user(5, DEVELOPER), Role::Driver);
    h.desk.announce_startup().await;
    assert_eq!(h.last_text(5), "Workdesk started.");
}

#[tokio::test]
async fn upload_with_test_links_the_test_for_the_role() {
    let h = Harness::new();
    let admin = user(1, "boss");
    h.enroll(&admin, Role::Administrator);
    h.enroll(&user(2, "dana"), Role::Driver);
    let (test, _) = h
        .desk
        .tests()
        .create(workdesk_mailbox::NewTest {
            header: "Cargo rules".into(),
            link: "https://forms.example/cargo".into(),
            scope: workdesk_protocol::TestScope::Unassigned,
            creator: Some(1),
            attachment: None,
        })
        .await
        .unwrap();

    h.command(&admin, Command::Admin).await;
    h.press(&admin, "File manager").await;
    h.press(&admin, "Driver/").await;
    h.press(&admin, "Upload files here").await;
    h.upload(&admin, "cargo.pdf", b"cargo").await;
    h.text(&admin, "готово").await;
    h.press(&admin, "Yes").await;
    h.press(&admin, "Cargo rules").await;

    let unread = h.desk.mailbox().list_unread(2);
    assert_eq!(unread.len(), 2);
    assert_eq!(unread[0].test_id, Some(test.id));
    assert_eq!(unread[1].test_id, None);
    assert_eq!(
        h.desk.sessions().checkout(1).await.lock().await.state(),
        State::FileManager
    );
}
