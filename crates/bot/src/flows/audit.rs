use super::{mail, Outcome, Turn};
use crate::desk::Desk;
use workdesk_mailbox::Message;
use workdesk_protocol::{Action, Button, DeskError, EventKind, Permission, RoleBucket, Screen};
use workdesk_session::{State, Step};

/// All messages grouped by the recipient's role.
pub(crate) async fn show_roles(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Admin)?;
    turn.session.scratch.audit_bucket = None;
    let groups = desk.mailbox.group_by_role();
    let mut screen = Screen::new(if groups.is_empty() {
        "No messages yet."
    } else {
        "All messages by recipient role:"
    });
    for (bucket, messages) in &groups {
        screen.push(Button::action(
            format!("{} ({})", bucket.label(), messages.len()),
            Action::AuditBucket(*bucket),
        ));
    }
    let screen = screen.button(Button::action("Back", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::AuditRoles))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, input: &EventKind) -> Outcome {
    turn.require(Permission::Admin)?;
    let EventKind::Action(action) = input else {
        return Ok(Step::Stay);
    };
    match action {
        Action::MailMain => mail::show_menu(desk, turn).await,
        Action::MailAll | Action::AuditBack => show_roles(desk, turn).await,
        Action::AuditBucket(bucket) => {
            turn.session.scratch.audit_bucket = Some(*bucket);
            show_bucket(desk, turn).await
        }
        Action::AuditRefresh => show_bucket(desk, turn).await,
        Action::AuditView(id) => {
            let message = desk.mailbox.get(*id)?;
            let screen = Screen::new(detail_text(desk, &message))
                .button(Button::action("Delete", Action::AuditDelete(message.id)))
                .button(Button::action("Back", Action::AuditRefresh));
            desk.show(turn, &screen).await?;
            Ok(Step::Stay)
        }
        Action::AuditDelete(id) => {
            let removed = desk.mailbox.delete(*id)?;
            log::info!("user {} deleted message {}", turn.chat(), removed.id);
            desk.alert(turn.chat(), &format!("Message #{} deleted.", removed.id))
                .await?;
            show_bucket(desk, turn).await
        }
        _ => Ok(Step::Stay),
    }
}

async fn show_bucket(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let bucket = turn
        .session
        .scratch
        .audit_bucket
        .ok_or_else(|| DeskError::not_found("role group; open the list again"))?;
    let messages = desk
        .mailbox
        .group_by_role()
        .remove(&bucket)
        .unwrap_or_default();
    let mut screen = Screen::new(format!(
        "Messages for {} ({}):",
        bucket_title(bucket),
        messages.len()
    ));
    for message in &messages {
        screen.push(Button::action(
            format!(
                "#{} {} - {}{}",
                message.id,
                recipient_label(desk, message),
                message.subject,
                if message.is_unread() { " (unread)" } else { "" }
            ),
            Action::AuditView(message.id),
        ));
    }
    let screen = screen
        .row(vec![
            Button::action("Refresh", Action::AuditRefresh),
            Button::action("Back", Action::AuditBack),
        ])
        .button(Button::action("Mail menu", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::AuditList))
}

fn bucket_title(bucket: RoleBucket) -> String {
    match bucket {
        RoleBucket::Role(role) => format!("role {role}"),
        RoleBucket::NoRole => "users without a role".to_string(),
    }
}

fn recipient_label(desk: &Desk, message: &Message) -> String {
    desk.users
        .get(message.recipient)
        .map_or_else(|| format!("user {}", message.recipient), |u| u.label())
}

fn detail_text(desk: &Desk, message: &Message) -> String {
    let mut text = format!(
        "Message #{}\nTo: {}\nStatus: {}\nSubject: {}",
        message.id,
        recipient_label(desk, message),
        if message.is_unread() { "unread" } else { "read" },
        message.subject
    );
    if !message.body.trim().is_empty() {
        text.push_str(&format!("\n\n{}", message.body));
    }
    if let Some(test_id) = message.test_id {
        let test = desk
            .tests
            .get(test_id)
            .map_or_else(|_| format!("#{test_id} (deleted)"), |t| t.header);
        text.push_str(&format!("\nTest: {test}"));
    }
    if message.attachment.is_some() {
        text.push_str("\nHas an attachment.");
    }
    text
}
