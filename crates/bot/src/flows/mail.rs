//! Mailbox: menu, unread and read views, acknowledgement with linked tests. Composition,
//! tests and the audit view live in sibling modules but share this conversation.

use super::{audit, compose, test_links, Outcome, Turn};
use crate::desk::Desk;
use crate::screens;
use workdesk_mailbox::{Acknowledgement, Message};
use workdesk_protocol::{Action, Button, EventKind, Permission, Screen};
use workdesk_session::{Conversation, State, Step};

pub(crate) async fn enter(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Member)?;
    turn.session.begin(Conversation::Mail);
    show_menu(desk, turn).await
}

pub(crate) async fn show_menu(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.session.scratch = Default::default();
    let unread = desk.mailbox.list_unread(turn.chat()).len();
    let mut screen = Screen::new(format!("Mail\nUnread messages: {unread}"))
        .row(vec![
            Button::action(format!("Unread ({unread})"), Action::MailUnread),
            Button::action("Read", Action::MailRead),
        ])
        .button(Button::action("Tests", Action::MailTests));
    if turn.is_admin() {
        screen = screen.row(vec![
            Button::action("Send message", Action::MailCompose),
            Button::action("All messages", Action::MailAll),
        ]);
    }
    let screen = screen.button(Button::action("Main menu", Action::MailExit));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::MailMenu))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    match state {
        State::MailMenu => {}
        State::ComposeKind
        | State::ComposeRecipient
        | State::ComposeSubject
        | State::ComposeBody
        | State::ComposeAttachment
        | State::ComposeTest
        | State::ComposePreview => return compose::handle(desk, turn, state, input).await,
        State::TestsMenu
        | State::TestScope
        | State::TestTarget
        | State::TestHeader
        | State::TestLink
        | State::TestConfirm => return test_links::handle(desk, turn, state, input).await,
        State::AuditRoles | State::AuditList => return audit::handle(desk, turn, input).await,
        _ => return Ok(Step::Stay),
    }

    let EventKind::Action(action) = input else {
        return Ok(Step::Stay);
    };
    match action {
        Action::MailMain => show_menu(desk, turn).await,
        Action::MailUnread => show_unread(desk, turn).await,
        Action::MailRead => show_read(desk, turn).await,
        Action::MailOpen(id) => open_unread(desk, turn, *id).await,
        Action::MailAck(id) => acknowledge(desk, turn, *id).await,
        Action::MailView(id) => view_read(desk, turn, *id).await,
        Action::MailCompose => compose::start(desk, turn).await,
        Action::MailAll => audit::show_roles(desk, turn).await,
        Action::MailTests => test_links::show_menu(desk, turn).await,
        Action::MailExit => {
            desk.show(turn, &screens::main_menu(turn.permission)).await?;
            Ok(Step::Finish)
        }
        _ => Ok(Step::Stay),
    }
}

fn message_button(message: &Message, action: Action) -> Button {
    let marker = if message.test_id.is_some() { " [test]" } else { "" };
    Button::action(format!("{}{marker}", message.subject), action)
}

async fn show_unread(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let messages = desk.mailbox.list_unread(turn.chat());
    let mut screen = Screen::new(if messages.is_empty() {
        "No unread messages.".to_string()
    } else {
        format!("Unread messages ({}):", messages.len())
    });
    for message in &messages {
        screen.push(message_button(message, Action::MailOpen(message.id)));
    }
    let screen = screen.button(Button::action("Back", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

async fn show_read(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let messages = desk.mailbox.list_read(turn.chat());
    let mut screen = Screen::new(if messages.is_empty() {
        "No read messages.".to_string()
    } else {
        format!("Read messages ({}):", messages.len())
    });
    for message in &messages {
        screen.push(message_button(message, Action::MailView(message.id)));
    }
    let screen = screen.button(Button::action("Back", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

fn message_text(message: &Message) -> String {
    let mut text = format!("Subject: {}", message.subject);
    if !message.body.trim().is_empty() {
        text.push_str("\n\n");
        text.push_str(&message.body);
    }
    text
}

async fn send_attachment(desk: &Desk, turn: &Turn<'_>, message: &Message) -> Outcome {
    if let Some(reference) = &message.attachment {
        let path = desk.attachment_path(reference)?;
        desk.send_file(turn.chat(), &path, Some(&message.subject))
            .await?;
    }
    Ok(Step::Stay)
}

async fn open_unread(desk: &Desk, turn: &mut Turn<'_>, id: u64) -> Outcome {
    let message = desk.mailbox.get_for(turn.chat(), id)?;
    let mut text = message_text(&message);
    if message.test_id.is_some() {
        text.push_str("\n\nA test is attached. Mark the message as read to get the link.");
    }
    let screen = Screen::new(text)
        .button(Button::action("Mark as read", Action::MailAck(id)))
        .button(Button::action("Back", Action::MailUnread));
    desk.show(turn, &screen).await?;
    send_attachment(desk, turn, &message).await
}

async fn acknowledge(desk: &Desk, turn: &mut Turn<'_>, id: u64) -> Outcome {
    let screen = match desk.mailbox.acknowledge(turn.chat(), id)? {
        Acknowledgement::Read(message) => {
            Screen::new(format!("Message '{}' marked as read.", message.subject))
        }
        Acknowledgement::WithTest { message, test } => Screen::new(format!(
            "Message '{}' marked as read.\nTest: {}",
            message.subject, test.header
        ))
        .button(Button::url("Open test", test.link)),
        Acknowledgement::TestMissing { message, test_id } => {
            log::info!("message {} links deleted test {test_id}", message.id);
            Screen::new(format!(
                "Message '{}' marked as read, but its test no longer exists.",
                message.subject
            ))
        }
    };
    let screen = screen
        .button(Button::action("Unread messages", Action::MailUnread))
        .button(Button::action("Mail menu", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

async fn view_read(desk: &Desk, turn: &mut Turn<'_>, id: u64) -> Outcome {
    let message = desk.mailbox.get_for(turn.chat(), id)?;
    let mut screen = Screen::new(message_text(&message));
    if let Some(test_id) = message.test_id {
        match desk.tests.get(test_id) {
            Ok(test) => screen.push(Button::url(format!("Test: {}", test.header), test.link)),
            Err(_) => screen.text.push_str("\n\nThe linked test no longer exists."),
        }
    }
    let screen = screen.button(Button::action("Back", Action::MailRead));
    desk.show(turn, &screen).await?;
    send_attachment(desk, turn, &message).await
}
