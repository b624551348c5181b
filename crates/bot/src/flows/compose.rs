//! Admin message composition: recipients, subject, body, optional test or file, preview.

use super::{mail, Outcome, Turn};
use crate::desk::Desk;
use workdesk_mailbox::OutgoingMail;
use workdesk_protocol::{
    Action, Audience, Button, DeskError, EventKind, Permission, Result, Role, RoleFilter, Screen,
};
use workdesk_session::{MailDraft, State, Step, TokenTarget};

pub(crate) async fn start(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Admin)?;
    turn.session.scratch.mail_draft = None;
    let screen = Screen::new("Who should receive the message?")
        .button(Button::action("A role group", Action::ComposeGroup))
        .button(Button::action("One user", Action::ComposeOne))
        .button(Button::action("Back", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeKind))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    turn.require(Permission::Admin)?;
    if let EventKind::Action(Action::MailMain) = input {
        return mail::show_menu(desk, turn).await;
    }
    match (state, input) {
        (State::ComposeKind, EventKind::Action(Action::ComposeGroup)) => pick_group(desk, turn).await,
        (State::ComposeKind, EventKind::Action(Action::ComposeOne)) => pick_user(desk, turn).await,
        (State::ComposeRecipient, EventKind::Action(Action::MailCompose)) => start(desk, turn).await,
        (State::ComposeRecipient, EventKind::Action(Action::ComposeRole(filter))) => {
            begin_draft(desk, turn, filter.audience()).await
        }
        (State::ComposeRecipient, EventKind::Action(Action::ComposeUser(token))) => {
            let TokenTarget::User(user) = turn.session.resolve(token)? else {
                return Err(DeskError::not_found("user"));
            };
            begin_draft(desk, turn, Audience::User(user)).await
        }
        (State::ComposeSubject, EventKind::Text(text)) => set_subject(desk, turn, text).await,
        (State::ComposeBody, EventKind::Text(text)) => set_body(desk, turn, text).await,
        (State::ComposeAttachment, EventKind::Upload(upload)) => {
            let reference = desk.store_attachment(upload)?;
            draft(turn)?.attachment = Some(reference);
            preview(desk, turn).await
        }
        (State::ComposeAttachment, EventKind::Action(Action::ComposeAttachTest)) => {
            pick_test(desk, turn).await
        }
        (State::ComposeAttachment, EventKind::Action(Action::ComposeSkip)) => {
            preview(desk, turn).await
        }
        (State::ComposeTest, EventKind::Action(Action::ComposePickTest(token))) => {
            let TokenTarget::Test(id) = turn.session.resolve(token)? else {
                return Err(DeskError::not_found("test"));
            };
            let test = desk.tests.get(id)?;
            draft(turn)?.test_id = Some(test.id);
            preview(desk, turn).await
        }
        (State::ComposeTest, EventKind::Action(Action::ComposeBack)) => {
            attachment_prompt(desk, turn).await
        }
        (State::ComposePreview, EventKind::Action(Action::ComposeSend)) => send(desk, turn).await,
        _ => Ok(Step::Stay),
    }
}

fn draft<'s>(turn: &'s mut Turn<'_>) -> Result<&'s mut MailDraft> {
    turn.session
        .scratch
        .mail_draft
        .as_mut()
        .ok_or_else(|| DeskError::not_found("message draft; start composing again"))
}

async fn pick_group(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let mut screen = Screen::new("Choose the recipient group:")
        .button(Button::action("Everyone", Action::ComposeRole(RoleFilter::All)));
    for pair in Role::ALL.chunks(2) {
        screen = screen.row(
            pair.iter()
                .map(|role| Button::action(role.as_str(), Action::ComposeRole(RoleFilter::Only(*role))))
                .collect(),
        );
    }
    let screen = screen.button(Button::action("Back", Action::MailCompose));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeRecipient))
}

async fn pick_user(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let users = desk.users.list();
    turn.session.tokens.reset();
    let mut screen = Screen::new(if users.is_empty() {
        "No registered users yet."
    } else {
        "Choose the recipient:"
    });
    for user in &users {
        let token = turn.session.issue(TokenTarget::User(user.id))?;
        let role = user.role.map_or("no role", Role::as_str);
        screen.push(Button::action(
            format!("{} ({role})", user.label()),
            Action::ComposeUser(token),
        ));
    }
    let screen = screen.button(Button::action("Back", Action::MailCompose));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeRecipient))
}

async fn begin_draft(desk: &Desk, turn: &mut Turn<'_>, audience: Audience) -> Outcome {
    let recipients = desk.mailbox.recipients(&audience).len();
    turn.session.scratch.mail_draft = Some(MailDraft::new(audience));
    let screen = Screen::new(format!(
        "Recipients: {} ({recipients})\nEnter the subject:",
        audience_label(desk, &audience)
    ))
    .button(Button::action("Cancel", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeSubject))
}

async fn set_subject(desk: &Desk, turn: &mut Turn<'_>, text: &str) -> Outcome {
    let subject = text.trim();
    if subject.is_empty() {
        return Err(DeskError::invalid("the subject must not be empty"));
    }
    draft(turn)?.subject = Some(subject.to_string());
    let screen = Screen::new("Enter the message text:")
        .button(Button::action("Cancel", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeBody))
}

async fn set_body(desk: &Desk, turn: &mut Turn<'_>, text: &str) -> Outcome {
    draft(turn)?.body = Some(text.to_string());
    attachment_prompt(desk, turn).await
}

async fn attachment_prompt(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let screen = Screen::new(
        "Attach a test, or send a document or photo to attach it to the message.",
    )
    .button(Button::action("Attach a test", Action::ComposeAttachTest))
    .button(Button::action("Skip", Action::ComposeSkip))
    .button(Button::action("Cancel", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeAttachment))
}

async fn pick_test(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let tests = desk.tests.list();
    turn.session.tokens.reset();
    let mut screen = Screen::new(if tests.is_empty() {
        "There are no tests yet."
    } else {
        "Choose the test to attach:"
    });
    for test in &tests {
        let token = turn.session.issue(TokenTarget::Test(test.id))?;
        screen.push(Button::action(test.header.clone(), Action::ComposePickTest(token)));
    }
    let screen = screen.button(Button::action("Back", Action::ComposeBack));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposeTest))
}

async fn preview(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let draft = draft(turn)?.clone();
    let mut text = format!(
        "To: {}\nSubject: {}\n\n{}",
        audience_label(desk, &draft.audience),
        draft.subject.as_deref().unwrap_or_default(),
        draft.body.as_deref().unwrap_or_default()
    );
    if let Some(test_id) = draft.test_id {
        let header = desk
            .tests
            .get(test_id)
            .map_or_else(|_| format!("#{test_id}"), |t| t.header);
        text.push_str(&format!("\n\nTest: {header}"));
    }
    if draft.attachment.is_some() {
        text.push_str("\nA file is attached.");
    }
    let screen = Screen::new(text)
        .button(Button::action("Send", Action::ComposeSend))
        .button(Button::action("Cancel", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::ComposePreview))
}

async fn send(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let draft = draft(turn)?.clone();
    let subject = draft
        .subject
        .ok_or_else(|| DeskError::invalid("the subject is missing"))?;
    let mail = OutgoingMail::new(subject, draft.body.unwrap_or_default())
        .with_test(draft.test_id)
        .with_attachment(draft.attachment);
    let sent = desk.mailbox.send_to_audience(&draft.audience, &mail).await?;
    log::info!(
        "user {} sent '{}' to {} recipients",
        turn.chat(),
        mail.subject,
        sent.len()
    );
    desk.say(turn.chat(), &format!("Message sent to {} recipients.", sent.len()))
        .await?;
    turn.edit_menu = false;
    mail::show_menu(desk, turn).await
}

fn audience_label(desk: &Desk, audience: &Audience) -> String {
    match audience {
        Audience::Everyone => "everyone".to_string(),
        Audience::Role(role) => format!("role {role}"),
        Audience::User(id) => desk
            .users
            .get(*id)
            .map_or_else(|| format!("user {id}"), |u| u.label()),
    }
}
