use super::{Outcome, Turn};
use crate::desk::Desk;
use crate::screens;
use workdesk_protocol::{EventKind, Role};
use workdesk_session::{Conversation, State, Step};

/// `/start`: registered users land on the main menu, everyone else picks a role.
pub(crate) async fn start(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    if turn.role().is_some() {
        desk.show(turn, &screens::main_menu(turn.permission)).await?;
        return Ok(Step::Finish);
    }
    turn.session.begin(Conversation::Registration);
    turn.session.menu = None;
    desk.show(turn, &screens::role_picker("Welcome! Choose your role:"))
        .await?;
    Ok(Step::Goto(State::RegistrationRole))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    let EventKind::Text(text) = input else {
        return Ok(Step::Stay);
    };
    match state {
        State::RegistrationRole => choose_role(desk, turn, text).await,
        State::RegistrationSecret => check_secret(desk, turn, text).await,
        _ => Ok(Step::Stay),
    }
}

async fn choose_role(desk: &Desk, turn: &mut Turn<'_>, text: &str) -> Outcome {
    let Some(role) = Role::from_name(text) else {
        desk.show(turn, &screens::role_picker("Unknown role. Choose one of the list:"))
            .await?;
        return Ok(Step::Stay);
    };
    turn.session.scratch.registration_role = Some(role);
    desk.say(turn.chat(), &format!("Enter the secret code for the role {role}:"))
        .await?;
    Ok(Step::Goto(State::RegistrationSecret))
}

async fn check_secret(desk: &Desk, turn: &mut Turn<'_>, text: &str) -> Outcome {
    let Some(role) = turn.session.scratch.registration_role else {
        desk.show(turn, &screens::role_picker("Choose your role:")).await?;
        return Ok(Step::Goto(State::RegistrationRole));
    };
    if !desk.secrets.verify(role, text) {
        log::info!("user {}: wrong secret for {role}", turn.chat());
        desk.say(turn.chat(), "Wrong secret code. Try again:").await?;
        return Ok(Step::Stay);
    }

    let record = desk.users.register(
        turn.chat(),
        &turn.sender.display_name,
        turn.sender.handle.as_deref(),
        role,
    )?;
    turn.permission = desk
        .gate
        .permission(record.role, turn.sender.handle.as_deref());
    turn.user = Some(record);

    desk.say(turn.chat(), &format!("Registration complete. Your role: {role}."))
        .await?;
    turn.edit_menu = false;
    desk.show(turn, &screens::main_menu(turn.permission)).await?;
    Ok(Step::Finish)
}
