//! Admin console: users, broadcast, soft restart, test results and the file manager.

use super::{files, Outcome, Turn};
use crate::desk::Desk;
use crate::screens;
use workdesk_mailbox::OutgoingMail;
use workdesk_protocol::{
    Action, Audience, Button, DeskError, EventKind, Permission, Role, Screen, UserId,
};
use workdesk_session::{Conversation, State, Step};

const BROADCAST_SUBJECT: &str = "Broadcast";

pub(crate) async fn enter(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Admin)?;
    turn.session.begin(Conversation::Admin);
    turn.session.browse = None;
    show_menu(desk, turn).await
}

pub(crate) async fn show_menu(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let mut screen = Screen::new("Admin panel")
        .row(vec![
            Button::action("Users", Action::AdminUsers),
            Button::action("Broadcast", Action::AdminBroadcast),
        ])
        .row(vec![
            Button::action("File manager", Action::AdminFiles),
            Button::action("Test results", Action::AdminResults),
        ]);
    if can_restart(desk, turn) {
        screen.push(Button::action("Restart sessions", Action::AdminRestart));
    }
    let screen = screen.button(Button::action("Main menu", Action::AdminExit));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::AdminMenu))
}

/// Only the administrator role and the developer may drop everyone's sessions.
fn can_restart(desk: &Desk, turn: &Turn<'_>) -> bool {
    turn.role() == Some(Role::Administrator)
        || desk.gate.is_developer(turn.sender.handle.as_deref())
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    turn.require(Permission::Admin)?;
    match state {
        State::FileManager
        | State::UploadCollecting
        | State::UploadAskTest
        | State::UploadChooseTest => return files::handle(desk, turn, state, input).await,
        State::AdminBroadcast => return broadcast(desk, turn, input).await,
        _ => {}
    }

    let EventKind::Action(action) = input else {
        return Ok(Step::Stay);
    };
    match action {
        Action::AdminPanel => show_menu(desk, turn).await,
        Action::AdminUsers => show_users(desk, turn).await,
        Action::AdminReset(user) => reset_user(desk, turn, *user).await,
        Action::AdminBroadcast => {
            let screen = Screen::new("Send the broadcast text. Every registered user receives it.")
                .button(Button::action("Cancel", Action::AdminPanel));
            desk.show(turn, &screen).await?;
            Ok(Step::Goto(State::AdminBroadcast))
        }
        Action::AdminFiles => files::open_manager(desk, turn).await,
        Action::AdminResults => show_results(desk, turn).await,
        Action::AdminRestart => restart(desk, turn).await,
        Action::AdminExit => {
            desk.show(turn, &screens::main_menu(turn.permission)).await?;
            Ok(Step::Finish)
        }
        _ => Ok(Step::Stay),
    }
}

async fn show_users(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let users = desk.users.list();
    let mut screen = Screen::new(if users.is_empty() {
        "No registered users.".to_string()
    } else {
        format!("Registered users ({}). Press a user to reset their registration.", users.len())
    });
    for user in &users {
        let role = user.role.map_or("no role", Role::as_str);
        screen.push(Button::action(
            format!("{} - {role}", user.label()),
            Action::AdminReset(user.id),
        ));
    }
    let screen = screen.button(Button::action("Back", Action::AdminPanel));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

async fn reset_user(desk: &Desk, turn: &mut Turn<'_>, user: UserId) -> Outcome {
    if user == turn.chat() {
        return Err(DeskError::invalid("you cannot reset your own registration"));
    }
    let removed = desk.users.remove(user)?;
    desk.sessions.drop_session(user).await;
    desk.alert(turn.chat(), &format!("{} was reset.", removed.label()))
        .await?;
    show_users(desk, turn).await
}

async fn broadcast(desk: &Desk, turn: &mut Turn<'_>, input: &EventKind) -> Outcome {
    match input {
        EventKind::Text(text) => {
            let body = text.trim();
            if body.is_empty() {
                return Err(DeskError::invalid("the broadcast text must not be empty"));
            }
            let sent = desk
                .mailbox
                .send_to_audience(&Audience::Everyone, &OutgoingMail::new(BROADCAST_SUBJECT, body))
                .await?;
            log::info!("user {} broadcast to {} users", turn.chat(), sent.len());
            desk.say(turn.chat(), &format!("Broadcast sent to {} users.", sent.len()))
                .await?;
            turn.edit_menu = false;
            show_menu(desk, turn).await
        }
        EventKind::Action(Action::AdminPanel) => show_menu(desk, turn).await,
        _ => Ok(Step::Stay),
    }
}

async fn show_results(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let results = desk.tests.results();
    let mut text = if results.is_empty() {
        "No test results recorded.".to_string()
    } else {
        format!("Test results ({}):", results.len())
    };
    for result in &results {
        let who = result
            .handle
            .as_ref()
            .map_or_else(|| result.user_id.to_string(), |h| format!("@{h}"));
        text.push_str(&format!("\n{who}: {}/{}", result.score, result.total));
    }
    let screen = Screen::new(text).button(Button::action("Back", Action::AdminPanel));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

/// Soft restart: forgets every other session so everyone starts from a clean state.
async fn restart(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    if !can_restart(desk, turn) {
        return Err(DeskError::PermissionDenied);
    }
    let dropped = desk.sessions.clear_except(Some(turn.chat())).await;
    log::warn!("user {} restarted sessions, {dropped} dropped", turn.chat());
    desk.say(turn.chat(), &format!("Sessions restarted ({dropped} dropped)."))
        .await?;
    turn.edit_menu = false;
    desk.show(turn, &screens::main_menu(turn.permission)).await?;
    Ok(Step::Finish)
}
