//! Top-level dispatcher: routes each update to the active conversation or the global menu
//! and turns user-facing errors into notices.

use crate::desk::Desk;
use crate::flows::{
    admin, browse, mail, registration, search, Outcome, Turn,
};
use crate::screens;
use workdesk_protocol::{Action, Command, DeskError, Event, EventKind, Permission, Result};
use workdesk_session::{
    route, route_command, Conversation, Route, SessionContext, State, Step, Trigger,
};

pub(crate) async fn dispatch(desk: &Desk, session: &mut SessionContext, event: &Event) -> Result<()> {
    let user = desk.users.get(event.sender.id);
    let permission = desk.gate.permission(
        user.as_ref().and_then(|u| u.role),
        event.sender.handle.as_deref(),
    );
    let state = session.state();
    let mut turn = Turn {
        sender: &event.sender,
        user,
        permission,
        session,
        edit_menu: matches!(event.kind, EventKind::Action(_)),
    };

    let destination = match &event.kind {
        EventKind::Command(command) => route_command(state, *command),
        EventKind::Text(text) => route(state, &Trigger::Text(text)),
        EventKind::Action(action) => route(state, &Trigger::Action(action)),
        EventKind::Upload(_) => route(state, &Trigger::Upload),
    };
    log::debug!(
        "user {} in {:?}: {} -> {:?}",
        turn.chat(),
        state,
        event.describe(),
        destination
    );

    let outcome = match destination {
        Route::Handle(state) => handle(desk, &mut turn, state, &event.kind).await,
        Route::Global => match &event.kind {
            EventKind::Command(command) => command_entry(desk, &mut turn, *command).await,
            EventKind::Action(action) => menu_entry(desk, &mut turn, action).await,
            _ => unrecognized(desk, &turn).await,
        },
        Route::Blocked(conversation) => blocked(desk, &turn, conversation).await,
        Route::Unrecognized => unrecognized(desk, &turn).await,
    };
    settle(desk, &mut turn, outcome).await
}

async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    match state.conversation() {
        Some(Conversation::Registration) => registration::handle(desk, turn, state, input).await,
        Some(Conversation::Browse) => browse::handle(desk, turn, input).await,
        Some(Conversation::Mail) => mail::handle(desk, turn, state, input).await,
        Some(Conversation::Search) => search::handle(desk, turn, input).await,
        Some(Conversation::Admin) => admin::handle(desk, turn, state, input).await,
        None => unrecognized(desk, turn).await,
    }
}

async fn command_entry(desk: &Desk, turn: &mut Turn<'_>, command: Command) -> Outcome {
    match command {
        Command::Start => registration::start(desk, turn).await,
        Command::Help => {
            desk.say(turn.chat(), &screens::help(turn.permission)).await?;
            Ok(Step::Stay)
        }
        Command::Mail => mail::enter(desk, turn).await,
        Command::Search => search::start(desk, turn).await,
        Command::Admin => admin::enter(desk, turn).await,
    }
}

async fn menu_entry(desk: &Desk, turn: &mut Turn<'_>, action: &Action) -> Outcome {
    match action {
        Action::MainMenu => {
            turn.require(Permission::Member)?;
            desk.show(turn, &screens::main_menu(turn.permission)).await?;
            Ok(Step::Finish)
        }
        Action::FilesShared => browse::open_shared(desk, turn).await,
        Action::FilesRole => browse::open_role(desk, turn).await,
        Action::SearchStart => search::start(desk, turn).await,
        Action::MailMain => mail::enter(desk, turn).await,
        Action::AdminPanel => admin::enter(desk, turn).await,
        _ => unrecognized(desk, turn).await,
    }
}

async fn blocked(desk: &Desk, turn: &Turn<'_>, conversation: Conversation) -> Outcome {
    log::debug!("user {}: blocked by active {}", turn.chat(), conversation.as_str());
    notice(desk, turn, screens::FINISH_SEARCH_FIRST).await?;
    Ok(Step::Stay)
}

async fn unrecognized(desk: &Desk, turn: &Turn<'_>) -> Outcome {
    desk.say(turn.chat(), screens::UNRECOGNIZED).await?;
    Ok(Step::Stay)
}

/// Button presses get a popup; typed input gets a message.
async fn notice(desk: &Desk, turn: &Turn<'_>, text: &str) -> Result<()> {
    if turn.edit_menu {
        desk.alert(turn.chat(), text).await
    } else {
        desk.say(turn.chat(), text).await
    }
}

/// Applies the step, or renders a user-facing error and leaves the state unchanged.
async fn settle(desk: &Desk, turn: &mut Turn<'_>, outcome: Outcome) -> Result<()> {
    let err = match outcome {
        Ok(step) => {
            turn.session.apply(step);
            return Ok(());
        }
        Err(err) if err.is_user_facing() => err,
        Err(err) => return Err(err),
    };
    log::debug!("user {}: {err}", turn.chat());
    match err {
        DeskError::PermissionDenied if turn.permission == Permission::Guest => {
            desk.say(turn.chat(), screens::NOT_REGISTERED).await
        }
        DeskError::PermissionDenied => notice(desk, turn, screens::NO_PERMISSION).await,
        DeskError::NotFound(what) => notice(desk, turn, &format!("Not found: {what}")).await,
        DeskError::InvalidInput(message) => {
            desk.say(turn.chat(), &screens::sentence(&message)).await
        }
        other => Err(other),
    }
}
