//! Tests menu. Admins see and manage every test; members see the tests linked from
//! their mail.

use super::{mail, Outcome, Turn};
use crate::desk::Desk;
use workdesk_mailbox::{NewTest, Test};
use workdesk_protocol::{
    Action, Button, DeskError, EventKind, Permission, Result, Role, Screen, TestScope,
};
use workdesk_session::{State, Step, TestDraft, TokenTarget};

pub(crate) async fn show_menu(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.session.scratch.test_draft = None;
    let tests = visible_tests(desk, turn);
    let mut screen = Screen::new(if tests.is_empty() {
        "No tests available."
    } else {
        "Tests:"
    });
    for test in &tests {
        screen.push(Button::action(test.header.clone(), Action::TestView(test.id)));
    }
    if turn.is_admin() {
        screen.push(Button::action("Create test", Action::TestCreate));
    }
    let screen = screen.button(Button::action("Back", Action::MailMain));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::TestsMenu))
}

fn visible_tests(desk: &Desk, turn: &Turn<'_>) -> Vec<Test> {
    if turn.is_admin() {
        desk.tests.list()
    } else {
        desk.tests.for_user(turn.chat())
    }
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    match (state, input) {
        (_, EventKind::Action(Action::MailMain)) => mail::show_menu(desk, turn).await,
        (_, EventKind::Action(Action::TestsBack)) => show_menu(desk, turn).await,
        (State::TestsMenu, EventKind::Action(Action::TestView(id))) => view(desk, turn, *id).await,
        (State::TestsMenu, EventKind::Action(Action::TestDelete(id))) => {
            turn.require(Permission::Admin)?;
            let removed = desk.tests.delete(*id)?;
            desk.say(turn.chat(), &format!("Test '{}' deleted.", removed.header))
                .await?;
            show_menu(desk, turn).await
        }
        (State::TestsMenu | State::TestTarget, EventKind::Action(Action::TestCreate)) => {
            choose_scope(desk, turn).await
        }
        (State::TestScope, EventKind::Action(Action::TestScopeRole)) => {
            turn.require(Permission::Admin)?;
            let mut screen = Screen::new("Which role is the test for?");
            for pair in Role::ALL.chunks(2) {
                screen = screen.row(
                    pair.iter()
                        .map(|role| Button::action(role.as_str(), Action::TestRole(*role)))
                        .collect(),
                );
            }
            let screen = screen.button(Button::action("Back", Action::TestCreate));
            desk.show(turn, &screen).await?;
            Ok(Step::Goto(State::TestTarget))
        }
        (State::TestScope, EventKind::Action(Action::TestScopeUser)) => {
            turn.require(Permission::Admin)?;
            let users = desk.users.list();
            turn.session.tokens.reset();
            let mut screen = Screen::new("Which user is the test for?");
            for user in &users {
                let token = turn.session.issue(TokenTarget::User(user.id))?;
                screen.push(Button::action(user.label(), Action::TestUser(token)));
            }
            let screen = screen.button(Button::action("Back", Action::TestCreate));
            desk.show(turn, &screen).await?;
            Ok(Step::Goto(State::TestTarget))
        }
        (State::TestScope, EventKind::Action(Action::TestScopeNone)) => {
            ask_header(desk, turn, TestScope::Unassigned).await
        }
        (State::TestTarget, EventKind::Action(Action::TestRole(role))) => {
            ask_header(desk, turn, TestScope::Role(*role)).await
        }
        (State::TestTarget, EventKind::Action(Action::TestUser(token))) => {
            let TokenTarget::User(user) = turn.session.resolve(token)? else {
                return Err(DeskError::not_found("user"));
            };
            ask_header(desk, turn, TestScope::User(user)).await
        }
        (State::TestHeader, EventKind::Text(text)) => {
            let header = text.trim();
            if header.is_empty() {
                return Err(DeskError::invalid("the test needs a title"));
            }
            draft(turn)?.header = Some(header.to_string());
            let screen = Screen::new("Send the test link (http:// or https://):")
                .button(Button::action("Cancel", Action::TestsBack));
            desk.show(turn, &screen).await?;
            Ok(Step::Goto(State::TestLink))
        }
        (State::TestLink, EventKind::Text(text)) => {
            let link = workdesk_mailbox::validate_link(text)?;
            draft(turn)?.link = Some(link);
            confirm(desk, turn).await
        }
        (State::TestConfirm, EventKind::Action(Action::TestConfirm)) => create(desk, turn).await,
        (State::TestConfirm, EventKind::Action(Action::TestCancel)) => {
            desk.say(turn.chat(), "Test creation cancelled.").await?;
            turn.edit_menu = false;
            show_menu(desk, turn).await
        }
        _ => Ok(Step::Stay),
    }
}

fn draft<'s>(turn: &'s mut Turn<'_>) -> Result<&'s mut TestDraft> {
    turn.session
        .scratch
        .test_draft
        .as_mut()
        .ok_or_else(|| DeskError::not_found("test draft; start again"))
}

async fn view(desk: &Desk, turn: &mut Turn<'_>, id: u64) -> Outcome {
    let test = visible_tests(desk, turn)
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| DeskError::not_found(format!("test #{id}")))?;
    let mut screen = Screen::new(format!(
        "{}\nAssigned to: {}",
        test.header,
        scope_label(desk, &test.scope)
    ))
    .button(Button::url("Open test", test.link.clone()));
    if turn.is_admin() {
        screen.push(Button::action("Delete test", Action::TestDelete(test.id)));
    }
    let screen = screen.button(Button::action("Back", Action::TestsBack));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

async fn choose_scope(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Admin)?;
    turn.session.scratch.test_draft = Some(TestDraft::default());
    let screen = Screen::new("Who is the test for?")
        .button(Button::action("A role", Action::TestScopeRole))
        .button(Button::action("One user", Action::TestScopeUser))
        .button(Button::action("Nobody yet (store only)", Action::TestScopeNone))
        .button(Button::action("Back", Action::TestsBack));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::TestScope))
}

async fn ask_header(desk: &Desk, turn: &mut Turn<'_>, scope: TestScope) -> Outcome {
    turn.require(Permission::Admin)?;
    draft(turn)?.scope = Some(scope);
    let screen = Screen::new("Enter the test title:")
        .button(Button::action("Cancel", Action::TestsBack));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::TestHeader))
}

async fn confirm(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let draft = draft(turn)?.clone();
    let scope = draft.scope.unwrap_or(TestScope::Unassigned);
    let screen = Screen::new(format!(
        "Create this test?\nTitle: {}\nLink: {}\nAssigned to: {}",
        draft.header.as_deref().unwrap_or_default(),
        draft.link.as_deref().unwrap_or_default(),
        scope_label(desk, &scope)
    ))
    .row(vec![
        Button::action("Create", Action::TestConfirm),
        Button::action("Cancel", Action::TestCancel),
    ]);
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::TestConfirm))
}

async fn create(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Admin)?;
    let draft = draft(turn)?.clone();
    let new = NewTest {
        header: draft.header.unwrap_or_default(),
        link: draft.link.unwrap_or_default(),
        scope: draft.scope.unwrap_or(TestScope::Unassigned),
        creator: Some(turn.chat()),
        attachment: None,
    };
    let (test, sent) = desk.tests.create(new).await?;
    desk.say(
        turn.chat(),
        &format!("Test '{}' created. Notifications sent: {}.", test.header, sent.len()),
    )
    .await?;
    turn.edit_menu = false;
    show_menu(desk, turn).await
}

fn scope_label(desk: &Desk, scope: &TestScope) -> String {
    match scope {
        TestScope::Role(role) => format!("role {role}"),
        TestScope::User(id) => desk
            .users
            .get(*id)
            .map_or_else(|| format!("user {id}"), |u| u.label()),
        TestScope::Unassigned => "nobody".to_string(),
    }
}
