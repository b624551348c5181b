//! Read-only browsing of the shared folder and the user's role folder.

use super::{Outcome, Turn};
use crate::desk::Desk;
use workdesk_navigator::{display_rel, parent_within, Listing, StoreLayout, UpTarget, SHARED_ROOT};
use workdesk_protocol::{Action, Button, DeskError, EventKind, Permission, Result, Screen};
use workdesk_session::{BrowseCursor, BrowseMode, Conversation, State, Step, TokenTarget};

pub(crate) async fn open_shared(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Member)?;
    open_at(desk, turn, SHARED_ROOT, SHARED_ROOT).await
}

pub(crate) async fn open_role(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Member)?;
    let role = turn.work_role().ok_or(DeskError::PermissionDenied)?;
    let root = StoreLayout::role_root(role);
    open_at(desk, turn, &root, &root).await
}

/// Starts a browse conversation positioned at `rel` inside `root`.
pub(crate) async fn open_at(desk: &Desk, turn: &mut Turn<'_>, root: &str, rel: &str) -> Outcome {
    let mut cursor = BrowseCursor::new(BrowseMode::Plain, root);
    cursor.current = desk.navigator.folder(root, rel)?;
    turn.session.begin(Conversation::Browse);
    turn.session.browse = Some(cursor);
    render(desk, turn).await?;
    Ok(Step::Goto(State::Browsing))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, input: &EventKind) -> Outcome {
    let EventKind::Action(action) = input else {
        return Ok(Step::Stay);
    };
    let Some(cursor) = turn.session.browse.clone() else {
        return Ok(Step::Finish);
    };
    match action {
        Action::BrowseDir(token) => {
            let TokenTarget::Path(rel) = turn.session.resolve(token)? else {
                return Err(DeskError::not_found("folder"));
            };
            let rel = desk.navigator.folder(&cursor.root, &rel)?;
            move_to(turn, rel);
            render(desk, turn).await?;
            Ok(Step::Stay)
        }
        Action::BrowseFile(token) => {
            let TokenTarget::Path(rel) = turn.session.resolve(token)? else {
                return Err(DeskError::not_found("file"));
            };
            let path = desk.navigator.file(&cursor.root, &rel)?;
            desk.send_file(turn.chat(), &path, None).await?;
            Ok(Step::Stay)
        }
        Action::BrowseUp => match parent_within(&cursor.root, &cursor.current) {
            Some(parent) => {
                move_to(turn, parent);
                render(desk, turn).await?;
                Ok(Step::Stay)
            }
            None => {
                desk.show(turn, &crate::screens::main_menu(turn.permission))
                    .await?;
                Ok(Step::Finish)
            }
        },
        _ => Ok(Step::Stay),
    }
}

fn move_to(turn: &mut Turn<'_>, rel: String) {
    if let Some(cursor) = turn.session.browse.as_mut() {
        cursor.current = rel;
    }
}

async fn render(desk: &Desk, turn: &mut Turn<'_>) -> Result<()> {
    let Some(cursor) = turn.session.browse.clone() else {
        return Ok(());
    };
    let listing = desk
        .navigator
        .list(&cursor.root, &cursor.current, &mut turn.session.tokens)?;
    desk.show(turn, &listing_screen(&listing)).await
}

fn listing_screen(listing: &Listing) -> Screen {
    let mut screen = Screen::new(format!("Folder: {}", listing.display_path()));
    if listing.is_empty() {
        screen.text.push_str("\n\nThe folder is empty.");
    }
    for folder in &listing.folders {
        screen.push(Button::action(
            format!("{}/", folder.name),
            Action::BrowseDir(folder.token.clone()),
        ));
    }
    for file in &listing.files {
        screen.push(Button::action(
            file.name.clone(),
            Action::BrowseFile(file.token.clone()),
        ));
    }
    match &listing.up {
        UpTarget::Parent(parent) => {
            screen.push(Button::action(
                format!("Up to {}", display_rel(parent)),
                Action::BrowseUp,
            ));
            screen.push(Button::action("Main menu", Action::MainMenu));
        }
        UpTarget::ExitToMenu => screen.push(Button::action("Main menu", Action::MainMenu)),
    }
    screen
}
