//! Admin file manager rooted at the store root, and the upload wizard it starts.

use super::{admin, Outcome, Turn};
use crate::desk::Desk;
use crate::transport::present;
use workdesk_mailbox::OutgoingMail;
use workdesk_navigator::{display_rel, parent_within, top_role_folder, Listing, Removed, UpTarget};
use workdesk_protocol::{
    Action, Button, DeskError, EventKind, Result, Screen, ShortToken, Upload,
};
use workdesk_session::{BrowseCursor, BrowseMode, State, Step, TokenTarget, UploadBatch};

const STORE_ROOT: &str = "";

pub(crate) async fn open_manager(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.session.browse = Some(BrowseCursor::new(BrowseMode::Manager, STORE_ROOT));
    turn.session.scratch.upload = None;
    render(desk, turn).await?;
    Ok(Step::Goto(State::FileManager))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, state: State, input: &EventKind) -> Outcome {
    match state {
        State::FileManager => manage(desk, turn, input).await,
        State::UploadCollecting => collect(desk, turn, input).await,
        State::UploadAskTest => match input {
            EventKind::Action(Action::UploadAttachYes) => pick_test(desk, turn).await,
            EventKind::Action(Action::UploadAttachNo) => finish_upload(desk, turn).await,
            _ => Ok(Step::Stay),
        },
        State::UploadChooseTest => match input {
            EventKind::Action(Action::UploadPickTest(token)) => attach_test(desk, turn, token).await,
            EventKind::Action(Action::UploadAttachNo) => finish_upload(desk, turn).await,
            _ => Ok(Step::Stay),
        },
        _ => Ok(Step::Stay),
    }
}

fn cursor(turn: &Turn<'_>) -> Result<BrowseCursor> {
    turn.session
        .browse
        .clone()
        .filter(|c| c.mode == BrowseMode::Manager)
        .ok_or_else(|| DeskError::not_found("file manager; open it again"))
}

fn resolve_path(turn: &Turn<'_>, token: &ShortToken) -> Result<String> {
    match turn.session.resolve(token)? {
        TokenTarget::Path(rel) => Ok(rel),
        _ => Err(DeskError::not_found("file or folder")),
    }
}

async fn manage(desk: &Desk, turn: &mut Turn<'_>, input: &EventKind) -> Outcome {
    let EventKind::Action(action) = input else {
        return Ok(Step::Stay);
    };
    let cursor = cursor(turn)?;
    match action {
        Action::FmOpen(token) => {
            let rel = resolve_path(turn, token)?;
            let rel = desk.navigator.folder(&cursor.root, &rel)?;
            move_to(turn, rel);
            render(desk, turn).await?;
            Ok(Step::Stay)
        }
        Action::FmFile(token) => {
            let rel = resolve_path(turn, token)?;
            desk.navigator.file(&cursor.root, &rel)?;
            // The current folder gets its own token; the file token stays valid
            let back = turn.session.issue(TokenTarget::Path(cursor.current.clone()))?;
            let screen = Screen::new(format!("File: {}", display_rel(&rel)))
                .row(vec![
                    Button::action("Download", Action::FmFileSend(token.clone())),
                    Button::action("Delete", Action::FmFileDelete(token.clone())),
                ])
                .button(Button::action("Back", Action::FmOpen(back)));
            desk.show(turn, &screen).await?;
            Ok(Step::Stay)
        }
        Action::FmFileSend(token) => {
            let rel = resolve_path(turn, token)?;
            let path = desk.navigator.file(&cursor.root, &rel)?;
            desk.send_file(turn.chat(), &path, None).await?;
            Ok(Step::Stay)
        }
        Action::FmRemove(token) | Action::FmFileDelete(token) => {
            let rel = resolve_path(turn, token)?;
            remove(desk, turn, &cursor, &rel).await
        }
        Action::FmUp => {
            match parent_within(&cursor.root, &cursor.current) {
                Some(parent) => move_to(turn, parent),
                None => return leave(desk, turn).await,
            }
            render(desk, turn).await?;
            Ok(Step::Stay)
        }
        Action::FmUpload => start_upload(desk, turn, &cursor).await,
        Action::FmExit => leave(desk, turn).await,
        _ => Ok(Step::Stay),
    }
}

async fn leave(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.session.browse = None;
    admin::show_menu(desk, turn).await
}

/// Deletes and re-renders. A concurrent delete that got there first is reported, not fatal.
async fn remove(desk: &Desk, turn: &mut Turn<'_>, cursor: &BrowseCursor, rel: &str) -> Outcome {
    let notice = match desk.navigator.delete(&cursor.root, rel) {
        Ok(Removed::File) => format!("File {} deleted.", display_rel(rel)),
        Ok(Removed::Folder) => format!("Folder {} deleted.", display_rel(rel)),
        Err(err) => match DeskError::from(err) {
            DeskError::NotFound(_) => {
                format!("Could not delete {}: it no longer exists.", display_rel(rel))
            }
            other => return Err(other),
        },
    };
    log::info!("user {}: {notice}", turn.chat());
    desk.alert(turn.chat(), &notice).await?;
    render(desk, turn).await?;
    Ok(Step::Stay)
}

fn move_to(turn: &mut Turn<'_>, rel: String) {
    if let Some(cursor) = turn.session.browse.as_mut() {
        cursor.current = rel;
    }
}

async fn render(desk: &Desk, turn: &mut Turn<'_>) -> Result<()> {
    let cursor = cursor(turn)?;
    let listing = desk
        .navigator
        .list(&cursor.root, &cursor.current, &mut turn.session.tokens)?;
    desk.show(turn, &manager_screen(&listing)).await
}

fn manager_screen(listing: &Listing) -> Screen {
    let mut screen = Screen::new(format!("File manager: {}", listing.display_path()));
    if listing.is_empty() {
        screen.text.push_str("\n\nThe folder is empty.");
    }
    for folder in &listing.folders {
        screen = screen.row(vec![
            Button::action(format!("{}/", folder.name), Action::FmOpen(folder.token.clone())),
            Button::action("Delete", Action::FmRemove(folder.token.clone())),
        ]);
    }
    for file in &listing.files {
        screen.push(Button::action(file.name.clone(), Action::FmFile(file.token.clone())));
    }
    screen.push(Button::action("Upload files here", Action::FmUpload));
    let back = match listing.up {
        UpTarget::Parent(_) => Button::action("Up", Action::FmUp),
        UpTarget::ExitToMenu => Button::action("Back to admin panel", Action::FmExit),
    };
    screen.row(vec![back])
}

async fn start_upload(desk: &Desk, turn: &mut Turn<'_>, cursor: &BrowseCursor) -> Outcome {
    let done = desk
        .config
        .done_words
        .first()
        .cloned()
        .unwrap_or_else(|| "done".to_string());
    turn.session.scratch.upload = Some(UploadBatch {
        folder: cursor.current.clone(),
        role: top_role_folder(&cursor.current),
        saved: Vec::new(),
        status: None,
    });
    let screen = Screen::new(format!(
        "Send documents, photos or videos for {}. Type '{done}' when finished.",
        display_rel(&cursor.current)
    ));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::UploadCollecting))
}

fn batch<'s>(turn: &'s mut Turn<'_>) -> Result<&'s mut UploadBatch> {
    turn.session
        .scratch
        .upload
        .as_mut()
        .ok_or_else(|| DeskError::not_found("upload; start it again from the file manager"))
}

async fn collect(desk: &Desk, turn: &mut Turn<'_>, input: &EventKind) -> Outcome {
    match input {
        EventKind::Upload(upload) => receive(desk, turn, upload).await,
        EventKind::Text(text) if desk.config.is_done_word(text) => {
            if batch(turn)?.saved.is_empty() {
                desk.say(turn.chat(), "No files were uploaded.").await?;
                return finish_upload(desk, turn).await;
            }
            let screen = Screen::new("Attach a test to the uploaded files?").row(vec![
                Button::action("Yes", Action::UploadAttachYes),
                Button::action("No", Action::UploadAttachNo),
            ]);
            turn.edit_menu = false;
            desk.show(turn, &screen).await?;
            Ok(Step::Goto(State::UploadAskTest))
        }
        EventKind::Text(_) => {
            desk.say(turn.chat(), "Send a file, or type the finishing word.")
                .await?;
            Ok(Step::Stay)
        }
        _ => Ok(Step::Stay),
    }
}

async fn receive(desk: &Desk, turn: &mut Turn<'_>, upload: &Upload) -> Outcome {
    let chat = turn.chat();
    let folder = batch(turn)?.folder.clone();
    let received = desk
        .navigator
        .receive(STORE_ROOT, &folder, &upload.stored_name(), &upload.bytes)?;

    let batch = batch(turn)?;
    batch.saved.push(received.name.clone());
    let status = Screen::new(format!(
        "Uploaded to {}:\n{}",
        display_rel(&folder),
        batch
            .saved
            .iter()
            .map(|name| format!("- {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    ));
    let shown = present(desk.transport.as_ref(), chat, batch.status, &status).await?;
    batch.status = Some(shown);

    if let Some(role) = received.role {
        let mail = OutgoingMail::new(
            "File added",
            format!(
                "A file '{}' was uploaded to the '{role}' role folder.",
                received.name
            ),
        );
        let sent = desk.mailbox.send_to_role(role, &mail).await?;
        log::debug!("upload of {} notified {} users", received.rel, sent.len());
    }
    Ok(Step::Stay)
}

async fn pick_test(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    let tests = desk.tests.list();
    turn.session.tokens.reset();
    let mut screen = Screen::new(if tests.is_empty() {
        "There are no tests yet."
    } else {
        "Choose the test:"
    });
    for test in &tests {
        let token = turn.session.issue(TokenTarget::Test(test.id))?;
        screen.push(Button::action(test.header.clone(), Action::UploadPickTest(token)));
    }
    let screen = screen.button(Button::action("Skip", Action::UploadAttachNo));
    desk.show(turn, &screen).await?;
    Ok(Step::Goto(State::UploadChooseTest))
}

/// Mails the folder's role about the batch with the chosen test linked.
async fn attach_test(desk: &Desk, turn: &mut Turn<'_>, token: &ShortToken) -> Outcome {
    let TokenTarget::Test(id) = turn.session.resolve(token)? else {
        return Err(DeskError::not_found("test"));
    };
    let test = desk.tests.get(id)?;
    let batch = batch(turn)?.clone();
    match batch.role {
        Some(role) => {
            let mail = OutgoingMail::new(
                format!("New files with test: {}", test.header),
                format!(
                    "Files uploaded to {}: {}. Mark this message as read to get the test link.",
                    display_rel(&batch.folder),
                    batch.saved.join(", ")
                ),
            )
            .with_test(Some(test.id));
            let sent = desk.mailbox.send_to_role(role, &mail).await?;
            desk.alert(
                turn.chat(),
                &format!("Test '{}' sent to {} users of {role}.", test.header, sent.len()),
            )
            .await?;
        }
        None => {
            desk.alert(turn.chat(), "The folder belongs to no role; nobody was notified.")
                .await?;
        }
    }
    finish_upload(desk, turn).await
}

async fn finish_upload(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.session.scratch.upload = None;
    render(desk, turn).await?;
    Ok(Step::Goto(State::FileManager))
}
