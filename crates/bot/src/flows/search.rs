use super::{browse, Outcome, Turn};
use crate::desk::Desk;
use crate::screens;
use workdesk_navigator::is_within;
use workdesk_protocol::{Action, Button, DeskError, EventKind, Permission, Result, Screen};
use workdesk_search::{search_roots, HitKind, SearchHit};
use workdesk_session::{Conversation, State, Step, TokenTarget};

const PROMPT: &str = "Enter a file or folder name to search for:";

pub(crate) async fn start(desk: &Desk, turn: &mut Turn<'_>) -> Outcome {
    turn.require(Permission::Member)?;
    turn.session.begin(Conversation::Search);
    turn.session.tokens.reset();
    desk.show(turn, &prompt_screen(PROMPT)).await?;
    Ok(Step::Goto(State::Searching))
}

pub(crate) async fn handle(desk: &Desk, turn: &mut Turn<'_>, input: &EventKind) -> Outcome {
    match input {
        EventKind::Text(query) => run_query(desk, turn, query).await,
        EventKind::Action(Action::SearchFile(token)) => {
            let rel = resolve_path(turn, token)?;
            let root = root_for(turn, &rel)?;
            let path = desk.navigator.file(&root, &rel)?;
            desk.send_file(turn.chat(), &path, None).await?;
            Ok(Step::Stay)
        }
        EventKind::Action(Action::SearchDir(token)) => {
            let rel = resolve_path(turn, token)?;
            let root = root_for(turn, &rel)?;
            browse::open_at(desk, turn, &root, &rel).await
        }
        EventKind::Action(Action::SearchAgain) => {
            turn.session.tokens.reset();
            desk.show(turn, &prompt_screen(PROMPT)).await?;
            Ok(Step::Stay)
        }
        EventKind::Action(Action::SearchFinish) => {
            desk.show(turn, &screens::main_menu(turn.permission)).await?;
            Ok(Step::Finish)
        }
        _ => Ok(Step::Stay),
    }
}

async fn run_query(desk: &Desk, turn: &mut Turn<'_>, query: &str) -> Outcome {
    let roots = search_roots(turn.permission, turn.work_role());
    let hits = desk.search.search(&roots, query)?;
    log::info!(
        "user {} searched {:?}: {} hits",
        turn.chat(),
        query.trim(),
        hits.len()
    );

    turn.session.tokens.reset();
    if hits.is_empty() {
        let text = format!("Nothing found for '{}'. Enter another query:", query.trim());
        desk.show(turn, &prompt_screen(&text)).await?;
        return Ok(Step::Stay);
    }

    let limit = desk.config.max_search_results;
    let mut screen = Screen::new(if hits.len() > limit {
        format!("Found {} matches, showing the best {limit}:", hits.len())
    } else {
        format!("Found {} matches:", hits.len())
    });
    for hit in hits.iter().take(limit) {
        screen.push(hit_button(turn, hit)?);
    }
    let screen = screen
        .button(Button::action("New search", Action::SearchAgain))
        .button(Button::action("Finish search", Action::SearchFinish));
    desk.show(turn, &screen).await?;
    Ok(Step::Stay)
}

fn hit_button(turn: &mut Turn<'_>, hit: &SearchHit) -> Result<Button> {
    let token = turn.session.issue(TokenTarget::Path(hit.rel.clone()))?;
    Ok(match hit.kind {
        HitKind::Folder => Button::action(format!("{}/", hit.name), Action::SearchDir(token)),
        HitKind::File => Button::action(hit.name.clone(), Action::SearchFile(token)),
    })
}

fn prompt_screen(text: &str) -> Screen {
    Screen::new(text).button(Button::action("Finish search", Action::SearchFinish))
}

fn resolve_path(turn: &Turn<'_>, token: &workdesk_protocol::ShortToken) -> Result<String> {
    match turn.session.resolve(token)? {
        TokenTarget::Path(rel) => Ok(rel),
        _ => Err(DeskError::not_found("search result")),
    }
}

/// The caller's search root that contains `rel`.
fn root_for(turn: &Turn<'_>, rel: &str) -> Result<String> {
    search_roots(turn.permission, turn.work_role())
        .into_iter()
        .find(|root| is_within(root, rel))
        .ok_or(DeskError::PermissionDenied)
}
