//! Static texts and the main menu.

use workdesk_protocol::{Action, Button, Permission, Role, Screen};

pub(crate) const UNRECOGNIZED: &str = "Unrecognized command. Send /help to see what is available.";
pub(crate) const NOT_REGISTERED: &str = "You are not registered yet. Send /start to register.";
pub(crate) const NO_PERMISSION: &str = "You do not have permission for this action.";
pub(crate) const FINISH_SEARCH_FIRST: &str = "Finish the search first: press 'Finish search'.";

pub(crate) fn main_menu(permission: Permission) -> Screen {
    let mut screen = Screen::new("Main menu")
        .row(vec![
            Button::action("Shared files", Action::FilesShared),
            Button::action("Work files", Action::FilesRole),
        ])
        .button(Button::action("Search files", Action::SearchStart))
        .button(Button::action("Mail", Action::MailMain));
    if permission.is_admin() {
        screen.push(Button::action("Admin panel", Action::AdminPanel));
    }
    screen
}

/// Reply keyboard with one button per role, used during registration.
pub(crate) fn role_picker(text: &str) -> Screen {
    let mut screen = Screen::new(text);
    for pair in Role::ALL.chunks(2) {
        screen = screen.row(pair.iter().map(|role| Button::reply(role.as_str())).collect());
    }
    screen
}

pub(crate) fn help(permission: Permission) -> String {
    let mut lines = vec!["Available commands:", "/start - register or open the main menu"];
    if permission >= Permission::Member {
        lines.extend([
            "/mail - open your mailbox",
            "/search - search files by name",
        ]);
    }
    if permission.is_admin() {
        lines.push("/admin - open the admin panel");
    }
    lines.push("/help - show this help");
    if permission == Permission::Guest {
        lines.push("");
        lines.push(NOT_REGISTERED);
    }
    lines.join("\n")
}

/// Upper-cases the first letter of an error detail for display.
pub(crate) fn sentence(detail: &str) -> String {
    let mut chars = detail.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_admin_menu_has_panel() {
        let member = main_menu(Permission::Member);
        assert!(member.find_action("Admin panel").is_none());
        let admin = main_menu(Permission::Admin);
        assert_eq!(admin.find_action("Admin panel"), Some(&Action::AdminPanel));
    }

    #[test]
    fn test_help_depends_on_permission() {
        assert!(help(Permission::Guest).contains(NOT_REGISTERED));
        assert!(!help(Permission::Member).contains("/admin"));
        assert!(help(Permission::Admin).contains("/admin"));
    }

    #[test]
    fn test_role_picker_lists_every_role() {
        let picker = role_picker("Choose");
        assert_eq!(picker.rows.iter().flatten().count(), Role::ALL.len());
    }

    #[test]
    fn test_sentence() {
        assert_eq!(sentence("subject must not be empty"), "Subject must not be empty");
        assert_eq!(sentence(""), "");
    }
}
