//! Conversation graph: named states, the triggers each one accepts, and routing of triggers
//! that fall outside the active state.

use workdesk_protocol::{Action, Command};

/// Top-level conversations. Only one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversation {
    Registration,
    Browse,
    Mail,
    Search,
    Admin,
}

impl Conversation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Browse => "browse",
            Self::Mail => "mail",
            Self::Search => "search",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    #[default]
    Idle,

    RegistrationRole,
    RegistrationSecret,

    Browsing,

    MailMenu,
    ComposeKind,
    ComposeRecipient,
    ComposeSubject,
    ComposeBody,
    ComposeAttachment,
    ComposeTest,
    ComposePreview,
    TestsMenu,
    TestScope,
    TestTarget,
    TestHeader,
    TestLink,
    TestConfirm,
    AuditRoles,
    AuditList,

    Searching,

    AdminMenu,
    AdminBroadcast,
    FileManager,
    UploadCollecting,
    UploadAskTest,
    UploadChooseTest,
}

/// Input that can move a conversation forward.
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    Text(&'a str),
    Upload,
    Action(&'a Action),
}

/// Outcome of a handler, applied to the session afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Goto(State),
    /// Terminal signal: scratch fields are dropped and the session goes idle
    Finish,
}

/// Where an inbound trigger is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The active state accepts it
    Handle(State),
    /// Main-menu entry handled by the global dispatcher
    Global,
    /// Rejected while the active conversation holds the menu
    Blocked(Conversation),
    Unrecognized,
}

impl State {
    pub const fn conversation(self) -> Option<Conversation> {
        use State::*;
        match self {
            Idle => None,
            RegistrationRole | RegistrationSecret => Some(Conversation::Registration),
            Browsing => Some(Conversation::Browse),
            MailMenu | ComposeKind | ComposeRecipient | ComposeSubject | ComposeBody
            | ComposeAttachment | ComposeTest | ComposePreview | TestsMenu | TestScope
            | TestTarget | TestHeader | TestLink | TestConfirm | AuditRoles | AuditList => {
                Some(Conversation::Mail)
            }
            Searching => Some(Conversation::Search),
            AdminMenu | AdminBroadcast | FileManager | UploadCollecting | UploadAskTest
            | UploadChooseTest => Some(Conversation::Admin),
        }
    }

    /// Transition table: which triggers each state handles itself.
    pub fn accepts(self, trigger: &Trigger<'_>) -> bool {
        use Action as A;
        use State::*;
        match (self, trigger) {
            (Idle, _) => false,

            (RegistrationRole | RegistrationSecret, Trigger::Text(_)) => true,
            (RegistrationRole | RegistrationSecret, _) => false,

            (Browsing, Trigger::Action(a)) => matches!(
                a,
                A::BrowseDir(_) | A::BrowseFile(_) | A::BrowseUp
            ),
            (Browsing, _) => false,

            (MailMenu, Trigger::Action(a)) => matches!(
                a,
                A::MailMain
                    | A::MailUnread
                    | A::MailRead
                    | A::MailOpen(_)
                    | A::MailAck(_)
                    | A::MailView(_)
                    | A::MailCompose
                    | A::MailAll
                    | A::MailTests
                    | A::MailExit
            ),
            (ComposeKind, Trigger::Action(a)) => {
                matches!(a, A::ComposeGroup | A::ComposeOne | A::MailMain)
            }
            (ComposeRecipient, Trigger::Action(a)) => matches!(
                a,
                A::ComposeRole(_) | A::ComposeUser(_) | A::MailCompose | A::MailMain
            ),
            (ComposeSubject | ComposeBody, Trigger::Text(_)) => true,
            (ComposeSubject | ComposeBody, Trigger::Action(a)) => matches!(a, A::MailMain),
            (ComposeAttachment, Trigger::Upload) => true,
            (ComposeAttachment, Trigger::Action(a)) => {
                matches!(a, A::ComposeAttachTest | A::ComposeSkip | A::MailMain)
            }
            (ComposeTest, Trigger::Action(a)) => {
                matches!(a, A::ComposePickTest(_) | A::ComposeBack | A::MailMain)
            }
            (ComposePreview, Trigger::Action(a)) => matches!(a, A::ComposeSend | A::MailMain),
            (TestsMenu, Trigger::Action(a)) => matches!(
                a,
                A::TestView(_) | A::TestDelete(_) | A::TestCreate | A::TestsBack | A::MailMain
            ),
            (TestScope, Trigger::Action(a)) => matches!(
                a,
                A::TestScopeRole | A::TestScopeUser | A::TestScopeNone | A::TestsBack
            ),
            (TestTarget, Trigger::Action(a)) => {
                matches!(a, A::TestRole(_) | A::TestUser(_) | A::TestCreate | A::TestsBack)
            }
            (TestHeader | TestLink, Trigger::Text(_)) => true,
            (TestHeader | TestLink, Trigger::Action(a)) => matches!(a, A::TestsBack),
            (TestConfirm, Trigger::Action(a)) => matches!(a, A::TestConfirm | A::TestCancel),
            (AuditRoles, Trigger::Action(a)) => matches!(a, A::AuditBucket(_) | A::MailMain),
            (AuditList, Trigger::Action(a)) => matches!(
                a,
                A::AuditView(_)
                    | A::AuditDelete(_)
                    | A::AuditRefresh
                    | A::AuditBack
                    | A::MailAll
                    | A::MailMain
            ),
            (
                MailMenu | ComposeKind | ComposeRecipient | ComposeSubject | ComposeBody
                | ComposeAttachment | ComposeTest | ComposePreview | TestsMenu | TestScope
                | TestTarget | TestHeader | TestLink | TestConfirm | AuditRoles | AuditList,
                _,
            ) => false,

            (Searching, Trigger::Text(_)) => true,
            (Searching, Trigger::Action(a)) => matches!(
                a,
                A::SearchFile(_) | A::SearchDir(_) | A::SearchAgain | A::SearchFinish
            ),
            (Searching, Trigger::Upload) => false,

            (AdminMenu, Trigger::Action(a)) => matches!(
                a,
                A::AdminPanel
                    | A::AdminRestart
                    | A::AdminUsers
                    | A::AdminReset(_)
                    | A::AdminBroadcast
                    | A::AdminFiles
                    | A::AdminResults
                    | A::AdminExit
            ),
            (AdminBroadcast, Trigger::Text(_)) => true,
            (AdminBroadcast, Trigger::Action(a)) => matches!(a, A::AdminPanel),
            (FileManager, Trigger::Action(a)) => matches!(
                a,
                A::FmOpen(_)
                    | A::FmRemove(_)
                    | A::FmFile(_)
                    | A::FmFileDelete(_)
                    | A::FmFileSend(_)
                    | A::FmUp
                    | A::FmUpload
                    | A::FmExit
            ),
            (UploadCollecting, Trigger::Upload | Trigger::Text(_)) => true,
            (UploadAskTest, Trigger::Action(a)) => {
                matches!(a, A::UploadAttachYes | A::UploadAttachNo)
            }
            (UploadChooseTest, Trigger::Action(a)) => {
                matches!(a, A::UploadPickTest(_) | A::UploadAttachNo)
            }
            (
                AdminMenu | AdminBroadcast | FileManager | UploadCollecting | UploadAskTest
                | UploadChooseTest,
                _,
            ) => false,
        }
    }
}

/// Picks the destination of a trigger given the active state.
pub fn route(state: State, trigger: &Trigger<'_>) -> Route {
    if state.accepts(trigger) {
        return Route::Handle(state);
    }
    match trigger {
        Trigger::Action(action) if action.is_menu_entry() => {
            if state.conversation() == Some(Conversation::Search) {
                Route::Blocked(Conversation::Search)
            } else {
                Route::Global
            }
        }
        _ => Route::Unrecognized,
    }
}

/// Commands are always global, except that search keeps the menu until it is finished.
/// `/start` and `/help` stay available as escape hatches, `/search` restarts the search.
pub fn route_command(state: State, command: Command) -> Route {
    match (state.conversation(), command) {
        (Some(Conversation::Search), Command::Mail | Command::Admin) => {
            Route::Blocked(Conversation::Search)
        }
        _ => Route::Global,
    }
}
