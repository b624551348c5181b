use crate::machine::{Conversation, State, Step};
use crate::tokens::ShortTokenRegistry;
use workdesk_protocol::{Audience, MessageRef, Role, RoleBucket, TestScope, UserId};

/// Values a short token can stand for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenTarget {
    /// Store-relative path of a file or folder
    Path(String),
    User(UserId),
    Test(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    /// Read-only browsing for members
    Plain,
    /// Admin file manager with delete and upload
    Manager,
}

/// Current position of a browser: `current` always lies within `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseCursor {
    pub mode: BrowseMode,
    pub root: String,
    pub current: String,
}

impl BrowseCursor {
    pub fn new(mode: BrowseMode, root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            mode,
            current: root.clone(),
            root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailDraft {
    pub audience: Audience,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub test_id: Option<u64>,
    pub attachment: Option<String>,
}

impl MailDraft {
    pub fn new(audience: Audience) -> Self {
        Self {
            audience,
            subject: None,
            body: None,
            test_id: None,
            attachment: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestDraft {
    pub scope: Option<TestScope>,
    pub header: Option<String>,
    pub link: Option<String>,
}

/// Files accepted by the upload wizard so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    /// Store-relative folder the files go to
    pub folder: String,
    pub role: Option<Role>,
    pub saved: Vec<String>,
    pub status: Option<MessageRef>,
}

/// Wizard fields. Cleared whenever a conversation ends or is superseded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scratch {
    pub registration_role: Option<Role>,
    pub mail_draft: Option<MailDraft>,
    pub test_draft: Option<TestDraft>,
    pub upload: Option<UploadBatch>,
    pub audit_bucket: Option<RoleBucket>,
}

impl Scratch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ephemeral per-user state. Lives only as long as the process.
#[derive(Debug)]
pub struct SessionContext {
    user_id: UserId,
    state: State,
    pub scratch: Scratch,
    pub browse: Option<BrowseCursor>,
    pub tokens: ShortTokenRegistry<TokenTarget>,
    /// Last menu message, edited in place on the next render
    pub menu: Option<MessageRef>,
}

impl SessionContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: State::Idle,
            scratch: Scratch::default(),
            browse: None,
            tokens: ShortTokenRegistry::new(),
            menu: None,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn conversation(&self) -> Option<Conversation> {
        self.state.conversation()
    }

    /// Enters a conversation at its entry point, ending whatever was active.
    ///
    /// Returns `true` when a different conversation was superseded.
    pub fn begin(&mut self, conversation: Conversation) -> bool {
        let previous = self.state.conversation();
        let superseded = previous.is_some_and(|active| active != conversation);
        if let (true, Some(active)) = (superseded, previous) {
            log::debug!(
                "session {}: {} superseded by {}",
                self.user_id,
                active.as_str(),
                conversation.as_str()
            );
        }
        self.scratch = Scratch::default();
        superseded
    }

    pub fn apply(&mut self, step: Step) {
        match step {
            Step::Stay => {}
            Step::Goto(next) => self.state = next,
            Step::Finish => self.finish(),
        }
    }

    pub fn finish(&mut self) {
        self.scratch = Scratch::default();
        self.browse = None;
        self.state = State::Idle;
    }

    /// Issues a token in the current generation.
    pub fn issue(&mut self, target: TokenTarget) -> crate::Result<workdesk_protocol::ShortToken> {
        self.tokens.issue(target)
    }

    pub fn resolve(&self, token: &workdesk_protocol::ShortToken) -> crate::Result<TokenTarget> {
        self.tokens.resolve(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_supersedes_other_conversation() {
        let mut session = SessionContext::new(7);
        session.apply(Step::Goto(State::ComposeBody));
        session.scratch.mail_draft = Some(MailDraft::new(Audience::Everyone));

        assert!(session.begin(Conversation::Search));
        assert!(session.scratch.is_empty());
        session.apply(Step::Goto(State::Searching));
        assert_eq!(session.conversation(), Some(Conversation::Search));
    }

    #[test]
    fn test_reentry_is_not_a_supersede() {
        let mut session = SessionContext::new(7);
        session.apply(Step::Goto(State::TestLink));
        session.scratch.test_draft = Some(TestDraft::default());

        assert!(!session.begin(Conversation::Mail));
        assert!(session.scratch.is_empty());
    }

    #[test]
    fn test_finish_clears_scratch_and_cursor() {
        let mut session = SessionContext::new(7);
        session.apply(Step::Goto(State::Browsing));
        session.browse = Some(BrowseCursor::new(BrowseMode::Plain, "Shared"));
        session.scratch.registration_role = Some(Role::Driver);

        session.apply(Step::Finish);
        assert_eq!(session.state(), State::Idle);
        assert!(session.scratch.is_empty());
        assert!(session.browse.is_none());
    }
}
