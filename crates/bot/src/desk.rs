use crate::config::DeskConfig;
use crate::dispatch;
use crate::flows::Turn;
use crate::transport::{present, ChatTransport, TransportNotifier};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use workdesk_mailbox::{DeskStore, Mailbox, TestRegistry, UserDirectory};
use workdesk_navigator::{normalize_rel, Navigator, StoreLayout};
use workdesk_protocol::{
    AccessGate, DeskError, Event, Result, RoleSecrets, Screen, Sender, Upload, UserId,
};
use workdesk_search::SearchEngine;
use workdesk_session::SessionStore;

const ATTACHMENTS_DIR: &str = "attachments";
const FAILURE_NOTICE: &str = "Something went wrong. The operator has been notified.";

/// Everything a running workdesk needs, shared by all sessions.
pub struct Desk {
    pub(crate) config: DeskConfig,
    pub(crate) gate: AccessGate,
    pub(crate) secrets: RoleSecrets,
    pub(crate) navigator: Navigator,
    pub(crate) search: SearchEngine,
    pub(crate) users: UserDirectory,
    pub(crate) mailbox: Arc<Mailbox>,
    pub(crate) tests: TestRegistry,
    pub(crate) sessions: SessionStore,
    pub(crate) transport: Arc<dyn ChatTransport>,
}

impl Desk {
    /// Prepares the folder layout and opens the durable store under the internal folder.
    pub fn open(config: DeskConfig, transport: Arc<dyn ChatTransport>) -> anyhow::Result<Self> {
        let layout = StoreLayout::new(&config.base_dir);
        layout
            .ensure_directories()
            .with_context(|| format!("Failed to prepare {}", config.base_dir.display()))?;
        let store = Arc::new(DeskStore::open(&layout.internal_dir()).context("Failed to open store")?);

        let secrets = config.role_secrets()?;
        let gate = AccessGate::new(config.developer_handle.as_deref());
        if gate.developer_handle().is_none() {
            log::warn!("no developer handle configured; failure reports go to the log only");
        }

        let notifier = Arc::new(TransportNotifier::new(transport.clone()));
        let mailbox = Arc::new(Mailbox::new(store.clone(), notifier));
        let tests = TestRegistry::new(store.clone(), mailbox.clone());
        let search = SearchEngine::new(layout.base());

        log::info!("workdesk opened at {}", layout.base().display());
        Ok(Self {
            gate,
            secrets,
            navigator: Navigator::new(layout),
            search,
            users: UserDirectory::new(store),
            mailbox,
            tests,
            sessions: SessionStore::new(),
            transport,
            config,
        })
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn layout(&self) -> &StoreLayout {
        self.navigator.layout()
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn tests(&self) -> &TestRegistry {
        &self.tests
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one inbound update. Updates of the same user are serialised by the session
    /// lock. Operational failures are logged, acknowledged to the user and reported to the
    /// operator; they never propagate to the caller.
    pub async fn handle(&self, event: Event) {
        log::debug!("update {} from {}", event.describe(), event.sender.id);
        let failure = {
            let session = self.sessions.checkout(event.sender.id).await;
            let mut session = session.lock().await;
            dispatch::dispatch(self, &mut session, &event).await.err()
        };
        if let Some(err) = failure {
            self.report_failure(&event, &err).await;
        }
    }

    /// Answers an update the transport could not decode.
    pub async fn reject(&self, sender: &Sender) {
        if let Err(err) = self.say(sender.id, crate::screens::UNRECOGNIZED).await {
            log::debug!("could not answer user {}: {err}", sender.id);
        }
    }

    pub async fn announce_startup(&self) {
        self.notify_operator("Workdesk started.").await;
    }

    async fn report_failure(&self, event: &Event, err: &DeskError) {
        log::error!(
            "failed to handle {} from {}: {err}",
            event.describe(),
            event.sender.id
        );
        if let Err(send_err) = self.say(event.sender.id, FAILURE_NOTICE).await {
            log::warn!("could not notify user {}: {send_err}", event.sender.id);
        }
        let who = event
            .sender
            .handle
            .as_deref()
            .map_or_else(|| event.sender.id.to_string(), |h| format!("@{h}"));
        self.notify_operator(&format!(
            "Error while handling {} from {who}: {err}",
            event.describe()
        ))
        .await;
    }

    /// Best-effort message to the user registered under the developer handle.
    async fn notify_operator(&self, text: &str) {
        let Some(operator) = self
            .gate
            .developer_handle()
            .and_then(|handle| self.users.find_by_handle(handle))
        else {
            log::debug!("operator is not registered, skipping: {text}");
            return;
        };
        if let Err(err) = self.say(operator.id, text).await {
            log::warn!("operator notification failed: {err}");
        }
    }

    /// Renders `screen` as the session's menu: edited in place after a button press, sent
    /// fresh after typed input. Later renders in the same turn edit that fresh message.
    pub(crate) async fn show(&self, turn: &mut Turn<'_>, screen: &Screen) -> Result<()> {
        let current = if turn.edit_menu { turn.session.menu } else { None };
        let shown = present(self.transport.as_ref(), turn.chat(), current, screen).await?;
        turn.session.menu = Some(shown);
        turn.edit_menu = true;
        Ok(())
    }

    /// Sends a standalone text message that does not replace the menu.
    pub(crate) async fn say(&self, chat: UserId, text: &str) -> Result<()> {
        self.transport.send_screen(chat, &Screen::new(text)).await?;
        Ok(())
    }

    pub(crate) async fn alert(&self, chat: UserId, text: &str) -> Result<()> {
        self.transport.alert(chat, text).await?;
        Ok(())
    }

    pub(crate) async fn send_file(
        &self,
        chat: UserId,
        path: &std::path::Path,
        caption: Option<&str>,
    ) -> Result<()> {
        self.transport.send_document(chat, path, caption).await?;
        Ok(())
    }

    /// Saves a mail attachment under the internal folder; returns its stored reference.
    pub(crate) fn store_attachment(&self, upload: &Upload) -> Result<String> {
        let prefix: String = upload
            .unique_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        let name = format!("{prefix}_{}", upload.stored_name());
        let dir = self.layout().internal_dir().join(ATTACHMENTS_DIR);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(&name), &upload.bytes)?;
        log::info!("stored attachment {name} ({} bytes)", upload.bytes.len());
        Ok(format!("{ATTACHMENTS_DIR}/{name}"))
    }

    pub(crate) fn attachment_path(&self, reference: &str) -> Result<PathBuf> {
        let rel = normalize_rel(reference)
            .ok()
            .filter(|rel| rel.starts_with(&format!("{ATTACHMENTS_DIR}/")))
            .ok_or_else(|| DeskError::not_found(format!("attachment '{reference}'")))?;
        let path = self.layout().internal_dir().join(rel);
        if !path.is_file() {
            return Err(DeskError::not_found(format!("attachment '{reference}'")));
        }
        Ok(path)
    }
}
