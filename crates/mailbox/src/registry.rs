use crate::error::{Result, StoreError};
use crate::mailbox::{Mailbox, OutgoingMail};
use crate::store::DeskStore;
use crate::types::{unix_ms, Message, Test, TestResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;
use workdesk_protocol::{Audience, TestScope, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTest {
    pub header: String,
    pub link: String,
    pub scope: TestScope,
    pub creator: Option<UserId>,
    pub attachment: Option<String>,
}

/// Assignable external test links.
pub struct TestRegistry {
    store: Arc<DeskStore>,
    mailbox: Arc<Mailbox>,
}

/// Accepts `http://` and `https://` links with something after the scheme.
pub fn validate_link(raw: &str) -> Result<String> {
    let link = raw.trim();
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or_default();
    if rest.is_empty() || link.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidInput(
            "the link must start with http:// or https://".into(),
        ));
    }
    Ok(link.to_string())
}

impl TestRegistry {
    pub fn new(store: Arc<DeskStore>, mailbox: Arc<Mailbox>) -> Self {
        Self { store, mailbox }
    }

    /// Stores the test and mails its audience. Unassigned tests notify nobody.
    pub async fn create(&self, new: NewTest) -> Result<(Test, Vec<Message>)> {
        let header = new.header.trim().to_string();
        if header.is_empty() {
            return Err(StoreError::InvalidInput("the test needs a title".into()));
        }
        let link = validate_link(&new.link)?;

        let test = self.store.write(|t| {
            let test = Test {
                id: t.allocate_test_id(),
                header,
                link,
                scope: new.scope,
                creator: new.creator,
                attachment: new.attachment.clone(),
                created_at_ms: unix_ms(SystemTime::now()),
            };
            t.tests.push(test.clone());
            Ok(test)
        })?;
        log::info!("test {} '{}' created for {:?}", test.id, test.header, test.scope);

        let audience = match test.scope {
            TestScope::Role(role) => Some(Audience::Role(role)),
            TestScope::User(user) => Some(Audience::User(user)),
            TestScope::Unassigned => None,
        };
        let sent = match audience {
            Some(audience) => {
                let mail = OutgoingMail::new(
                    format!("New test: {}", test.header),
                    "A new test has been assigned to you. Mark this message as read to get the link.",
                )
                .with_test(Some(test.id))
                .with_attachment(test.attachment.clone());
                self.mailbox.send_to_audience(&audience, &mail).await?
            }
            None => Vec::new(),
        };
        Ok((test, sent))
    }

    /// All tests, newest first.
    pub fn list(&self) -> Vec<Test> {
        let mut tests = self.store.read(|t| t.tests.clone());
        tests.sort_by(|a, b| b.id.cmp(&a.id));
        tests
    }

    pub fn get(&self, id: u64) -> Result<Test> {
        self.store
            .read(|t| t.tests.iter().find(|test| test.id == id).cloned())
            .ok_or_else(|| StoreError::not_found("test", id))
    }

    /// Tests linked from the user's mail that still exist.
    pub fn for_user(&self, user: UserId) -> Vec<Test> {
        self.store.read(|t| {
            let linked: BTreeSet<u64> = t
                .messages
                .iter()
                .filter(|m| m.recipient == user)
                .filter_map(|m| m.test_id)
                .collect();
            let mut tests: Vec<Test> = t
                .tests
                .iter()
                .filter(|test| linked.contains(&test.id))
                .cloned()
                .collect();
            tests.sort_by(|a, b| b.id.cmp(&a.id));
            tests
        })
    }

    /// Removes the test. Messages that point at it are left as they are.
    pub fn delete(&self, id: u64) -> Result<Test> {
        let removed = self.store.write(|t| {
            let idx = t
                .tests
                .iter()
                .position(|test| test.id == id)
                .ok_or_else(|| StoreError::not_found("test", id))?;
            Ok(t.tests.remove(idx))
        })?;
        log::info!("deleted test {id}");
        Ok(removed)
    }

    pub fn record_result(
        &self,
        user_id: UserId,
        handle: Option<&str>,
        score: u32,
        total: u32,
    ) -> Result<TestResult> {
        if total == 0 || score > total {
            return Err(StoreError::InvalidInput(format!(
                "score {score} out of {total} is not valid"
            )));
        }
        self.store.write(|t| {
            let result = TestResult {
                id: t.allocate_result_id(),
                user_id,
                handle: handle.map(str::to_string),
                score,
                total,
                recorded_at_ms: unix_ms(SystemTime::now()),
            };
            t.test_results.push(result.clone());
            Ok(result)
        })
    }

    /// Recorded results, newest first.
    pub fn results(&self) -> Vec<TestResult> {
        let mut results = self.store.read(|t| t.test_results.clone());
        results.sort_by(|a, b| b.id.cmp(&a.id));
        results
    }
}
