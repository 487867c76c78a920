//! Common test utilities and mock implementations.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use clubhouse::repository::Repository;
use clubhouse::subscriber::Notifier;
use clubhouse::subscriber::NotifyError;
use clubhouse::subscriber::OutgoingMessage;
use uuid::Uuid;

/// Sets up a temporary test database.
pub async fn setup_db() -> (Arc<Repository>, PathBuf) {
    let uuid = Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("clubhouse-test-{}.db", uuid));
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());

    let db = Repository::new(&db_url, db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    db.run_migrations().await.expect("Failed to run migrations");

    (Arc::new(db), db_path)
}

/// Cleans up the test database file.
pub async fn teardown_db(db_path: PathBuf) {
    if db_path.exists() {
        let _ = std::fs::remove_file(db_path);
    }
}

/// Loads a test response file from the responses directory.
#[allow(dead_code)]
pub fn get_response(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/responses");
    path.push(filename);
    std::fs::read_to_string(path).expect("Failed to read response file")
}

// MOCK NOTIFIER

pub const BOT_ID: u64 = 1;

/// In-memory chat platform that records everything sent through it.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockNotifier {
    pub state: Mutex<MockNotifierState>,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MockNotifierState {
    /// Channels that resolve, keyed by channel id to their guild id.
    pub channels: HashMap<u64, u64>,
    /// (guild_id, role name) to role id.
    pub roles: HashMap<(u64, String), u64>,
    /// Role id to members holding it.
    pub role_members: HashMap<u64, HashSet<u64>>,
    pub next_role_id: u64,
    pub fail_ensure_role: bool,
    pub fail_send: bool,
    pub missing_users: HashSet<u64>,
    pub fail_user_lookup: bool,
    /// (channel_id, message) in send order.
    pub messages: Vec<(u64, OutgoingMessage)>,
    /// (user_id, message) in send order.
    pub dms: Vec<(u64, OutgoingMessage)>,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockNotifierState {
                next_role_id: 1000,
                ..Default::default()
            }),
        })
    }

    pub fn add_channel(&self, guild_id: u64, channel_id: u64) {
        self.state.lock().unwrap().channels.insert(channel_id, guild_id);
    }

    pub fn remove_channel(&self, channel_id: u64) {
        self.state.lock().unwrap().channels.remove(&channel_id);
    }

    pub fn role_id(&self, guild_id: u64, name: &str) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .roles
            .get(&(guild_id, name.to_string()))
            .copied()
    }

    pub fn holders(&self, role_id: u64) -> HashSet<u64> {
        self.state
            .lock()
            .unwrap()
            .role_members
            .get(&role_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn give_role(&self, role_id: u64, user_id: u64) {
        self.state
            .lock()
            .unwrap()
            .role_members
            .entry(role_id)
            .or_default()
            .insert(user_id);
    }

    pub fn messages(&self) -> Vec<(u64, OutgoingMessage)> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn dms(&self) -> Vec<(u64, OutgoingMessage)> {
        self.state.lock().unwrap().dms.clone()
    }

    pub fn set<F: FnOnce(&mut MockNotifierState)>(&self, f: F) {
        f(&mut self.state.lock().unwrap());
    }
}

fn failure(message: &str) -> NotifyError {
    NotifyError::Platform(message.to_string().into())
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn bot_user_id(&self) -> Result<u64, NotifyError> {
        Ok(BOT_ID)
    }

    async fn resolve_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<u64>, NotifyError> {
        let state = self.state.lock().unwrap();
        Ok(match state.channels.get(&channel_id) {
            Some(owner) if *owner == guild_id => Some(channel_id),
            _ => None,
        })
    }

    async fn ensure_role(&self, guild_id: u64, name: &str) -> Result<u64, NotifyError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_ensure_role {
            return Err(failure("missing permissions"));
        }
        if let Some(id) = state.roles.get(&(guild_id, name.to_string())) {
            return Ok(*id);
        }
        state.next_role_id += 1;
        let id = state.next_role_id;
        state.roles.insert((guild_id, name.to_string()), id);
        Ok(id)
    }

    async fn role_members(&self, _guild_id: u64, role_id: u64) -> Result<Vec<u64>, NotifyError> {
        Ok(self.holders(role_id).into_iter().collect())
    }

    async fn add_role(
        &self,
        _guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), NotifyError> {
        self.give_role(role_id, user_id);
        Ok(())
    }

    async fn remove_role(
        &self,
        _guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), NotifyError> {
        if let Some(members) = self.state.lock().unwrap().role_members.get_mut(&role_id) {
            members.remove(&user_id);
        }
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutgoingMessage,
    ) -> Result<(), NotifyError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(failure("send failed"));
        }
        state.messages.push((channel_id, message.clone()));
        Ok(())
    }

    async fn user_exists(&self, user_id: u64) -> Result<bool, NotifyError> {
        let state = self.state.lock().unwrap();
        if state.fail_user_lookup {
            return Err(failure("gateway unavailable"));
        }
        Ok(!state.missing_users.contains(&user_id))
    }

    async fn send_dm(&self, user_id: u64, message: &OutgoingMessage) -> Result<(), NotifyError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(failure("dm failed"));
        }
        state.dms.push((user_id, message.clone()));
        Ok(())
    }
}
