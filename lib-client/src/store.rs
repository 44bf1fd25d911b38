use crate::error::*;
use async_trait::async_trait;
use libcommon::SessionTokenRecord;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Per-session storage of the token record, backed by whatever session
/// mechanism the surrounding web framework provides. `replace` swaps the
/// whole record atomically: a concurrent `load` observes either the prior
/// record or the replacement, never a mix of the two.
#[async_trait]
pub trait SessionStore {
  async fn load(&self, session_id: &str) -> AuthResult<Option<SessionTokenRecord>>;
  async fn replace(&self, session_id: &str, record: SessionTokenRecord) -> AuthResult<()>;
  async fn remove(&self, session_id: &str) -> AuthResult<()>;
}

/// In-memory session store for tests and single-process deployments
#[derive(Default)]
pub struct MemorySessionStore {
  records: RwLock<HashMap<String, SessionTokenRecord>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
  async fn load(&self, session_id: &str) -> AuthResult<Option<SessionTokenRecord>> {
    let records_lock = self.records.read().await;
    Ok(records_lock.get(session_id).cloned())
  }

  async fn replace(&self, session_id: &str, record: SessionTokenRecord) -> AuthResult<()> {
    let mut records_lock = self.records.write().await;
    records_lock.insert(session_id.to_string(), record);
    Ok(())
  }

  async fn remove(&self, session_id: &str) -> AuthResult<()> {
    let mut records_lock = self.records.write().await;
    records_lock.remove(session_id);
    Ok(())
  }
}
