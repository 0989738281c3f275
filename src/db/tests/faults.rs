//! Repository wrappers that delegate to a real repository but fail chosen calls.
//!
//! Call numbers are 1-based and counted per method.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{ActionLogRepo, ConversationRepo, DbError, DbResult, SupportDataRepo},
    models::{
        ActionLogEntry, Conversation, CreateActionLogEntry, CreateConversation, SupportEntity,
    },
};

fn injected(what: &str) -> DbError {
    DbError::Internal(format!("injected {what} failure"))
}

/// Bump `counter` and report whether this call is the one that should fail.
fn hit(counter: &AtomicUsize, fail_at: Option<usize>) -> bool {
    let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
    fail_at == Some(call)
}

pub struct FaultyConversations {
    inner: Arc<dyn ConversationRepo>,
    fail_archive_at: Option<usize>,
    fail_delete_at: Option<usize>,
    archives: AtomicUsize,
    deletes: AtomicUsize,
}

impl FaultyConversations {
    pub fn failing_archive(inner: Arc<dyn ConversationRepo>, at: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_archive_at: Some(at),
            fail_delete_at: None,
            archives: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        })
    }

    pub fn failing_delete(inner: Arc<dyn ConversationRepo>, at: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_archive_at: None,
            fail_delete_at: Some(at),
            archives: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ConversationRepo for FaultyConversations {
    async fn create(&self, input: CreateConversation) -> DbResult<Conversation> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Conversation>> {
        self.inner.get_by_id(id).await
    }

    async fn list_unarchived_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Conversation>> {
        self.inner.list_unarchived_before(cutoff, limit).await
    }

    async fn archive(&self, id: Uuid, at: DateTime<Utc>) -> DbResult<()> {
        if hit(&self.archives, self.fail_archive_at) {
            return Err(injected("archive"));
        }
        self.inner.archive(id, at).await
    }

    async fn list_archived_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Conversation>> {
        self.inner.list_archived_before(cutoff, limit).await
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        if hit(&self.deletes, self.fail_delete_at) {
            return Err(injected("delete"));
        }
        self.inner.delete(id).await
    }

    async fn list_recent(&self, limit: u32) -> DbResult<Vec<Conversation>> {
        self.inner.list_recent(limit).await
    }
}

pub struct FaultyActionLogs {
    inner: Arc<dyn ActionLogRepo>,
    fail_delete_at: Option<usize>,
    deletes: AtomicUsize,
}

impl FaultyActionLogs {
    pub fn failing_delete(inner: Arc<dyn ActionLogRepo>, at: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_delete_at: Some(at),
            deletes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ActionLogRepo for FaultyActionLogs {
    async fn create(&self, input: CreateActionLogEntry) -> DbResult<ActionLogEntry> {
        self.inner.create(input).await
    }

    async fn list_recent(&self, limit: u32) -> DbResult<Vec<ActionLogEntry>> {
        self.inner.list_recent(limit).await
    }

    async fn list_ids_before(&self, cutoff: DateTime<Utc>, limit: u32) -> DbResult<Vec<Uuid>> {
        self.inner.list_ids_before(cutoff, limit).await
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        if hit(&self.deletes, self.fail_delete_at) {
            return Err(injected("delete"));
        }
        self.inner.delete(id).await
    }
}

pub struct FaultySupportData {
    inner: Arc<dyn SupportDataRepo>,
    /// Fail the Nth `list_ids` call for this kind.
    fail_list: Option<(SupportEntity, usize)>,
    fail_exists: bool,
    lists: AtomicUsize,
}

impl FaultySupportData {
    pub fn failing_list(inner: Arc<dyn SupportDataRepo>, kind: SupportEntity, at: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_list: Some((kind, at)),
            fail_exists: false,
            lists: AtomicUsize::new(0),
        })
    }

    pub fn failing_exists(inner: Arc<dyn SupportDataRepo>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_list: None,
            fail_exists: true,
            lists: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SupportDataRepo for FaultySupportData {
    async fn list_ids(&self, kind: SupportEntity, limit: u32) -> DbResult<Vec<Uuid>> {
        if let Some((failing_kind, at)) = self.fail_list
            && failing_kind == kind
            && hit(&self.lists, Some(at))
        {
            return Err(injected("list"));
        }
        self.inner.list_ids(kind, limit).await
    }

    async fn delete(&self, kind: SupportEntity, id: Uuid) -> DbResult<()> {
        self.inner.delete(kind, id).await
    }

    async fn exists_any(&self, kind: SupportEntity) -> DbResult<bool> {
        if self.fail_exists {
            return Err(injected("exists"));
        }
        self.inner.exists_any(kind).await
    }

    async fn count(&self, kind: SupportEntity) -> DbResult<i64> {
        self.inner.count(kind).await
    }
}
