//! In-memory poll store with per-poll vote locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::domain::ports::{PollPersistenceError, PollRepository};
use crate::domain::{Poll, PollId, PollTitle, UserId};

use super::poisoned;

type Record = Arc<Mutex<Poll>>;

#[derive(Debug, Default)]
struct PollTable {
    by_id: HashMap<PollId, Record>,
    id_by_title: HashMap<PollTitle, PollId>,
}

/// Poll store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryPollRepository {
    table: RwLock<PollTable>,
}

impl InMemoryPollRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table_error() -> PollPersistenceError {
        PollPersistenceError::query(poisoned("poll table"))
    }

    fn record_error() -> PollPersistenceError {
        PollPersistenceError::query(poisoned("poll record"))
    }

    fn record(&self, id: &PollId) -> Result<Option<Record>, PollPersistenceError> {
        let table = self.table.read().map_err(|_| Self::table_error())?;
        Ok(table.by_id.get(id).cloned())
    }

    fn existing(&self, id: &PollId) -> Result<Record, PollPersistenceError> {
        self.record(id)?
            .ok_or_else(|| PollPersistenceError::not_found(id.to_string()))
    }

    fn snapshot(record: &Record) -> Result<Poll, PollPersistenceError> {
        record
            .lock()
            .map(|poll| poll.clone())
            .map_err(|_| Self::record_error())
    }
}

#[async_trait]
impl PollRepository for InMemoryPollRepository {
    async fn insert(&self, poll: &Poll) -> Result<(), PollPersistenceError> {
        let mut table = self.table.write().map_err(|_| Self::table_error())?;
        if table.id_by_title.contains_key(poll.title()) {
            return Err(PollPersistenceError::duplicate_title(poll.title().as_ref()));
        }
        table.id_by_title.insert(poll.title().clone(), poll.id());
        table
            .by_id
            .insert(poll.id(), Arc::new(Mutex::new(poll.clone())));
        Ok(())
    }

    async fn find_by_id(&self, id: &PollId) -> Result<Option<Poll>, PollPersistenceError> {
        self.record(id)?
            .map(|record| Self::snapshot(&record))
            .transpose()
    }

    async fn find_by_title(
        &self,
        title: &PollTitle,
    ) -> Result<Option<Poll>, PollPersistenceError> {
        let record = {
            let table = self.table.read().map_err(|_| Self::table_error())?;
            table
                .id_by_title
                .get(title)
                .and_then(|id| table.by_id.get(id))
                .cloned()
        };
        record.map(|record| Self::snapshot(&record)).transpose()
    }

    async fn list(&self) -> Result<Vec<Poll>, PollPersistenceError> {
        let records: Vec<Record> = {
            let table = self.table.read().map_err(|_| Self::table_error())?;
            table.by_id.values().cloned().collect()
        };
        let mut polls = records
            .iter()
            .map(Self::snapshot)
            .collect::<Result<Vec<_>, _>>()?;
        polls.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(polls)
    }

    async fn cast_vote(
        &self,
        id: &PollId,
        voter: &UserId,
        option: &str,
    ) -> Result<Poll, PollPersistenceError> {
        let record = self.existing(id)?;
        let mut poll = record.lock().map_err(|_| Self::record_error())?;
        poll.cast_vote(voter, option)
            .map_err(|unknown| PollPersistenceError::unknown_option(unknown.0))?;
        Ok(poll.clone())
    }

    async fn withdraw_vote(
        &self,
        id: &PollId,
        voter: &UserId,
        option: &str,
    ) -> Result<Poll, PollPersistenceError> {
        let record = self.existing(id)?;
        let mut poll = record.lock().map_err(|_| Self::record_error())?;
        poll.withdraw_vote(voter, option);
        Ok(poll.clone())
    }
}
