//! In-memory household store with per-household membership locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::domain::ports::{HouseholdPersistenceError, HouseholdRepository, MemberAddition};
use crate::domain::{Household, HouseholdId, HouseholdName, HouseholdToken, UserId};

use super::poisoned;

type Record = Arc<Mutex<Household>>;

#[derive(Debug, Default)]
struct HouseholdTable {
    by_token: HashMap<HouseholdToken, Record>,
    token_by_id: HashMap<HouseholdId, HouseholdToken>,
    token_by_name: HashMap<HouseholdName, HouseholdToken>,
}

/// Household store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryHouseholdRepository {
    table: RwLock<HouseholdTable>,
}

impl InMemoryHouseholdRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table_error() -> HouseholdPersistenceError {
        HouseholdPersistenceError::query(poisoned("household table"))
    }

    fn record_error() -> HouseholdPersistenceError {
        HouseholdPersistenceError::query(poisoned("household record"))
    }

    fn record(&self, token: &HouseholdToken) -> Result<Option<Record>, HouseholdPersistenceError> {
        let table = self.table.read().map_err(|_| Self::table_error())?;
        Ok(table.by_token.get(token).cloned())
    }

    fn snapshot(record: &Record) -> Result<Household, HouseholdPersistenceError> {
        record
            .lock()
            .map(|household| household.clone())
            .map_err(|_| Self::record_error())
    }

    fn snapshot_by_token(
        &self,
        token: Option<HouseholdToken>,
    ) -> Result<Option<Household>, HouseholdPersistenceError> {
        let Some(token) = token else {
            return Ok(None);
        };
        self.record(&token)?
            .map(|record| Self::snapshot(&record))
            .transpose()
    }
}

#[async_trait]
impl HouseholdRepository for InMemoryHouseholdRepository {
    async fn insert(&self, household: &Household) -> Result<(), HouseholdPersistenceError> {
        let mut table = self.table.write().map_err(|_| Self::table_error())?;
        if table.token_by_name.contains_key(household.name()) {
            return Err(HouseholdPersistenceError::duplicate_name(
                household.name().as_ref(),
            ));
        }
        if table.by_token.contains_key(household.token()) {
            return Err(HouseholdPersistenceError::duplicate_token(
                household.token().as_ref(),
            ));
        }
        let token = household.token().clone();
        table.token_by_id.insert(household.id(), token.clone());
        table
            .token_by_name
            .insert(household.name().clone(), token.clone());
        table
            .by_token
            .insert(token, Arc::new(Mutex::new(household.clone())));
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &HouseholdId,
    ) -> Result<Option<Household>, HouseholdPersistenceError> {
        let token = {
            let table = self.table.read().map_err(|_| Self::table_error())?;
            table.token_by_id.get(id).cloned()
        };
        self.snapshot_by_token(token)
    }

    async fn find_by_token(
        &self,
        token: &HouseholdToken,
    ) -> Result<Option<Household>, HouseholdPersistenceError> {
        self.snapshot_by_token(Some(token.clone()))
    }

    async fn find_by_name(
        &self,
        name: &HouseholdName,
    ) -> Result<Option<Household>, HouseholdPersistenceError> {
        let token = {
            let table = self.table.read().map_err(|_| Self::table_error())?;
            table.token_by_name.get(name).cloned()
        };
        self.snapshot_by_token(token)
    }

    async fn find_by_member(
        &self,
        user: &UserId,
    ) -> Result<Option<Household>, HouseholdPersistenceError> {
        let records: Vec<Record> = {
            let table = self.table.read().map_err(|_| Self::table_error())?;
            table.by_token.values().cloned().collect()
        };
        for record in records {
            let household = Self::snapshot(&record)?;
            if household.is_member(user) {
                return Ok(Some(household));
            }
        }
        Ok(None)
    }

    async fn add_member(
        &self,
        token: &HouseholdToken,
        user: &UserId,
    ) -> Result<Option<MemberAddition>, HouseholdPersistenceError> {
        let Some(record) = self.record(token)? else {
            return Ok(None);
        };
        let mut household = record.lock().map_err(|_| Self::record_error())?;
        let addition = if household.add_member(user.clone()) {
            MemberAddition::Added(household.clone())
        } else {
            MemberAddition::AlreadyMember(household.clone())
        };
        Ok(Some(addition))
    }

    async fn remove_member(
        &self,
        token: &HouseholdToken,
        user: &UserId,
    ) -> Result<Option<Household>, HouseholdPersistenceError> {
        let Some(record) = self.record(token)? else {
            return Ok(None);
        };
        let mut household = record.lock().map_err(|_| Self::record_error())?;
        household.remove_member(user);
        Ok(Some(household.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, Capacity};
    use rstest::{fixture, rstest};

    fn household_named(name: &str, founder: &UserId) -> Household {
        Household::found(
            HouseholdName::new(name).expect("name"),
            Address::new("1 place de la Nation").expect("address"),
            Capacity::new(6).expect("capacity"),
            HouseholdToken::generate(),
            founder.clone(),
        )
    }

    #[fixture]
    fn founder() -> UserId {
        UserId::random()
    }

    #[rstest]
    #[tokio::test]
    async fn households_are_found_by_every_key(founder: UserId) {
        let repo = InMemoryHouseholdRepository::new();
        let household = household_named("Nation", &founder);
        repo.insert(&household).await.expect("insert");

        let expected = Some(household.clone());
        assert_eq!(repo.find_by_id(&household.id()).await.expect("id"), expected);
        assert_eq!(
            repo.find_by_token(household.token()).await.expect("token"),
            expected
        );
        assert_eq!(
            repo.find_by_name(household.name()).await.expect("name"),
            expected
        );
        assert_eq!(repo.find_by_member(&founder).await.expect("member"), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn names_are_unique(founder: UserId) {
        let repo = InMemoryHouseholdRepository::new();
        repo.insert(&household_named("Nation", &founder))
            .await
            .expect("insert");

        let error = repo
            .insert(&household_named("Nation", &UserId::random()))
            .await
            .expect_err("duplicate");
        assert_eq!(error, HouseholdPersistenceError::duplicate_name("Nation"));
    }

    #[rstest]
    #[tokio::test]
    async fn second_addition_reports_existing_member(founder: UserId) {
        let repo = InMemoryHouseholdRepository::new();
        let household = household_named("Nation", &founder);
        repo.insert(&household).await.expect("insert");
        let joiner = UserId::random();

        let first = repo
            .add_member(household.token(), &joiner)
            .await
            .expect("add");
        let second = repo
            .add_member(household.token(), &joiner)
            .await
            .expect("add");

        assert!(matches!(first, Some(MemberAddition::Added(_))));
        let Some(MemberAddition::AlreadyMember(after)) = second else {
            panic!("expected existing membership, got {second:?}");
        };
        assert_eq!(after.member_ids().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn membership_changes_on_unknown_households_return_none(founder: UserId) {
        let repo = InMemoryHouseholdRepository::new();
        let token = HouseholdToken::generate();
        assert_eq!(repo.add_member(&token, &founder).await.expect("add"), None);
        assert_eq!(
            repo.remove_member(&token, &founder).await.expect("remove"),
            None
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joins_record_each_user_once(founder: UserId) {
        let repo = Arc::new(InMemoryHouseholdRepository::new());
        let household = household_named("Nation", &founder);
        repo.insert(&household).await.expect("insert");
        let joiners: Vec<UserId> = (0..32).map(|_| UserId::random()).collect();

        let mut tasks = Vec::new();
        for joiner in joiners.iter().cloned() {
            for _ in 0..2 {
                let repo = Arc::clone(&repo);
                let token = household.token().clone();
                let joiner = joiner.clone();
                tasks.push(tokio::spawn(async move {
                    repo.add_member(&token, &joiner).await
                }));
            }
        }
        for task in tasks {
            task.await.expect("join task").expect("add member");
        }

        let stored = repo
            .find_by_token(household.token())
            .await
            .expect("read")
            .expect("present");
        assert_eq!(stored.member_ids().len(), joiners.len() + 1);
        for joiner in &joiners {
            assert_eq!(
                stored.member_ids().iter().filter(|id| *id == joiner).count(),
                1
            );
        }
    }
}
