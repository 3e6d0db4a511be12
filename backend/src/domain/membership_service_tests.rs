//! Tests for the membership service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{MockHouseholdRepository, MockUserRepository};
use crate::outbound::memory::InMemoryHouseholdRepository;
use crate::domain::{
    Address, Capacity, DisplayName, ErrorCode, HouseholdName, PasswordHash, Username,
};
use rstest::{fixture, rstest};

type Service = MembershipService<MockUserRepository, MockHouseholdRepository>;

fn make_service(users: MockUserRepository, households: MockHouseholdRepository) -> Service {
    MembershipService::new(Arc::new(users), Arc::new(households))
}

fn token(raw: &str) -> HouseholdToken {
    HouseholdToken::new(raw).expect("valid token")
}

fn user_pointing_at(household_token: Option<HouseholdToken>) -> User {
    User::new(
        UserId::random(),
        Username::new("ada").expect("username"),
        DisplayName::new("Ada Lovelace").expect("display name"),
        PasswordHash::new("salt$digest"),
    )
    .with_household_token(household_token)
}

fn household_of(household_token: HouseholdToken, founder: &UserId) -> Household {
    Household::found(
        HouseholdName::new("Canal Saint-Martin").expect("name"),
        Address::new("3 quai de Valmy").expect("address"),
        Capacity::new(3).expect("capacity"),
        household_token,
        founder.clone(),
    )
}

fn expect_user(users: &mut MockUserRepository, user: &User) {
    let found = user.clone();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(found)));
}

#[fixture]
fn create_request() -> CreateHouseholdRequest {
    CreateHouseholdRequest {
        creator: UserId::random(),
        name: HouseholdName::new("Canal Saint-Martin").expect("name"),
        address: Address::new("3 quai de Valmy").expect("address"),
        capacity: Capacity::new(3).expect("capacity"),
    }
}

#[rstest]
#[tokio::test]
async fn create_household_rejects_unknown_creator(create_request: CreateHouseholdRequest) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().times(1).return_once(|_| Ok(None));
    let mut households = MockHouseholdRepository::new();
    households.expect_insert().never();

    let error = make_service(users, households)
        .create_household(create_request)
        .await
        .expect_err("unknown creator");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.detail_code(), Some("user_not_found"));
}

#[rstest]
#[tokio::test]
async fn create_household_rejects_taken_name(create_request: CreateHouseholdRequest) {
    let creator = user_pointing_at(None);
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &creator);
    let existing = household_of(token("AAAAAAAAAAAAAAAA"), &UserId::random());
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_name()
        .times(1)
        .return_once(move |_| Ok(Some(existing)));
    households.expect_insert().never();

    let error = make_service(users, households)
        .create_household(create_request)
        .await
        .expect_err("duplicate name");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.detail_code(), Some("duplicate_name"));
}

#[rstest]
#[tokio::test]
async fn create_household_retries_after_token_clash(create_request: CreateHouseholdRequest) {
    let creator = user_pointing_at(None);
    let creator_id = creator.id().clone();
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &creator);
    users
        .expect_update()
        .withf(|user: &User| user.household_token().is_some())
        .times(1)
        .return_once(|_| Ok(()));

    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_name().return_once(|_| Ok(None));
    households.expect_find_by_member().return_once(|_| Ok(None));
    let mut seq = mockall::Sequence::new();
    households
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|household| {
            Err(HouseholdPersistenceError::duplicate_token(
                household.token().as_ref(),
            ))
        });
    households
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let household = make_service(users, households)
        .create_household(CreateHouseholdRequest {
            creator: creator_id.clone(),
            ..create_request
        })
        .await
        .expect("household created");

    assert_eq!(household.member_ids(), [creator_id].as_slice());
}

#[rstest]
#[tokio::test]
async fn create_household_gives_up_after_repeated_clashes(create_request: CreateHouseholdRequest) {
    let creator = user_pointing_at(None);
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &creator);
    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_name().return_once(|_| Ok(None));
    households.expect_find_by_member().return_once(|_| Ok(None));
    households
        .expect_insert()
        .times(TOKEN_ATTEMPTS)
        .returning(|household| {
            Err(HouseholdPersistenceError::duplicate_token(
                household.token().as_ref(),
            ))
        });

    let error = make_service(users, households)
        .create_household(create_request)
        .await
        .expect_err("token space exhausted");

    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn create_household_survives_pointer_write_failure(create_request: CreateHouseholdRequest) {
    let creator = user_pointing_at(None);
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &creator);
    users
        .expect_update()
        .times(1)
        .return_once(|_| Err(UserPersistenceError::query("disk full")));
    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_name().return_once(|_| Ok(None));
    households.expect_find_by_member().return_once(|_| Ok(None));
    households.expect_insert().times(1).return_once(|_| Ok(()));

    let household = make_service(users, households)
        .create_household(create_request)
        .await
        .expect("household still returned");

    assert_eq!(household.member_ids().len(), 1);
}

#[rstest]
#[tokio::test]
async fn join_household_reports_existing_membership() {
    let joiner = user_pointing_at(None);
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &joiner);
    users.expect_update().never();
    let listed = household_of(token("BBBBBBBBBBBBBBBB"), joiner.id());
    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_member().return_once(|_| Ok(None));
    households
        .expect_add_member()
        .times(1)
        .return_once(move |_, _| Ok(Some(MemberAddition::AlreadyMember(listed))));

    let error = make_service(users, households)
        .join_household(joiner.id(), &token("BBBBBBBBBBBBBBBB"))
        .await
        .expect_err("second join");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.detail_code(), Some("already_member"));
}

#[rstest]
#[tokio::test]
async fn join_household_rejects_unknown_token() {
    let joiner = user_pointing_at(None);
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &joiner);
    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_member().return_once(|_| Ok(None));
    households
        .expect_add_member()
        .times(1)
        .return_once(|_, _| Ok(None));

    let error = make_service(users, households)
        .join_household(joiner.id(), &token("CCCCCCCCCCCCCCCC"))
        .await
        .expect_err("unknown household");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.detail_code(), Some("household_not_found"));
}

#[rstest]
#[tokio::test]
async fn join_household_leaves_previous_household() {
    let previous = token("PPPPPPPPPPPPPPPP");
    let next = token("NNNNNNNNNNNNNNNN");
    let joiner = user_pointing_at(Some(previous.clone()));
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &joiner);
    let expected_next = next.clone();
    users
        .expect_update()
        .withf(move |user: &User| user.household_token() == Some(&expected_next))
        .times(1)
        .return_once(|_| Ok(()));

    let mut joined = household_of(next.clone(), &UserId::random());
    joined.add_member(joiner.id().clone());
    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_member().return_once(|_| Ok(None));
    households
        .expect_add_member()
        .times(1)
        .return_once(move |_, _| Ok(Some(MemberAddition::Added(joined))));
    let expected_previous = previous.clone();
    households
        .expect_remove_member()
        .withf(move |household_token, _| *household_token == expected_previous)
        .times(1)
        .return_once(|_, _| Ok(None));

    let household = make_service(users, households)
        .join_household(joiner.id(), &next)
        .await
        .expect("joined");

    assert!(household.is_member(joiner.id()));
}

#[rstest]
#[tokio::test]
async fn resolve_clears_dangling_pointer() {
    let user = user_pointing_at(Some(token("DDDDDDDDDDDDDDDD")));
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &user);
    users
        .expect_update()
        .withf(|user: &User| user.household_token().is_none())
        .times(1)
        .return_once(|_| Ok(()));
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_token()
        .times(1)
        .return_once(|_| Ok(None));
    households
        .expect_find_by_member()
        .times(1)
        .return_once(|_| Ok(None));

    let resolved = make_service(users, households)
        .current_household(user.id())
        .await
        .expect("resolve succeeds");

    assert!(resolved.is_none());
}

#[rstest]
#[tokio::test]
async fn resolve_clears_pointer_to_household_without_the_user() {
    let household_token = token("EEEEEEEEEEEEEEEE");
    let user = user_pointing_at(Some(household_token.clone()));
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &user);
    users
        .expect_update()
        .withf(|user: &User| user.household_token().is_none())
        .times(1)
        .return_once(|_| Ok(()));
    let stranger_household = household_of(household_token, &UserId::random());
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_token()
        .return_once(move |_| Ok(Some(stranger_household)));
    households.expect_find_by_member().return_once(|_| Ok(None));

    let resolved = make_service(users, households)
        .current_household(user.id())
        .await
        .expect("resolve succeeds");

    assert!(resolved.is_none());
}

#[rstest]
#[tokio::test]
async fn resolve_without_pointer_or_membership_writes_nothing() {
    let user = user_pointing_at(None);
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &user);
    users.expect_update().never();
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_member()
        .times(1)
        .return_once(|_| Ok(None));

    let resolved = make_service(users, households)
        .current_household(user.id())
        .await
        .expect("resolve succeeds");

    assert!(resolved.is_none());
}

#[rstest]
#[tokio::test]
async fn resolve_rederives_pointer_from_membership() {
    let user = user_pointing_at(None);
    let listed = household_of(token("FFFFFFFFFFFFFFFF"), user.id());
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &user);
    users
        .expect_update()
        .withf(|user: &User| {
            user.household_token().map(AsRef::as_ref) == Some("FFFFFFFFFFFFFFFF")
        })
        .times(1)
        .return_once(|_| Ok(()));
    let mut households = MockHouseholdRepository::new();
    let returned = listed.clone();
    households
        .expect_find_by_member()
        .return_once(move |_| Ok(Some(returned)));

    let resolved = make_service(users, households)
        .current_household(user.id())
        .await
        .expect("resolve succeeds");

    assert_eq!(resolved, Some(listed));
}

#[rstest]
#[tokio::test]
async fn resolve_rejects_unknown_user() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));

    let error = make_service(users, MockHouseholdRepository::new())
        .current_household(&UserId::random())
        .await
        .expect_err("unknown user");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn leave_is_a_no_op_for_unknown_users() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));
    users.expect_update().never();
    let mut households = MockHouseholdRepository::new();
    households.expect_remove_member().never();

    make_service(users, households)
        .leave_household(&UserId::random())
        .await
        .expect("no-op");
}

#[rstest]
#[tokio::test]
async fn leave_succeeds_when_household_is_gone() {
    let user = user_pointing_at(Some(token("GGGGGGGGGGGGGGGG")));
    let mut users = MockUserRepository::new();
    expect_user(&mut users, &user);
    users
        .expect_update()
        .withf(|user: &User| user.household_token().is_none())
        .times(1)
        .return_once(|_| Ok(()));
    let mut households = MockHouseholdRepository::new();
    households.expect_find_by_member().return_once(|_| Ok(None));
    households
        .expect_remove_member()
        .times(1)
        .return_once(|_, _| Ok(None));

    make_service(users, households)
        .leave_household(user.id())
        .await
        .expect("leave succeeds");
}

#[rstest]
#[tokio::test]
async fn roster_reports_members_missing_from_identity_store() {
    let user = user_pointing_at(Some(token("HHHHHHHHHHHHHHHH")));
    let ghost = UserId::random();
    let mut household = household_of(token("HHHHHHHHHHHHHHHH"), user.id());
    household.add_member(ghost.clone());

    let mut users = MockUserRepository::new();
    let known = user.clone();
    users
        .expect_find_by_id()
        .returning(move |id| Ok((id == known.id()).then(|| known.clone())));
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_token()
        .return_once(move |_| Ok(Some(household)));

    let roster = make_service(users, households)
        .household_roster(user.id())
        .await
        .expect("roster")
        .expect("household present");

    assert_eq!(roster.members.len(), 1);
    assert_eq!(roster.missing_member_ids, vec![ghost]);
}

#[rstest]
#[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(UserPersistenceError::query("poisoned"), ErrorCode::InternalError)]
#[tokio::test]
async fn store_failures_map_to_error_codes(
    #[case] failure: UserPersistenceError,
    #[case] expected: ErrorCode,
) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Err(failure));

    let error = make_service(users, MockHouseholdRepository::new())
        .current_household(&UserId::random())
        .await
        .expect_err("store failure");

    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn resolve_follows_member_list_when_pointer_is_stale() {
    let stale = token("JJJJJJJJJJJJJJJJ");
    let listed_token = token("KKKKKKKKKKKKKKKK");
    let user = user_pointing_at(Some(stale.clone()));
    let mut listed = household_of(listed_token.clone(), &UserId::random());
    listed.add_member(user.id().clone());

    let mut users = MockUserRepository::new();
    expect_user(&mut users, &user);
    let expected = listed_token.clone();
    users
        .expect_update()
        .withf(move |user: &User| user.household_token() == Some(&expected))
        .times(1)
        .return_once(|_| Ok(()));
    let stale_household = household_of(stale, &UserId::random());
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_token()
        .return_once(move |_| Ok(Some(stale_household)));
    let returned = listed.clone();
    households
        .expect_find_by_member()
        .times(1)
        .return_once(move |_| Ok(Some(returned)));

    let resolved = make_service(users, households)
        .current_household(user.id())
        .await
        .expect("resolve succeeds");

    assert_eq!(resolved, Some(listed));
}

#[rstest]
#[tokio::test]
async fn second_resolve_of_dangling_pointer_writes_nothing() {
    let user = user_pointing_at(Some(token("LLLLLLLLLLLLLLLL")));
    let cleared = user.clone().with_household_token(None);
    let mut users = MockUserRepository::new();
    let mut seq = mockall::Sequence::new();
    users
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(user)));
    users
        .expect_update()
        .withf(|user: &User| user.household_token().is_none())
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(()));
    let user_id = cleared.id().clone();
    users
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(cleared)));
    let mut households = MockHouseholdRepository::new();
    households
        .expect_find_by_token()
        .times(1)
        .return_once(|_| Ok(None));
    households
        .expect_find_by_member()
        .times(2)
        .returning(|_| Ok(None));
    let service = make_service(users, households);

    let first = service.current_household(&user_id).await.expect("first");
    let second = service.current_household(&user_id).await.expect("second");

    assert!(first.is_none());
    assert!(second.is_none());
}

/// Carol belongs to the first household, then switches to the second while
/// every pointer write fails. The member lists already reflect the switch.
struct FailedSwitch {
    service: MembershipService<MockUserRepository, InMemoryHouseholdRepository>,
    households: Arc<InMemoryHouseholdRepository>,
    carol: UserId,
    next: HouseholdToken,
}

async fn switch_with_failed_pointer_write(users: MockUserRepository, carol: User) -> FailedSwitch {
    let previous = token("MMMMMMMMMMMMMMMM");
    let next = token("NNNNNNNNNNNNNNNN");
    let households = Arc::new(InMemoryHouseholdRepository::new());
    let mut first = household_named("Belleville", previous, &UserId::random());
    first.add_member(carol.id().clone());
    households.insert(&first).await.expect("insert first");
    households
        .insert(&household_named("Bastille", next.clone(), &UserId::random()))
        .await
        .expect("insert second");

    let service = MembershipService::new(Arc::new(users), Arc::clone(&households));
    let joined = service
        .join_household(carol.id(), &next)
        .await
        .expect("join succeeds despite pointer failure");
    assert!(joined.is_member(carol.id()));

    FailedSwitch {
        service,
        households,
        carol: carol.id().clone(),
        next,
    }
}

fn household_named(name: &str, household_token: HouseholdToken, founder: &UserId) -> Household {
    Household::found(
        HouseholdName::new(name).expect("name"),
        Address::new("5 rue de la Roquette").expect("address"),
        Capacity::new(4).expect("capacity"),
        household_token,
        founder.clone(),
    )
}

/// Users whose stored pointer never moves off `carol`'s original household;
/// the first pointer write fails and `then` describes the next one.
fn users_with_failing_switch(carol: &User, then: fn(&User) -> bool) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    expect_user_always(&mut users, carol);
    let mut seq = mockall::Sequence::new();
    users
        .expect_update()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Err(UserPersistenceError::query("disk full")));
    users
        .expect_update()
        .withf(move |user: &User| then(user))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(()));
    users
}

fn expect_user_always(users: &mut MockUserRepository, user: &User) {
    let found = user.clone();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
}

#[rstest]
#[tokio::test]
async fn resolve_after_failed_switch_returns_the_new_household() {
    let carol = user_pointing_at(Some(token("MMMMMMMMMMMMMMMM")));
    let users = users_with_failing_switch(&carol, |user| {
        user.household_token().map(AsRef::as_ref) == Some("NNNNNNNNNNNNNNNN")
    });
    let switch = switch_with_failed_pointer_write(users, carol).await;

    let resolved = switch
        .service
        .current_household(&switch.carol)
        .await
        .expect("resolve succeeds")
        .expect("member list names a household");

    assert_eq!(resolved.token(), &switch.next);
    assert_eq!(resolved.member_ids().len(), 2);
}

#[rstest]
#[tokio::test]
async fn leave_after_failed_switch_leaves_every_household() {
    let carol = user_pointing_at(Some(token("MMMMMMMMMMMMMMMM")));
    let users = users_with_failing_switch(&carol, |user| user.household_token().is_none());
    let switch = switch_with_failed_pointer_write(users, carol).await;

    switch
        .service
        .leave_household(&switch.carol)
        .await
        .expect("leave succeeds");

    let listed = switch
        .households
        .find_by_member(&switch.carol)
        .await
        .expect("lookup");
    assert_eq!(listed, None);
    let next = switch
        .households
        .find_by_token(&switch.next)
        .await
        .expect("lookup")
        .expect("household kept");
    assert_eq!(next.member_ids().len(), 1);
}
