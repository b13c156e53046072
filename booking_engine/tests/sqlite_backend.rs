//! Integration tests for the SQLite backend, run against a throwaway database file per test.

use bms_common::{EmailAddress, Secret};
use booking_engine::{
    db_types::{
        EventDetails,
        EventStatus,
        EventUpdate,
        NewCustomer,
        NewEvent,
        NewRole,
        NewStaff,
        NewStore,
        Permission,
        Sex,
        StaffUpdate,
        StoreUpdate,
    },
    test_utils::{prepare_test_env, random_db_path},
    traits::{AuthApiError, CustomerApiError, EventApiError, RoleApiError, StaffApiError, StoreApiError},
    AuthApi,
    CustomerApi,
    EventApi,
    RoleApi,
    SqliteDatabase,
    StaffApi,
    StoreApi,
};
use chrono::{Duration, TimeZone, Utc};

#[tokio::test]
async fn authenticate_and_rotate_password() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let store = StoreApi::new(db.clone()).create_store(&new_store("Sakura Salon")).await.unwrap();
    let role = RoleApi::new(db.clone()).create_role(store.id, &NewRole { name: "manager".to_string() }).await.unwrap();
    let email: EmailAddress = "miyuki@example.com".parse().unwrap();
    let staff = StaffApi::new(db.clone())
        .create_staff(store.id, &new_staff(role.id, "Miyuki", &email, "correct horse"))
        .await
        .unwrap();

    let auth = AuthApi::new(db);
    let principal = auth.authenticate(&email, "correct horse").await.unwrap();
    assert_eq!(principal.id, staff.staff.id);

    // A wrong password and an unknown email must fail with the same error.
    let err = auth.authenticate(&email, "wrong password").await.unwrap_err();
    assert!(matches!(err, AuthApiError::InvalidCredentials));
    let ghost: EmailAddress = "ghost@example.com".parse().unwrap();
    let err = auth.authenticate(&ghost, "correct horse").await.unwrap_err();
    assert!(matches!(err, AuthApiError::InvalidCredentials));

    auth.set_password(&email, "battery staple").await.unwrap();
    assert!(auth.authenticate(&email, "correct horse").await.is_err());
    auth.authenticate(&email, "battery staple").await.unwrap();

    let missing: EmailAddress = "nobody@example.com".parse().unwrap();
    let err = auth.set_password(&missing, "whatever").await.unwrap_err();
    assert!(matches!(err, AuthApiError::EmailNotFound));
}

#[tokio::test]
async fn federated_provisioning_is_idempotent() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let auth = AuthApi::new(db);

    let email: EmailAddress = "sso.user@example.com".parse().unwrap();
    let first = auth.resolve_or_provision("auth0|abc123", Some(&email), Some("SSO User")).await.unwrap();
    assert_eq!(first.store_id, None);
    assert_eq!(first.role_id, None);
    assert_eq!(first.external_id.as_deref(), Some("auth0|abc123"));

    // Seeing the same subject again resolves to the same record.
    let second = auth.resolve_or_provision("auth0|abc123", Some(&email), Some("SSO User")).await.unwrap();
    assert_eq!(second.id, first.id);

    // Unassigned staff carry no roles and no permissions.
    let access = auth.access_for_staff(first.id).await.unwrap();
    assert!(access.roles.is_empty());
    assert!(access.permissions.is_empty());

    // The provisioned account has no local credential, so password login cannot work.
    let err = auth.authenticate(&email, "anything").await.unwrap_err();
    assert!(matches!(err, AuthApiError::InvalidCredentials));

    // An email subject that matches nothing must not provision a record.
    let err = auth.resolve_or_provision("stranger@example.com", None, None).await.unwrap_err();
    assert!(matches!(err, AuthApiError::StaffNotFound));
}

#[tokio::test]
async fn role_permissions_grant_access() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let store = StoreApi::new(db.clone()).create_store(&new_store("Sakura Salon")).await.unwrap();
    let roles = RoleApi::new(db.clone());
    let owner = roles.create_role(store.id, &NewRole { name: "owner".to_string() }).await.unwrap();
    let full = roles
        .replace_role_permissions(store.id, owner.id, &[Permission::General, Permission::Settings, Permission::Reports])
        .await
        .unwrap();
    assert_eq!(full.permissions.len(), 3);

    let email: EmailAddress = "aiko@example.com".parse().unwrap();
    let staff =
        StaffApi::new(db.clone()).create_staff(store.id, &new_staff(owner.id, "Aiko", &email, "pw")).await.unwrap();

    let auth = AuthApi::new(db.clone());
    let access = auth.access_for_staff(staff.staff.id).await.unwrap();
    assert_eq!(access.roles, vec!["owner".to_string()]);
    assert!(access.grants_all(&[Permission::General, Permission::Settings, Permission::Reports]));

    // Replacing the grants revokes what is no longer in the set.
    let trimmed = roles.replace_role_permissions(store.id, owner.id, &[Permission::General]).await.unwrap();
    assert_eq!(trimmed.permissions.len(), 1);
    let access = auth.access_for_staff(staff.staff.id).await.unwrap();
    assert!(access.grants_all(&[Permission::General]));
    assert!(!access.grants_all(&[Permission::Settings]));

    // The catalogue itself is fixed reference data.
    let catalogue = roles.fetch_permission_catalogue().await.unwrap();
    assert_eq!(catalogue.len(), 3);

    // Duplicate role names are rejected within a store but fine across stores.
    let err = roles.create_role(store.id, &NewRole { name: "owner".to_string() }).await.unwrap_err();
    assert!(matches!(err, RoleApiError::DuplicateRoleName(_)));
    let other = StoreApi::new(db).create_store(&new_store("Ume Annex")).await.unwrap();
    roles.create_role(other.id, &NewRole { name: "owner".to_string() }).await.unwrap();
}

#[tokio::test]
async fn event_lifecycle_keeps_duration_in_step() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let store = StoreApi::new(db.clone()).create_store(&new_store("Sakura Salon")).await.unwrap();
    let role = RoleApi::new(db.clone()).create_role(store.id, &NewRole { name: "stylist".to_string() }).await.unwrap();
    let email: EmailAddress = "kenta@example.com".parse().unwrap();
    let staff =
        StaffApi::new(db.clone()).create_staff(store.id, &new_staff(role.id, "Kenta", &email, "pw")).await.unwrap();
    let customer =
        CustomerApi::new(db.clone()).create_customer(store.id, &new_customer("Hanako")).await.unwrap();

    let events = EventApi::new(db);
    let from_at = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
    let booking = NewEvent {
        customer_id: customer.customer.id,
        title: "Cut and colour".to_string(),
        from_at,
        to_at: from_at + Duration::minutes(90),
        note: Some("First visit".to_string()),
        details: Some(EventDetails { overview: "Full treatment".to_string() }),
        status: EventStatus::Active,
        staff_ids: vec![staff.staff.id],
    };
    let event = events.create_event(store.id, &booking).await.unwrap();
    assert_eq!(event.event.duration_by_minutes, 90);
    assert_eq!(event.staff.len(), 1);
    assert_eq!(event.staff[0].staff.id, staff.staff.id);

    // A window that ends before it starts is rejected outright.
    let backwards = NewEvent { from_at: from_at + Duration::minutes(90), to_at: from_at, ..booking.clone() };
    let err = events.create_event(store.id, &backwards).await.unwrap_err();
    assert!(matches!(err, EventApiError::InvalidTimeWindow(_)));

    // Moving one end of the window recomputes the duration.
    let shorter = EventUpdate { to_at: Some(from_at + Duration::minutes(45)), ..Default::default() };
    let updated = events.update_event(store.id, event.event.id, &shorter).await.unwrap();
    assert_eq!(updated.event.duration_by_minutes, 45);

    // A single-bound update that breaks the window is caught against the stored bound.
    let broken = EventUpdate { to_at: Some(from_at - Duration::minutes(5)), ..Default::default() };
    let err = events.update_event(store.id, event.event.id, &broken).await.unwrap_err();
    assert!(matches!(err, EventApiError::InvalidTimeWindow(_)));

    // Empty updates are refused before touching the database.
    let err = events.update_event(store.id, event.event.id, &EventUpdate::default()).await.unwrap_err();
    assert!(matches!(err, EventApiError::EmptyUpdate));

    let cancel = EventUpdate { status: Some(EventStatus::Canceled), ..Default::default() };
    let canceled = events.update_event(store.id, event.event.id, &cancel).await.unwrap();
    assert_eq!(canceled.event.status, EventStatus::Canceled);

    events.delete_event(store.id, event.event.id).await.unwrap();
    assert!(events.fetch_event(store.id, event.event.id).await.unwrap().is_none());
    let err = events.delete_event(store.id, event.event.id).await.unwrap_err();
    assert!(matches!(err, EventApiError::EventNotFound(_)));
}

#[tokio::test]
async fn records_are_scoped_to_their_store() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let stores = StoreApi::new(db.clone());
    let store_a = stores.create_store(&new_store("Sakura Salon")).await.unwrap();
    let store_b = stores.create_store(&new_store("Ume Annex")).await.unwrap();
    let role_a =
        RoleApi::new(db.clone()).create_role(store_a.id, &NewRole { name: "stylist".to_string() }).await.unwrap();

    let staff_api = StaffApi::new(db.clone());
    let email: EmailAddress = "rin@example.com".parse().unwrap();
    let staff = staff_api.create_staff(store_a.id, &new_staff(role_a.id, "Rin", &email, "pw")).await.unwrap();

    // Staff of store A are invisible through store B.
    assert!(staff_api.fetch_staff(store_b.id, staff.staff.id).await.unwrap().is_none());
    assert!(staff_api.fetch_staff_for_store(store_b.id).await.unwrap().is_empty());

    // A role belonging to store A cannot be attached to staff of store B.
    let other_mail: EmailAddress = "newcomer@example.com".parse().unwrap();
    let err = staff_api
        .create_staff(store_b.id, &new_staff(role_a.id, "Newcomer", &other_mail, "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, StaffApiError::RoleNotFound));

    // Deleting through the wrong store does nothing.
    let err = staff_api.delete_staff(store_b.id, staff.staff.id).await.unwrap_err();
    assert!(matches!(err, StaffApiError::StaffNotFound(_)));
    assert!(staff_api.fetch_staff(store_a.id, staff.staff.id).await.unwrap().is_some());

    // Customers follow the same rule.
    let customers = CustomerApi::new(db);
    let customer = customers.create_customer(store_a.id, &new_customer("Hanako")).await.unwrap();
    assert!(customers.fetch_customer(store_b.id, customer.customer.id).await.unwrap().is_none());
    let err = customers.delete_customer(store_b.id, customer.customer.id).await.unwrap_err();
    assert!(matches!(err, CustomerApiError::CustomerNotFound(_)));
}

#[tokio::test]
async fn staff_administration_round_trip() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let store = StoreApi::new(db.clone()).create_store(&new_store("Sakura Salon")).await.unwrap();
    let roles = RoleApi::new(db.clone());
    let stylist = roles.create_role(store.id, &NewRole { name: "stylist".to_string() }).await.unwrap();
    let manager = roles.create_role(store.id, &NewRole { name: "manager".to_string() }).await.unwrap();

    let staff_api = StaffApi::new(db);
    let email: EmailAddress = "sora@example.com".parse().unwrap();
    let staff = staff_api.create_staff(store.id, &new_staff(stylist.id, "Sora", &email, "pw")).await.unwrap();
    let profile = staff.profile.as_ref().expect("profile should exist");
    assert_eq!(profile.mail_address, email);

    // The same email cannot be registered twice.
    let err = staff_api.create_staff(store.id, &new_staff(stylist.id, "Copy", &email, "pw")).await.unwrap_err();
    assert!(matches!(err, StaffApiError::DuplicateEmail));

    // Admin updates may change the role.
    let promote = StaffUpdate { role_id: Some(manager.id), ..Default::default() };
    let updated = staff_api.update_staff(store.id, staff.staff.id, &promote).await.unwrap();
    assert_eq!(updated.staff.role_id, Some(manager.id));

    // Self-service updates silently drop role changes.
    let sneaky = StaffUpdate {
        role_id: Some(stylist.id),
        name: Some("Sora Aoyama".to_string()),
        ..Default::default()
    };
    let updated = staff_api.update_my_profile(staff.staff.id, &sneaky).await.unwrap();
    assert_eq!(updated.staff.role_id, Some(manager.id));
    assert_eq!(updated.profile.as_ref().unwrap().name, "Sora Aoyama");

    // A role-only payload has nothing left after the role is stripped.
    let nothing_left = StaffUpdate { role_id: Some(stylist.id), ..Default::default() };
    let err = staff_api.update_my_profile(staff.staff.id, &nothing_left).await.unwrap_err();
    assert!(matches!(err, StaffApiError::EmptyUpdate));

    staff_api.delete_staff(store.id, staff.staff.id).await.unwrap();
    assert!(staff_api.fetch_staff(store.id, staff.staff.id).await.unwrap().is_none());
}

#[tokio::test]
async fn store_updates_apply_partially() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let stores = StoreApi::new(db);
    let store = stores.create_store(&new_store("Sakura Salon")).await.unwrap();

    let update = StoreUpdate { phone_number: Some("0398765432".to_string()), ..Default::default() };
    let updated = stores.update_store(store.id, &update).await.unwrap();
    assert_eq!(updated.name, "Sakura Salon");
    assert_eq!(updated.phone_number, "0398765432");

    let err = stores.update_store(store.id, &StoreUpdate::default()).await.unwrap_err();
    assert!(matches!(err, StoreApiError::EmptyUpdate));

    let err = stores.update_store(9999, &update).await.unwrap_err();
    assert!(matches!(err, StoreApiError::StoreNotFound(9999)));
}

fn new_store(name: &str) -> NewStore {
    NewStore {
        name: name.to_string(),
        name_ruby: String::new(),
        postal_code: "1500001".to_string(),
        prefecture: "Tokyo".to_string(),
        street: "Jingumae".to_string(),
        address: "1-2-3".to_string(),
        building: String::new(),
        phone_number: "0312345678".to_string(),
    }
}

fn new_staff(role_id: i64, name: &str, email: &EmailAddress, password: &str) -> NewStaff {
    NewStaff {
        role_id,
        name: name.to_string(),
        name_ruby: String::new(),
        mail_address: email.clone(),
        password: Secret::new(password.to_string()),
    }
}

fn new_customer(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        name_ruby: String::new(),
        mail_address: "customer@example.com".parse().unwrap(),
        sex: Sex::Unknown,
        phone_number: "09012345678".to_string(),
        postal_code: "1500001".to_string(),
        prefecture: "Tokyo".to_string(),
        street: "Jingumae".to_string(),
        address: "4-5-6".to_string(),
        building: String::new(),
    }
}
