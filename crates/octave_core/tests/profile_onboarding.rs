use octave_core::model::celestial::{BirthData, SovereignWindow, UserRole};
use octave_core::model::intention::EnergyOctave;
use octave_core::model::profile::ProfilePatch;
use octave_core::service::paths;
use octave_core::{
    AuthUser, DocumentStore, DomainStore, ManualClock, OnboardingInput, ProfileBootstrap,
    SqliteDocumentStore, StoreError, ValidationError,
};
use std::sync::{Arc, Mutex};

fn domain() -> (Arc<ManualClock>, DomainStore<SqliteDocumentStore>) {
    let clock = Arc::new(ManualClock::on("2024-03-10"));
    let store = SqliteDocumentStore::open_in_memory(clock.clone()).unwrap();
    (clock.clone(), DomainStore::new(Arc::new(store), clock))
}

fn auth_user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        display_name: Some("Ada".to_string()),
        photo_url: None,
    }
}

fn role(id: &str, label: &str, primary: bool) -> UserRole {
    UserRole {
        id: id.to_string(),
        label: label.to_string(),
        is_primary: primary,
    }
}

fn deep_work() -> SovereignWindow {
    SovereignWindow {
        id: "w1".to_string(),
        label: "Deep Work".to_string(),
        description: None,
        start_hour: 9,
        end_hour: 12,
        energy_octave: EnergyOctave::High,
        days_of_week: vec![1, 2, 3, 4, 5],
    }
}

#[test]
fn ensure_profile_creates_once_and_never_overwrites() {
    let (clock, domain) = domain();
    let profiles = domain.profiles();

    assert_eq!(
        profiles.ensure_profile_on_login(&auth_user("u1")).unwrap(),
        ProfileBootstrap::Created
    );
    let created = profiles.get_profile("u1").unwrap().unwrap();
    assert_eq!(created.uid, "u1");
    assert_eq!(created.email.as_deref(), Some("u1@example.com"));
    assert!(!created.onboarding_complete);
    assert_eq!(created.created_at, created.updated_at);

    profiles
        .update_profile("u1", &ProfilePatch::onboarding_complete(true))
        .unwrap();
    clock.advance_ms(10);
    let mut renamed = auth_user("u1");
    renamed.display_name = Some("Someone Else".to_string());
    assert_eq!(
        profiles.ensure_profile_on_login(&renamed).unwrap(),
        ProfileBootstrap::Existing
    );

    let kept = profiles.get_profile("u1").unwrap().unwrap();
    assert!(kept.onboarding_complete);
    assert_eq!(kept.display_name, "Ada");
    assert_eq!(kept.created_at, created.created_at);
}

#[test]
fn ensure_profile_keeps_missing_email_null_and_defaults_name_to_empty() {
    let (_, domain) = domain();
    let user = AuthUser {
        id: "u1".to_string(),
        email: None,
        display_name: None,
        photo_url: Some("https://example.com/a.png".to_string()),
    };
    domain.profiles().ensure_profile_on_login(&user).unwrap();

    let stored = domain
        .document_store()
        .get(&paths::user_doc("u1").unwrap())
        .unwrap()
        .unwrap();
    assert!(stored["email"].is_null());
    assert_eq!(stored["displayName"], "");
    assert_eq!(stored["photoURL"], "https://example.com/a.png");
    assert_eq!(stored["onboardingComplete"], false);
}

#[test]
fn update_profile_touches_only_given_fields_and_refreshes_updated_at() {
    let (clock, domain) = domain();
    let profiles = domain.profiles();
    profiles.ensure_profile_on_login(&auth_user("u1")).unwrap();
    let before = profiles.get_profile("u1").unwrap().unwrap();

    clock.advance_ms(500);
    profiles
        .update_profile(
            "u1",
            &ProfilePatch {
                display_name: Some("Ada L.".to_string()),
                ..ProfilePatch::default()
            },
        )
        .unwrap();

    let after = profiles.get_profile("u1").unwrap().unwrap();
    assert_eq!(after.display_name, "Ada L.");
    assert_eq!(after.email, before.email);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.updated_at, before.updated_at + 500);
}

#[test]
fn update_profile_without_profile_is_not_found() {
    let (_, domain) = domain();
    let err = domain
        .profiles()
        .update_profile("ghost", &ProfilePatch::onboarding_complete(true))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(domain.profiles().get_profile("ghost").unwrap().is_none());
}

#[test]
fn subscribe_profile_sees_creation_and_updates() {
    let (_, domain) = domain();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = domain
        .profiles()
        .subscribe_profile("u1", move |profile| {
            sink.lock()
                .unwrap()
                .push(profile.map(|p| p.onboarding_complete));
        })
        .unwrap();

    domain
        .profiles()
        .ensure_profile_on_login(&auth_user("u1"))
        .unwrap();
    domain
        .profiles()
        .update_profile("u1", &ProfilePatch::onboarding_complete(true))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![None, Some(false), Some(true)]);
}

#[test]
fn onboarding_writes_everything_and_marks_profile_complete() {
    let (_, domain) = domain();
    domain
        .profiles()
        .ensure_profile_on_login(&auth_user("u1"))
        .unwrap();

    let birth = BirthData::new("1990-05-15", "14:30", "Austin, TX", "America/Chicago");
    let input = OnboardingInput {
        birth_data: Some(birth.clone()),
        roles: Some(vec![role("r1", "Designer", true), role("r2", "Parent", false)]),
        focus_windows: Some(vec![deep_work()]),
    };
    domain.onboarding().save_onboarding("u1", &input).unwrap();

    let celestial = domain.celestial();
    let stored_birth = celestial.get_birth_data("u1").unwrap().unwrap();
    assert_eq!(stored_birth, birth);
    assert_eq!(stored_birth.latitude, 0.0);
    assert_eq!(stored_birth.longitude, 0.0);
    assert_eq!(celestial.get_roles("u1").unwrap().len(), 2);
    assert_eq!(celestial.get_focus_windows("u1").unwrap(), vec![deep_work()]);
    assert!(
        domain
            .profiles()
            .get_profile("u1")
            .unwrap()
            .unwrap()
            .onboarding_complete
    );
}

#[test]
fn onboarding_again_overwrites_given_parts_and_keeps_the_rest() {
    let (_, domain) = domain();
    domain
        .profiles()
        .ensure_profile_on_login(&auth_user("u1"))
        .unwrap();
    let onboarding = domain.onboarding();
    onboarding
        .save_onboarding(
            "u1",
            &OnboardingInput {
                birth_data: Some(BirthData::new("1990-05-15", "14:30", "Austin, TX", "UTC")),
                roles: Some(vec![role("r1", "Designer", true)]),
                focus_windows: None,
            },
        )
        .unwrap();

    onboarding
        .save_onboarding(
            "u1",
            &OnboardingInput {
                birth_data: Some(BirthData::new("1991-01-02", "06:05", "Lisbon", "UTC")),
                roles: None,
                focus_windows: Some(vec![deep_work()]),
            },
        )
        .unwrap();

    let celestial = domain.celestial();
    assert_eq!(
        celestial.get_birth_data("u1").unwrap().unwrap().location,
        "Lisbon"
    );
    assert_eq!(
        celestial.get_roles("u1").unwrap(),
        vec![role("r1", "Designer", true)]
    );
    assert_eq!(celestial.get_focus_windows("u1").unwrap().len(), 1);
}

#[test]
fn onboarding_validates_before_any_write() {
    let (_, domain) = domain();
    domain
        .profiles()
        .ensure_profile_on_login(&auth_user("u1"))
        .unwrap();

    let mut bad_window = deep_work();
    bad_window.end_hour = 24;
    let err = domain
        .onboarding()
        .save_onboarding(
            "u1",
            &OnboardingInput {
                birth_data: Some(BirthData::new("1990-05-15", "14:30", "Austin, TX", "UTC")),
                roles: Some(vec![role("r1", "Designer", true)]),
                focus_windows: Some(vec![bad_window]),
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::HourOutOfRange(24))
    ));
    assert!(domain.celestial().get_birth_data("u1").unwrap().is_none());
    assert!(domain.celestial().get_roles("u1").unwrap().is_empty());
    assert!(
        !domain
            .profiles()
            .get_profile("u1")
            .unwrap()
            .unwrap()
            .onboarding_complete
    );
}

#[test]
fn onboarding_without_profile_keeps_earlier_writes_and_fails() {
    let (_, domain) = domain();
    let err = domain
        .onboarding()
        .save_onboarding(
            "u1",
            &OnboardingInput {
                birth_data: Some(BirthData::new("1990-05-15", "14:30", "Austin, TX", "UTC")),
                roles: None,
                focus_windows: None,
            },
        )
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(domain.celestial().get_birth_data("u1").unwrap().is_some());
}

#[test]
fn invalid_birth_time_is_rejected() {
    let (_, domain) = domain();
    let err = domain
        .celestial()
        .save_birth_data("u1", &BirthData::new("1990-05-15", "25:00", "Austin", "UTC"))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::InvalidTime(_))
    ));
}

#[test]
fn roles_and_windows_default_to_empty() {
    let (_, domain) = domain();
    let celestial = domain.celestial();
    assert!(celestial.get_roles("u1").unwrap().is_empty());
    assert!(celestial.get_focus_windows("u1").unwrap().is_empty());
    assert!(celestial.get_natal_chart("u1").unwrap().is_none());
}
