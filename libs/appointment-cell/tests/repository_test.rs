use assert_matches::assert_matches;
use chrono::Duration;
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentKind, AppointmentStatus,
};
use appointment_cell::services::AppointmentRepository;
use shared_utils::test_utils::{reference_now, tomorrow_at};

fn appointment(patient: &str, practitioner: &str, hour: u32, kind: AppointmentKind) -> Appointment {
    Appointment::new(
        Uuid::new_v4(),
        patient,
        practitioner,
        tomorrow_at(hour, 0),
        kind,
        reference_now(),
    )
}

#[test]
fn test_add_then_get_returns_identical_record() {
    let mut repository = AppointmentRepository::new();
    let record = appointment("P1", "D1", 9, AppointmentKind::online("Zoom"));

    repository.add(record.clone()).unwrap();

    assert_eq!(repository.get(record.id()).unwrap(), &record);
}

#[test]
fn test_add_with_existing_id_is_duplicate() {
    let mut repository = AppointmentRepository::new();
    let record = appointment("P1", "D1", 9, AppointmentKind::routine("ENT", 20));

    repository.add(record.clone()).unwrap();

    assert_matches!(repository.add(record), Err(AppointmentError::DuplicateKey(_)));
    assert_eq!(repository.len(), 1);
}

#[test]
fn test_update_and_delete_require_existing_id() {
    let mut repository = AppointmentRepository::new();
    let record = appointment("P1", "D1", 9, AppointmentKind::routine("ENT", 20));

    assert_matches!(repository.update(record.clone()), Err(AppointmentError::NotFound(_)));
    assert_matches!(repository.delete(record.id()), Err(AppointmentError::NotFound(_)));

    repository.add(record.clone()).unwrap();
    repository.update(record.clone()).unwrap();
    assert_eq!(repository.delete(record.id()).unwrap(), record);
    assert!(repository.is_empty());
}

#[test]
fn test_list_keeps_insertion_order_and_filters() {
    let mut repository = AppointmentRepository::new();
    let later = appointment("P1", "D1", 15, AppointmentKind::routine("ENT", 20));
    let earlier = appointment("P2", "D2", 9, AppointmentKind::online("Zoom"));
    let other = appointment("P1", "D1", 11, AppointmentKind::emergency("RED", 2));

    for record in [&later, &earlier, &other] {
        repository.add(record.clone()).unwrap();
    }

    let ids: Vec<_> = repository.list(AppointmentFilter::all()).map(|a| a.id()).collect();
    assert_eq!(ids, vec![later.id(), earlier.id(), other.id()]);

    let for_d1: Vec<_> = repository
        .list(AppointmentFilter::by_practitioner("D1"))
        .map(|a| a.id())
        .collect();
    assert_eq!(for_d1, vec![later.id(), other.id()]);

    assert_eq!(
        repository
            .list(AppointmentFilter::by_status(AppointmentStatus::Cancelled))
            .count(),
        0
    );
}

#[test]
fn test_list_is_restartable_and_sees_current_contents() {
    let mut repository = AppointmentRepository::new();
    repository
        .add(appointment("P1", "D1", 9, AppointmentKind::online("Zoom")))
        .unwrap();

    assert_eq!(repository.list(AppointmentFilter::all()).count(), 1);
    assert_eq!(repository.list(AppointmentFilter::all()).count(), 1);

    repository
        .add(appointment("P2", "D1", 10, AppointmentKind::online("Zoom")))
        .unwrap();
    assert_eq!(repository.list(AppointmentFilter::all()).count(), 2);
}

#[test]
fn test_by_priority_puts_emergencies_first_then_time() {
    let mut repository = AppointmentRepository::new();
    let routine = appointment("P1", "D1", 8, AppointmentKind::routine("ENT", 20));
    let late_emergency = appointment("P2", "D1", 12, AppointmentKind::emergency("RED", 1));
    let early_emergency = appointment("P3", "D1", 10, AppointmentKind::emergency("RED", 4));

    for record in [&routine, &late_emergency, &early_emergency] {
        repository.add(record.clone()).unwrap();
    }

    let ordered: Vec<_> = repository
        .by_priority(AppointmentFilter::all())
        .into_iter()
        .map(|a| a.id())
        .collect();
    assert_eq!(ordered, vec![early_emergency.id(), late_emergency.id(), routine.id()]);
}

#[test]
fn test_list_on_date_matches_calendar_day() {
    let mut repository = AppointmentRepository::new();
    let tomorrow = appointment("P1", "D1", 9, AppointmentKind::online("Zoom"));
    repository.add(tomorrow.clone()).unwrap();

    let day = tomorrow_at(0, 0).date_naive();
    assert_eq!(repository.list_on_date(day).count(), 1);
    assert_eq!(
        repository
            .list_on_date((tomorrow_at(0, 0) + Duration::days(1)).date_naive())
            .count(),
        0
    );
}
