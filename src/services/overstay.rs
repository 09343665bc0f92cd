// src/services/overstay.rs

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::{
    common::error::AppError,
    models::reservations::{Overstay, OverstaySeverity, Reservation, ReservationStatus},
};

/// Teto para qualquer limiar da política: um ano em horas.
pub const MAX_POLICY_HOURS: i64 = 24 * 366;

/// Tolerância e faixas de severidade. Vêm da configuração, nunca do detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverstayPolicy {
    pub grace_hours: i64,
    pub warning_after_hours: i64,
    pub critical_after_hours: i64,
}

impl Default for OverstayPolicy {
    fn default() -> Self {
        Self { grace_hours: 3, warning_after_hours: 6, critical_after_hours: 24 }
    }
}

impl OverstayPolicy {
    pub fn new(grace_hours: i64, warning_after_hours: i64, critical_after_hours: i64) -> Result<Self, AppError> {
        if !(0..=MAX_POLICY_HOURS).contains(&grace_hours) {
            return Err(AppError::InvalidField { field: "graceHours", value: grace_hours.to_string() });
        }
        if !(0..=MAX_POLICY_HOURS).contains(&warning_after_hours) {
            return Err(AppError::InvalidField {
                field: "warningAfterHours",
                value: warning_after_hours.to_string(),
            });
        }
        if critical_after_hours < warning_after_hours || critical_after_hours > MAX_POLICY_HOURS {
            return Err(AppError::InvalidField {
                field: "criticalAfterHours",
                value: critical_after_hours.to_string(),
            });
        }
        Ok(Self { grace_hours, warning_after_hours, critical_after_hours })
    }

    pub fn with_grace_hours(self, grace_hours: i64) -> Result<Self, AppError> {
        Self::new(grace_hours, self.warning_after_hours, self.critical_after_hours)
    }

    // < warning: info; warning..=critical: warning; > critical: critical
    pub fn severity(&self, hours_overdue: i64) -> OverstaySeverity {
        if hours_overdue > self.critical_after_hours {
            OverstaySeverity::Critical
        } else if hours_overdue >= self.warning_after_hours {
            OverstaySeverity::Warning
        } else {
            OverstaySeverity::Info
        }
    }
}

/// Instante em que o hóspede deveria ter saído.
pub fn expected_checkout(reservation: &Reservation, checkout_time: NaiveTime) -> DateTime<Utc> {
    reservation.check_out_date.and_time(checkout_time).and_utc()
}

/// Hóspedes ainda hospedados após o check-out previsto + tolerância.
pub fn detect_overstays(
    reservations: &[Reservation],
    now: DateTime<Utc>,
    checkout_time: NaiveTime,
    policy: &OverstayPolicy,
) -> Vec<Overstay> {
    // Sem corte representável, ninguém passou dele
    let Some(cutoff) = Duration::try_hours(policy.grace_hours).and_then(|grace| now.checked_sub_signed(grace))
    else {
        return Vec::new();
    };

    let mut overstays: Vec<Overstay> = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::CheckedIn)
        .filter_map(|r| {
            let expected = expected_checkout(r, checkout_time);
            if expected >= cutoff {
                return None;
            }
            // Horas cheias (divisão inteira trunca, e o valor é positivo)
            let hours_overdue = (now - expected).num_hours();
            Some(Overstay {
                reservation_id: r.id,
                room_id: r.room_id,
                guest_name: r.guest_name.clone(),
                expected_checkout: expected,
                hours_overdue,
                severity: policy.severity(hours_overdue),
            })
        })
        .collect();

    overstays.sort_by(|a, b| b.hours_overdue.cmp(&a.hours_overdue));
    overstays
}


#[cfg(test)]
mod tests {
    use super::fixtures::reservation;
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn checked_in_until(date: &str) -> Reservation {
        let out = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        reservation(Uuid::new_v4(), out - Duration::days(2), out, ReservationStatus::CheckedIn)
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_five_hours_past_checkout_with_three_hour_grace() {
        let r = checked_in_until("2025-03-10");
        let policy = OverstayPolicy::new(3, 6, 24).unwrap();

        let found = detect_overstays(&[r.clone()], at("2025-03-10T17:00:00Z"), noon(), &policy);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reservation_id, r.id);
        assert_eq!(found[0].hours_overdue, 5);
        assert_eq!(found[0].severity, OverstaySeverity::Info);
    }

    #[test]
    fn test_within_grace_is_not_reported() {
        let r = checked_in_until("2025-03-10");
        let policy = OverstayPolicy::new(3, 6, 24).unwrap();

        // Exatamente no limite: precisa ser estritamente antes de now - grace
        assert!(detect_overstays(&[r.clone()], at("2025-03-10T15:00:00Z"), noon(), &policy).is_empty());
        assert!(detect_overstays(&[r], at("2025-03-10T14:59:00Z"), noon(), &policy).is_empty());
    }

    #[test]
    fn test_hours_are_floored() {
        let r = checked_in_until("2025-03-10");
        let policy = OverstayPolicy::new(0, 6, 24).unwrap();

        let found = detect_overstays(&[r], at("2025-03-10T19:59:59Z"), noon(), &policy);
        assert_eq!(found[0].hours_overdue, 7);
        assert_eq!(found[0].severity, OverstaySeverity::Warning);
    }

    #[test]
    fn test_severity_tiers_follow_policy() {
        let policy = OverstayPolicy::new(3, 6, 24).unwrap();
        assert_eq!(policy.severity(5), OverstaySeverity::Info);
        assert_eq!(policy.severity(6), OverstaySeverity::Warning);
        assert_eq!(policy.severity(24), OverstaySeverity::Warning);
        assert_eq!(policy.severity(25), OverstaySeverity::Critical);

        let strict = OverstayPolicy::new(1, 2, 4).unwrap();
        assert_eq!(strict.severity(5), OverstaySeverity::Critical);
    }

    #[test]
    fn test_only_checked_in_guests_are_considered() {
        let out = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let room = Uuid::new_v4();
        let reservations = vec![
            reservation(room, out - Duration::days(1), out, ReservationStatus::Confirmed),
            reservation(room, out - Duration::days(1), out, ReservationStatus::CheckedOut),
        ];
        let found = detect_overstays(&reservations, at("2025-03-12T12:00:00Z"), noon(), &OverstayPolicy::default());
        assert!(found.is_empty());
    }

    #[test]
    fn test_sorted_by_most_overdue() {
        let reservations = vec![checked_in_until("2025-03-10"), checked_in_until("2025-03-08")];
        let found = detect_overstays(&reservations, at("2025-03-10T20:00:00Z"), noon(), &OverstayPolicy::default());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].hours_overdue, 56);
        assert_eq!(found[0].severity, OverstaySeverity::Critical);
        assert_eq!(found[1].hours_overdue, 8);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(OverstayPolicy::new(-1, 6, 24).is_err());
        assert!(OverstayPolicy::new(3, 24, 6).is_err());
        assert!(OverstayPolicy::default().with_grace_hours(12).is_ok());
    }

    #[test]
    fn test_huge_thresholds_are_rejected() {
        assert!(matches!(
            OverstayPolicy::default().with_grace_hours(10_000_000_000),
            Err(AppError::InvalidField { field: "graceHours", .. })
        ));
        assert!(OverstayPolicy::default().with_grace_hours(i64::MAX).is_err());
        assert!(matches!(
            OverstayPolicy::new(3, i64::MAX, i64::MAX),
            Err(AppError::InvalidField { field: "warningAfterHours", .. })
        ));
        assert!(OverstayPolicy::new(3, 6, MAX_POLICY_HOURS + 1).is_err());
        assert!(OverstayPolicy::new(MAX_POLICY_HOURS, 6, MAX_POLICY_HOURS).is_ok());
    }

    #[test]
    fn test_unrepresentable_cutoff_reports_nothing() {
        // Política montada à mão, sem passar por `new`
        let policy = OverstayPolicy { grace_hours: i64::MAX, warning_after_hours: 6, critical_after_hours: 24 };
        let r = checked_in_until("2025-03-10");
        assert!(detect_overstays(&[r], at("2025-03-12T12:00:00Z"), noon(), &policy).is_empty());
    }
}
