//! Payroll computation from attendance.
//!
//! A Present day earns the full daily wage; a Half Day earns half of it
//! (rounded down to the minor unit). Absent and Leave days earn nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use textileops_core::{DomainResult, Money, PayrollId, Period, WorkerId};

use crate::attendance::AttendanceTally;
use crate::worker::Worker;

/// Wages earned for a tally of attendance at the given daily wage.
pub fn wages_for(daily_wage: Money, tally: &AttendanceTally) -> DomainResult<Money> {
    let full = daily_wage.checked_mul(tally.present_days)?;
    let halves = Money::from_minor(daily_wage.checked_mul(tally.half_days)?.minor() / 2);
    full.checked_add(halves)
}

/// One worker's line in a payroll run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollLine {
    pub worker_id: WorkerId,
    pub code: String,
    pub name: String,
    pub role: String,
    pub daily_wage: Money,
    pub shift_wage: Money,
    pub full_days: i64,
    pub half_days: i64,
    pub days_worked: f64,
    pub total_wages: Money,
}

impl PayrollLine {
    pub fn compute(worker: &Worker, tally: &AttendanceTally) -> DomainResult<Self> {
        Ok(Self {
            worker_id: worker.id,
            code: worker.code.clone(),
            name: worker.name.clone(),
            role: worker.role.clone(),
            daily_wage: worker.daily_wage,
            shift_wage: worker.shift_wage,
            full_days: tally.present_days,
            half_days: tally.half_days,
            days_worked: tally.days_worked(),
            total_wages: wages_for(worker.daily_wage, tally)?,
        })
    }

    /// Only lines with at least one paid day produce a stored record.
    pub fn is_payable(&self) -> bool {
        self.full_days > 0 || self.half_days > 0
    }
}

/// Result of calculating payroll for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_workers: i64,
    pub total_payroll: Money,
    pub workers: Vec<PayrollLine>,
}

impl PayrollRun {
    pub fn new(period: Period, workers: Vec<PayrollLine>) -> DomainResult<Self> {
        let mut total_payroll = Money::ZERO;
        for line in &workers {
            total_payroll = total_payroll.checked_add(line.total_wages)?;
        }
        Ok(Self {
            period_start: period.start(),
            period_end: period.end(),
            total_workers: workers.len() as i64,
            total_payroll,
            workers,
        })
    }
}

/// A stored payroll record, joined with the worker's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub id: PayrollId,
    pub worker_id: WorkerId,
    pub code: String,
    pub name: String,
    pub role: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub full_days: i64,
    pub half_days: i64,
    pub days_worked: f64,
    pub wage_amount: Money,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Stored payroll records for one period with totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollSummary {
    pub total_workers: i64,
    pub total_payroll: Money,
    /// Mean wage; 0 when there are no records.
    pub average_wage: Money,
    pub records: Vec<PayrollRecord>,
}

impl PayrollSummary {
    pub fn from_records(records: Vec<PayrollRecord>) -> DomainResult<Self> {
        let mut total = Money::ZERO;
        for r in &records {
            total = total.checked_add(r.wage_amount)?;
        }
        Ok(Self {
            total_workers: records.len() as i64,
            total_payroll: total,
            average_wage: Money::mean(records.iter().map(|r| r.wage_amount)),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::attendance::AttendanceStatus;
    use crate::worker::WorkerStatus;

    fn worker(daily_wage: i64) -> Worker {
        Worker {
            id: WorkerId::new(4),
            code: "EMP-04".to_string(),
            name: "Ravi".to_string(),
            role: "Cutter".to_string(),
            contact: None,
            daily_wage: Money::from_minor(daily_wage),
            shift_wage: Money::ZERO,
            status: WorkerStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn half_days_earn_half_the_daily_wage() {
        use AttendanceStatus::*;
        let tally = AttendanceTally::from_statuses([Present, Present, HalfDay, Absent]);
        let line = PayrollLine::compute(&worker(50_000), &tally).unwrap();
        assert_eq!(line.total_wages, Money::from_minor(125_000));
        assert_eq!(line.days_worked, 2.5);
        assert!(line.is_payable());
    }

    #[test]
    fn odd_half_day_share_rounds_down() {
        let tally = AttendanceTally::from_statuses([AttendanceStatus::HalfDay]);
        assert_eq!(wages_for(Money::from_minor(101), &tally).unwrap(), Money::from_minor(50));
    }

    #[test]
    fn absence_only_is_not_payable() {
        let tally = AttendanceTally::from_statuses([AttendanceStatus::Absent, AttendanceStatus::Leave]);
        let line = PayrollLine::compute(&worker(40_000), &tally).unwrap();
        assert_eq!(line.total_wages, Money::ZERO);
        assert!(!line.is_payable());
    }

    #[test]
    fn run_totals_all_lines() {
        let period = Period::parse("2024-01-01", "2024-01-31").unwrap();
        let a = PayrollLine::compute(
            &worker(10_000),
            &AttendanceTally::from_statuses([AttendanceStatus::Present]),
        )
        .unwrap();
        let b = PayrollLine::compute(&worker(20_000), &AttendanceTally::default()).unwrap();
        let run = PayrollRun::new(period, vec![a, b]).unwrap();
        assert_eq!(run.total_workers, 2);
        assert_eq!(run.total_payroll, Money::from_minor(10_000));
    }

    proptest! {
        /// Property: wages never exceed a full day's pay for every marked
        /// working day, and never fall below pay for the full days alone.
        #[test]
        fn wages_are_bounded(wage in 1i64..1_000_000, present in 0i64..31, half in 0i64..31) {
            let tally = AttendanceTally { present_days: present, half_days: half, total_days: present + half, ..AttendanceTally::default() };
            let paid = wages_for(Money::from_minor(wage), &tally).unwrap().minor();
            prop_assert!(paid >= wage * present);
            prop_assert!(paid <= wage * (present + half));
        }
    }
}
