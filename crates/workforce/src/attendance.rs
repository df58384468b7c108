use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use textileops_core::{parse_date, AttendanceId, DomainError, DomainResult, WorkerId};

/// Daily attendance mark.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    #[serde(rename = "Half Day")]
    HalfDay,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::HalfDay => "Half Day",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Leave => "Leave",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "half day" | "half_day" | "halfday" => Ok(AttendanceStatus::HalfDay),
            "absent" => Ok(AttendanceStatus::Absent),
            "leave" => Ok(AttendanceStatus::Leave),
            _ => Err(DomainError::validation(
                "status must be one of: Present, Half Day, Absent, Leave",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub worker_id: WorkerId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Attendance record joined with the worker it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub code: String,
    pub name: String,
    pub role: String,
}

/// Command: mark a worker's attendance for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub worker_id: WorkerId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl NewAttendance {
    pub fn parse(worker_id: i64, date: &str, status: &str, notes: Option<String>) -> DomainResult<Self> {
        if worker_id <= 0 {
            return Err(DomainError::validation("worker_id must be a positive integer"));
        }
        Ok(Self {
            worker_id: WorkerId::new(worker_id),
            date: parse_date("date", date)?,
            status: status.parse()?,
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }
}

/// Per-status day counts over a period.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceTally {
    pub present_days: i64,
    pub half_days: i64,
    pub absent_days: i64,
    pub leave_days: i64,
    pub total_days: i64,
}

impl AttendanceTally {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present_days += 1,
            AttendanceStatus::HalfDay => self.half_days += 1,
            AttendanceStatus::Absent => self.absent_days += 1,
            AttendanceStatus::Leave => self.leave_days += 1,
        }
        self.total_days += 1;
    }

    pub fn from_statuses(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut tally = Self::default();
        for status in statuses {
            tally.add(status);
        }
        tally
    }

    /// Paid days: full days plus half of the half days.
    pub fn days_worked(&self) -> f64 {
        self.present_days as f64 + self.half_days as f64 * 0.5
    }
}

/// Attendance report row for one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReportRow {
    pub worker_id: WorkerId,
    pub code: String,
    pub name: String,
    pub role: String,
    #[serde(flatten)]
    pub tally: AttendanceTally,
}
