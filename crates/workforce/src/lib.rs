//! Workforce domain module: workers, daily attendance and payroll rules.
//!
//! Pure domain logic (no IO). Persistence lives in `textileops-infra`.

pub mod attendance;
pub mod payroll;
pub mod worker;

pub use attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceReportRow, AttendanceStatus, AttendanceTally,
    NewAttendance,
};
pub use payroll::{PayrollLine, PayrollRecord, PayrollRun, PayrollSummary};
pub use worker::{NewWorker, Worker, WorkerStats, WorkerStatus, WorkerUpdate, ROLE_CATEGORIES};
