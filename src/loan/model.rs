use super::LoanError;
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::Deserialize;

/// The submission lifecycle of a loan.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProcessState {
    #[default]
    Idle,
    Processing,
    /// Waiting to make retry number `n` (1-based) after a failed
    /// attempt.
    Retrying(u32),
    Succeeded,
    Failed(LoanError),
}

impl ProcessState {
    /// Returns true while a submission is running; further submits
    /// should be refused until a terminal state is reached.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ProcessState::Processing | ProcessState::Retrying(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Succeeded | ProcessState::Failed(_))
    }
}

/// Limits for the loan form inputs.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoanBounds {
    pub min_amount: f64,
    pub max_amount: f64,
    pub min_duration: u32,
    pub max_duration: u32,
    /// Durations are whole multiples of this many days.
    pub duration_step: u32,
}

impl Default for LoanBounds {
    fn default() -> Self {
        LoanBounds {
            min_amount: 5_000.0,
            max_amount: 50_000.0,
            min_duration: 7,
            max_duration: 28,
            duration_step: 7,
        }
    }
}

impl LoanBounds {
    pub fn contains_amount(&self, amount: f64) -> bool {
        amount.is_finite() && amount >= self.min_amount && amount <= self.max_amount
    }

    pub fn check_amount(&self, amount: f64) -> Result<(), LoanError> {
        if self.contains_amount(amount) {
            Ok(())
        } else {
            Err(LoanError::InvalidAmount)
        }
    }

    pub fn check_duration(&self, days: u32) -> Result<(), LoanError> {
        if days < self.min_duration || days > self.max_duration {
            return Err(LoanError::InvalidDuration(format!(
                "{} days is outside {}..={}",
                days, self.min_duration, self.max_duration
            )));
        }
        if self.duration_step == 0 || days % self.duration_step != 0 {
            return Err(LoanError::InvalidDuration(format!(
                "{} days is not a multiple of {}",
                days, self.duration_step
            )));
        }
        Ok(())
    }

    /// Checks that the bounds themselves are usable: a non-empty amount
    /// range and at least one valid duration.
    pub fn validate(&self) -> Result<(), LoanError> {
        if !self.min_amount.is_finite()
            || !self.max_amount.is_finite()
            || self.min_amount <= 0.0
            || self.min_amount > self.max_amount
        {
            return Err(LoanError::InvalidAmount);
        }
        if self.duration_step == 0 {
            return Err(LoanError::InvalidDuration(
                "duration step must be positive".to_string(),
            ));
        }
        if self.first_duration() > self.last_duration() {
            return Err(LoanError::InvalidDuration(format!(
                "no multiple of {} within {}..={}",
                self.duration_step, self.min_duration, self.max_duration
            )));
        }
        Ok(())
    }

    /// Snap `days` to the nearest valid duration.
    pub fn snap_duration(&self, days: u32) -> u32 {
        if self.duration_step == 0 {
            return days.clamp(self.min_duration, self.max_duration.max(self.min_duration));
        }

        let (first, last) = (self.first_duration(), self.last_duration());
        if first > last {
            // no valid multiple; keep the value inside the range at least
            return days.clamp(self.min_duration, self.max_duration.max(self.min_duration));
        }

        let step = u64::from(self.duration_step);
        let nearest = (u64::from(days) + step / 2) / step * step;
        u32::try_from(nearest).unwrap_or(u32::MAX).clamp(first, last)
    }

    fn first_duration(&self) -> u32 {
        let step = self.duration_step;
        self.min_duration.div_ceil(step).saturating_mul(step)
    }

    fn last_duration(&self) -> u32 {
        let step = self.duration_step;
        (self.max_duration / step) * step
    }
}

/// The loan being edited in the form.
///
/// The repayment amount and due date are derived from the primitive
/// fields and a calendar date; they are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub amount: f64,
    /// Days.
    pub duration: u32,
    /// Annual rate, percent.
    pub rate: f64,
    pub process_state: ProcessState,
}

impl Loan {
    pub fn new(amount: f64, duration: u32, rate: f64) -> Self {
        Loan {
            amount,
            duration,
            rate,
            process_state: ProcessState::Idle,
        }
    }

    /// Amount due at the end of the loan, rounded to cents:
    /// `amount * (1 + duration / days_in_year * rate / 100)`.
    pub fn repayment(&self, today: NaiveDate) -> f64 {
        let term = f64::from(self.duration) / f64::from(days_in_year(today));
        let value = self.amount * (1.0 + term * (self.rate / 100.0));
        round_to_cents(value)
    }

    pub fn due_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(u64::from(self.duration)))
            .unwrap_or(today)
    }

    pub fn repayment_today(&self) -> f64 {
        self.repayment(Local::now().date_naive())
    }

    pub fn due_date_today(&self) -> NaiveDate {
        self.due_date(Local::now().date_naive())
    }
}

fn days_in_year(date: NaiveDate) -> u32 {
    if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
        366
    } else {
        365
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn repayment_in_common_year() {
        let loan = Loan::new(25_000.0, 14, 15.0);
        assert_eq!(loan.repayment(date(2025, 12, 18)), 25_143.84);
    }

    #[test]
    fn repayment_in_leap_year() {
        let loan = Loan::new(25_000.0, 14, 15.0);
        assert_eq!(loan.repayment(date(2024, 3, 1)), 25_143.44);
    }

    #[test]
    fn repayment_is_deterministic() {
        let loan = Loan::new(25_000.0, 14, 15.0);
        let today = date(2026, 10, 19);
        assert_eq!(
            loan.repayment(today).to_bits(),
            loan.clone().repayment(today).to_bits()
        );
    }

    #[test]
    fn due_date_adds_duration() {
        let loan = Loan::new(25_000.0, 14, 15.0);
        assert_eq!(loan.due_date(date(2025, 12, 18)), date(2026, 1, 1));
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        let bounds = LoanBounds::default();
        assert!(bounds.contains_amount(5_000.0));
        assert!(bounds.contains_amount(50_000.0));
        assert!(!bounds.contains_amount(1_000.0));
        assert!(!bounds.contains_amount(100_000.0));
        assert!(!bounds.contains_amount(f64::NAN));
        assert_eq!(bounds.check_amount(4_999.99), Err(LoanError::InvalidAmount));
    }

    #[test]
    fn durations_snap_to_step() {
        let bounds = LoanBounds::default();
        assert_eq!(bounds.snap_duration(14), 14);
        assert_eq!(bounds.snap_duration(17), 14);
        assert_eq!(bounds.snap_duration(18), 21);
        assert_eq!(bounds.snap_duration(0), 7);
        assert_eq!(bounds.snap_duration(365), 28);
        assert_eq!(bounds.snap_duration(u32::MAX), 28);
        assert_eq!(bounds.snap_duration(u32::MAX - 1), 28);
    }

    #[test]
    fn snapping_near_the_top_of_u32() {
        let bounds = LoanBounds {
            min_duration: 7,
            max_duration: u32::MAX,
            duration_step: 7,
            ..LoanBounds::default()
        };
        let last = (u32::MAX / 7) * 7;
        assert_eq!(bounds.snap_duration(u32::MAX), last);
        assert_eq!(bounds.snap_duration(last), last);
    }

    #[test]
    fn duration_check() {
        let bounds = LoanBounds::default();
        assert!(bounds.check_duration(21).is_ok());
        assert!(matches!(
            bounds.check_duration(20),
            Err(LoanError::InvalidDuration(_))
        ));
        assert!(matches!(
            bounds.check_duration(35),
            Err(LoanError::InvalidDuration(_))
        ));
    }

    #[test]
    fn invalid_bounds() {
        let bounds = LoanBounds {
            min_duration: 8,
            max_duration: 13,
            ..LoanBounds::default()
        };
        assert!(matches!(
            bounds.validate(),
            Err(LoanError::InvalidDuration(_))
        ));

        let bounds = LoanBounds {
            min_amount: 10.0,
            max_amount: 1.0,
            ..LoanBounds::default()
        };
        assert_eq!(bounds.validate(), Err(LoanError::InvalidAmount));
        assert!(LoanBounds::default().validate().is_ok());
    }

    #[test]
    fn process_state_predicates() {
        assert!(ProcessState::Processing.is_in_flight());
        assert!(ProcessState::Retrying(2).is_in_flight());
        assert!(!ProcessState::Idle.is_in_flight());
        assert!(ProcessState::Failed(LoanError::Undefined).is_terminal());
        assert!(ProcessState::Succeeded.is_terminal());
    }
}
