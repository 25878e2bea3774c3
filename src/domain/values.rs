//! Value types shared by aggregates, events and persistence rows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::money::Amount;
use super::DomainError;

/// Implements `as_str`, `Display` and `FromStr` over the upper-case column values.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(DomainError::invalid_field(
                        stringify!($name),
                        format!("unknown value '{}'", other),
                    )),
                }
            }
        }
    };
}

/// Kind of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
    Cash,
    Investment,
    CreditLine,
    Other,
}

text_enum!(AccountType {
    Checking => "CHECKING",
    Savings => "SAVINGS",
    Cash => "CASH",
    Investment => "INVESTMENT",
    CreditLine => "CREDIT_LINE",
    Other => "OTHER",
});

impl AccountType {
    /// Accounts whose balance can settle a bill
    pub fn is_debit_capable(&self) -> bool {
        matches!(self, Self::Checking | Self::Savings | Self::Cash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

text_enum!(TransactionType {
    Income => "INCOME",
    Expense => "EXPENSE",
    Transfer => "TRANSFER",
});

/// Transaction lifecycle status
///
/// `SCHEDULED → LATE → COMPLETED`, `SCHEDULED → CANCELLED`. COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Scheduled,
    Late,
    Completed,
    Cancelled,
}

text_enum!(TransactionStatus {
    Scheduled => "SCHEDULED",
    Late => "LATE",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Open,
    Paid,
}

text_enum!(BillStatus {
    Open => "OPEN",
    Paid => "PAID",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

text_enum!(ContributionFrequency {
    Weekly => "WEEKLY",
    Biweekly => "BIWEEKLY",
    Monthly => "MONTHLY",
});

/// Why an account balance moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceChangeReason {
    Deposit,
    Withdrawal,
    Transfer,
    Transaction,
    BillPayment,
}

/// Editable fields of a transaction.
///
/// Validated as a whole on creation and on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
}

const MAX_DESCRIPTION_LENGTH: usize = 255;

impl TransactionDetails {
    pub fn validate(&self) -> Result<(), DomainError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(DomainError::invalid_field("description", "must not be blank"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(DomainError::invalid_field(
                "description",
                format!("must have at most {} characters", MAX_DESCRIPTION_LENGTH),
            ));
        }
        if self.account_id.is_nil() {
            return Err(DomainError::invalid_field("account_id", "must be set"));
        }
        if self.category_id.is_nil() {
            return Err(DomainError::invalid_field("category_id", "must be set"));
        }
        Ok(())
    }
}

/// Recurring contribution plan of a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticContribution {
    pub amount: Amount,
    pub frequency: ContributionFrequency,
    /// Day of week (1 = Monday) for weekly plans, day of month (1-28) for monthly plans
    pub execution_day: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl AutomaticContribution {
    /// Validate a plan configured on `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), DomainError> {
        let day_range = match self.frequency {
            ContributionFrequency::Weekly | ContributionFrequency::Biweekly => 1..=7,
            ContributionFrequency::Monthly => 1..=28,
        };
        if !day_range.contains(&self.execution_day) {
            return Err(DomainError::invalid_field(
                "execution_day",
                format!("must be between {} and {}", day_range.start(), day_range.end()),
            ));
        }
        if self.start_date < today {
            return Err(DomainError::InvalidStartDate(format!(
                "{} is before {}",
                self.start_date, today
            )));
        }
        if let Some(end_date) = self.end_date {
            if end_date <= self.start_date {
                return Err(DomainError::InvalidStartDate(format!(
                    "start date {} must be before end date {}",
                    self.start_date, end_date
                )));
            }
        }
        Ok(())
    }

    /// First execution date strictly after `after`, bounded by start and end dates
    pub fn next_execution_date(&self, after: NaiveDate) -> Option<NaiveDate> {
        if !self.is_active {
            return None;
        }
        let from = if after < self.start_date {
            self.start_date
        } else {
            after.succ_opt()?
        };

        let next = match self.frequency {
            ContributionFrequency::Weekly => next_weekday(from, self.execution_day),
            ContributionFrequency::Biweekly => {
                let first = next_weekday(self.start_date, self.execution_day);
                let mut candidate = first;
                while candidate < from {
                    candidate += Duration::days(14);
                }
                candidate
            }
            ContributionFrequency::Monthly => {
                let in_month = from.with_day(self.execution_day)?;
                if in_month >= from {
                    in_month
                } else {
                    let (year, month) = if from.month() == 12 {
                        (from.year() + 1, 1)
                    } else {
                        (from.year(), from.month() + 1)
                    };
                    NaiveDate::from_ymd_opt(year, month, self.execution_day)?
                }
            }
        };

        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }
}

fn next_weekday(from: NaiveDate, iso_weekday: u32) -> NaiveDate {
    let current = from.weekday().number_from_monday();
    let offset = (iso_weekday + 7 - current) % 7;
    from + Duration::days(i64::from(offset))
}
