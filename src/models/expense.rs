//! Salary and daily expense models (bank ledger debit sources).

use serde::{Deserialize, Serialize};

use super::loose;

/// A salary disbursement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryExpense {
    /// Storage identifier, the natural key.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Paid employee.
    #[serde(default)]
    pub employee_name: String,
    /// Amount paid out.
    #[serde(default, deserialize_with = "loose::amount")]
    pub amount: f64,
    /// Salary month label (`"February"` or `"2026-02"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// Disbursement date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    /// Payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// A petty-cash or operating expense.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyExpense {
    /// Storage identifier, the natural key.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Expense category (fuel, airtime, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// What the money was spent on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Amount spent.
    #[serde(default, deserialize_with = "loose::amount")]
    pub amount: f64,
    /// Expense date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Recipient of the money.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_to: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_with_month_name_only() {
        let salary: SalaryExpense = serde_json::from_str(
            r#"{"id": 3, "employeeName": "J. Doe", "amount": 45000, "month": "February"}"#,
        )
        .unwrap();
        assert_eq!(salary.id.as_deref(), Some("3"));
        assert!(salary.payment_date.is_none());
        assert_eq!(salary.month.as_deref(), Some("February"));
    }

    #[test]
    fn daily_expense_amount_from_string() {
        let expense: DailyExpense =
            serde_json::from_str(r#"{"id": "E-1", "category": "Fuel", "amount": "1200.50", "date": "2026-02-03"}"#)
                .unwrap();
        assert!((expense.amount - 1200.5).abs() < f64::EPSILON);
    }
}
