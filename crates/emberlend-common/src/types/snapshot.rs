//! Traditional-finance snapshot - transient input to TradFi scoring
//!
//! The raw attributes fetched through the attested external-data
//! collaborator. Used only while computing the TradFi score and never
//! persisted by this system.

use serde::{Deserialize, Serialize};

use crate::types::address::Address;

/// Credit-bureau attributes (FICO-equivalent score and account history)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BureauAttributes {
    /// FICO-equivalent creditworthiness score, 300-850
    pub fico_score: u16,
    pub account_age_months: u32,
    pub payment_history_percent: f64,
    pub credit_utilization_percent: f64,
    pub total_accounts: u32,
    pub derogatory_marks: u32,
    /// Total outstanding debt in USD
    pub total_debt: u64,
}

/// Banking-health attributes (balances and cash flow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankingAttributes {
    pub checking_balance: f64,
    pub savings_balance: f64,
    pub avg_monthly_income: f64,
    pub avg_monthly_expenses: f64,
    pub overdraft_count_6mo: u32,
}

/// Twelve-month payment-history counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub on_time_payments_12mo: u32,
    pub late_payments_12mo: u32,
    pub missed_payments_12mo: u32,
    pub debt_to_income_ratio: f64,
}

impl PaymentHistory {
    /// Share of payments made on time; 0 when no payments were recorded.
    pub fn on_time_ratio(&self) -> f64 {
        let total = self.on_time_payments_12mo + self.late_payments_12mo + self.missed_payments_12mo;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.on_time_payments_12mo) / f64::from(total)
    }
}

/// Complete external financial snapshot for one borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub bureau: BureauAttributes,
    pub banking: BankingAttributes,
    pub payments: PaymentHistory,
}

impl FinancialSnapshot {
    /// Deterministically synthesize a snapshot from the address seed.
    ///
    /// Last-resort fallback when the attested external source is
    /// unavailable: repeated calls for the same address return the same
    /// snapshot, which keeps demo and test runs stable.
    pub fn synthesize(address: &Address) -> Self {
        let seed = address.seed();

        Self {
            bureau: BureauAttributes {
                fico_score: (550 + seed % 270) as u16,
                account_age_months: (12 + seed % 168) as u32,
                payment_history_percent: 70.0 + (seed % 30) as f64,
                credit_utilization_percent: 5.0 + (seed % 80) as f64,
                total_accounts: (2 + seed % 23) as u32,
                derogatory_marks: (seed % 4) as u32,
                total_debt: (seed % 50) * 1000,
            },
            banking: BankingAttributes {
                checking_balance: ((seed % 250) * 100) as f64,
                savings_balance: ((seed % 500) * 100) as f64,
                avg_monthly_income: (2000 + (seed % 130) * 100) as f64,
                avg_monthly_expenses: (1500 + (seed % 105) * 100) as f64,
                overdraft_count_6mo: (seed % 6) as u32,
            },
            payments: PaymentHistory {
                on_time_payments_12mo: (6 + seed % 7) as u32,
                late_payments_12mo: (seed % 5) as u32,
                missed_payments_12mo: (seed % 3) as u32,
                debt_to_income_ratio: 0.1 + (seed % 10) as f64 * 0.1,
            },
        }
    }
}
