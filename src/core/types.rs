use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SwpInput {
    pub total_investment: f64,
    pub monthly_withdrawal: f64,
    pub annual_rate_percent: f64,
    pub period_years: u32,
}

impl SwpInput {
    // Nominal annual rate divided by 12, not an effective monthly rate.
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 100.0 / 12.0
    }

    pub fn total_steps(&self) -> u32 {
        self.period_years * 12
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month: u32,
    pub beginning_balance: f64,
    pub withdrawal: f64,
    pub interest: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpResult {
    pub final_value: f64,
    pub total_interest_earned: f64,
    pub total_withdrawn: f64,
    pub schedule: Vec<MonthlyRecord>,
}
