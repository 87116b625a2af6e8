use serde::{Deserialize, Serialize};

/// Numeric detail value as captured by intake forms. Text that does not parse counts as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    pub fn as_f64(&self) -> f64 {
        match self {
            NumericField::Number(n) if n.is_finite() => *n,
            NumericField::Number(_) => 0.0,
            NumericField::Text(raw) => raw
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
        }
    }
}

/// Absent and malformed values both coerce to zero.
pub fn coerce(field: Option<&NumericField>) -> f64 {
    field.map(NumericField::as_f64).unwrap_or(0.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub entity_id: String,
    /// Year-month string such as `"2023-04"`.
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub round: Option<String>,
    #[serde(default)]
    pub investor: Option<String>,
    #[serde(default)]
    pub amount: Option<NumericField>,
    #[serde(default)]
    pub pre_share: Option<NumericField>,
    #[serde(default)]
    pub post_share: Option<NumericField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub entity_id: String,
    pub year: String,
    #[serde(default)]
    pub revenue_domestic: Option<NumericField>,
    #[serde(default)]
    pub revenue_overseas: Option<NumericField>,
    #[serde(default)]
    pub employees: Option<NumericField>,
}
