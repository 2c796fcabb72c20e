use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueLine {
    pub id: Option<i64>,
    pub budget_id: i64,
    pub source_label: String,
    pub projected_amount: Decimal,
}

impl RevenueLine {
    #[cfg(test)]
    pub fn new(budget_id: i64, source_label: String, projected_amount: Decimal) -> Self {
        Self {
            id: None,
            budget_id,
            source_label,
            projected_amount,
        }
    }
}
