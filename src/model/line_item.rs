use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named amount on a salary slip (allowance or deduction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    #[schema(example = "HRA")]
    pub name: String,
    #[schema(example = 12000.0)]
    pub amount: f64,
}

/// Sum of line-item amounts. Non-finite amounts count as zero.
pub fn sum_amounts<'a, I>(amounts: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    amounts
        .into_iter()
        .copied()
        .filter(|a| a.is_finite())
        .sum()
}

pub fn total(items: &[LineItem]) -> f64 {
    sum_amounts(items.iter().map(|i| &i.amount))
}

/// Validates a single money amount entered on a form.
pub fn validate_amount(field: &str, amount: f64) -> Result<(), String> {
    if !amount.is_finite() {
        return Err(format!("{field} must be a number"));
    }
    if amount < 0.0 {
        return Err(format!("{field} cannot be negative"));
    }
    Ok(())
}

pub fn validate_items(kind: &str, items: &[LineItem]) -> Result<(), String> {
    for item in items {
        if item.name.trim().is_empty() {
            return Err(format!("{kind} name cannot be empty"));
        }
        validate_amount(&format!("{kind} '{}'", item.name), item.amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, amount: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn total_ignores_non_finite() {
        let items = vec![item("HRA", 1000.0), item("DA", f64::NAN), item("TA", 250.5)];
        assert_eq!(total(&items), 1250.5);
        assert_eq!(total(&[]), 0.0);
    }

    #[test]
    fn rejects_negative_and_unnamed() {
        assert!(validate_items("Allowance", &[item("HRA", 10.0)]).is_ok());
        assert_eq!(
            validate_items("Deduction", &[item("PF", -1.0)]).unwrap_err(),
            "Deduction 'PF' cannot be negative"
        );
        assert_eq!(
            validate_items("Allowance", &[item("  ", 1.0)]).unwrap_err(),
            "Allowance name cannot be empty"
        );
        assert!(validate_amount("amount", f64::INFINITY).is_err());
    }
}
