pub const NOT_PROVIDED: &str = "Not provided";

/// Parses user-entered money. The whole trimmed input must be a finite number above zero.
pub fn parse_amount(input: &str) -> Option<f64> {
    let amount: f64 = input.trim().parse().ok()?;

    (amount.is_finite() && amount > 0.0).then_some(amount)
}

pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// Trimmed value, or `None` when nothing but whitespace was entered.
pub fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn or_not_provided(value: Option<&str>) -> String {
    value
        .filter(|v| !is_blank(v))
        .unwrap_or(NOT_PROVIDED)
        .to_string()
}
