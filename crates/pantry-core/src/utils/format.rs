/// Format a price for display, `N/A` when the API omitted it
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(amount) => format!("${:.2}", amount),
        None => "N/A".to_string(),
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Some(3.5)), "$3.50");
        assert_eq!(format_currency(Some(12.999)), "$13.00");
        assert_eq!(format_currency(Some(0.0)), "$0.00");
        assert_eq!(format_currency(None), "N/A");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("01400943"), "none"), "01400943");
        assert_eq!(format_optional(None, "none"), "none");
    }
}
