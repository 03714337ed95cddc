use std::str::FromStr;

use super::FormError;

/// Empty input is `None`; anything else must parse as an integer.
pub(crate) fn parse_optional_integer<T: FromStr>(
    raw: &str,
    field: &'static str,
) -> Result<Option<T>, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| FormError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_null() {
        assert_eq!(parse_optional_integer::<i64>("", "netWorth").unwrap(), None);
        assert_eq!(parse_optional_integer::<u32>("   ", "percentage").unwrap(), None);
    }

    #[test]
    fn digits_parse_as_integers() {
        assert_eq!(
            parse_optional_integer::<i64>(" 250000 ", "netWorth").unwrap(),
            Some(250_000)
        );
        assert_eq!(
            parse_optional_integer::<u32>("7", "yearsTrading").unwrap(),
            Some(7)
        );
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        match parse_optional_integer::<u32>("12.5", "percentage") {
            Err(FormError::InvalidNumber { field, value }) => {
                assert_eq!(field, "percentage");
                assert_eq!(value, "12.5");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
        assert!(parse_optional_integer::<u32>("-3", "yearsTrading").is_err());
    }
}
