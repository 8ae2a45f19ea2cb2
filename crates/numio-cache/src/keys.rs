//! Cache key constants and builders
//!
//! Standardized key naming for cached price data.
//!
//! # Key Patterns
//!
//! - `price:{country_id}:{application_id}` - One price entry
//! - `prices:country:{country_id}` - All active entries for a country

/// Prefix for individual price entries
///
/// Format: `price:{country_id}:{application_id}`
pub const PRICE_PREFIX: &str = "price";

/// Prefix for per-country price lists
///
/// Format: `prices:country:{country_id}`
pub const COUNTRY_PRICES_PREFIX: &str = "prices:country";

/// Build a cache key for one price entry
///
/// # Example
///
/// ```
/// use numio_cache::keys::price_key;
///
/// assert_eq!(price_key(7, 12), "price:7:12");
/// ```
pub fn price_key(country_id: i32, application_id: i32) -> String {
    format!("{}:{}:{}", PRICE_PREFIX, country_id, application_id)
}

/// Build a cache key for a country's price list
///
/// # Example
///
/// ```
/// use numio_cache::keys::country_prices_key;
///
/// assert_eq!(country_prices_key(7), "prices:country:7");
/// ```
pub fn country_prices_key(country_id: i32) -> String {
    format!("{}:{}", COUNTRY_PRICES_PREFIX, country_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_key() {
        assert_eq!(price_key(7, 12), "price:7:12");
        assert_eq!(price_key(0, 0), "price:0:0");
    }

    #[test]
    fn test_country_prices_key() {
        assert_eq!(country_prices_key(7), "prices:country:7");
    }

    #[test]
    fn test_key_uniqueness() {
        let keys = vec![price_key(7, 12), price_key(12, 7), country_prices_key(7)];
        let unique = keys.iter().collect::<std::collections::HashSet<_>>().len();
        assert_eq!(unique, keys.len());
    }
}
