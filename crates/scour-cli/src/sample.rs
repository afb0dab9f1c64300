//! Deterministic sample dataset generation.
//!
//! Produces an orders dataset with the kinds of dirt the cleaning steps
//! exist for: stray whitespace, currency symbols in numeric columns, and a
//! sprinkling of invalid emails. No randomness, so sample runs are
//! reproducible.

use chrono::{Duration, Utc};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, PolarsResult, Series};

const CURRENCIES: [&str; 3] = ["USD", "EUR", "GBP"];

/// Build a sample orders frame with `rows` rows.
pub fn sample_frame(rows: usize) -> PolarsResult<DataFrame> {
    let today = Utc::now().date_naive();

    let mut order_ids = Vec::with_capacity(rows);
    let mut order_dates = Vec::with_capacity(rows);
    let mut total_prices = Vec::with_capacity(rows);
    let mut currencies = Vec::with_capacity(rows);
    let mut emails = Vec::with_capacity(rows);
    let mut addresses = Vec::with_capacity(rows);
    let mut product_names = Vec::with_capacity(rows);
    let mut comments = Vec::with_capacity(rows);

    for index in 0..rows {
        order_ids.push(format!("ORD-{index:08}"));
        let date = today - Duration::days((index % 365) as i64);
        order_dates.push(date.format("%Y-%m-%d").to_string());

        // Price walks a fixed cycle; every tenth row carries a currency
        // symbol that the sanitizer has to strip before conversion.
        let price = 10.0 + (index * 37 % 990) as f64 + (index % 100) as f64 / 100.0;
        if index % 10 == 0 {
            total_prices.push(format!("${price:.2}"));
        } else {
            total_prices.push(format!("{price:.2}"));
        }

        currencies.push(CURRENCIES[index % CURRENCIES.len()].to_string());
        if index % 20 == 0 {
            emails.push("invalid_email".to_string());
        } else {
            emails.push(format!("customer{index}@example.com"));
        }
        addresses.push(format!("{index} Main St, City {}", index % 50));
        product_names.push(format!("  Product {index} !"));
        comments.push(format!("Sample comment {index} that needs processing   ..."));
    }

    DataFrame::new(vec![
        Series::new("order_id".into(), order_ids).into_column(),
        Series::new("order_date".into(), order_dates).into_column(),
        Series::new("total_price".into(), total_prices).into_column(),
        Series::new("currency".into(), currencies).into_column(),
        Series::new("customer_email".into(), emails).into_column(),
        Series::new("customer_address".into(), addresses).into_column(),
        Series::new("product_name".into(), product_names).into_column(),
        Series::new("customer_comments".into(), comments).into_column(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_deterministic() {
        let a = sample_frame(50).unwrap();
        let b = sample_frame(50).unwrap();
        assert!(a.equals(&b));
        assert_eq!(a.height(), 50);
        assert_eq!(a.width(), 8);
    }

    #[test]
    fn sample_contains_planted_dirt() {
        let df = sample_frame(40).unwrap();
        let prices = df.column("total_price").unwrap();
        let prices = prices.str().unwrap();
        assert!(prices.get(0).unwrap().starts_with('$'));
        assert!(!prices.get(1).unwrap().starts_with('$'));

        let emails = df.column("customer_email").unwrap();
        let emails = emails.str().unwrap();
        assert_eq!(emails.get(0), Some("invalid_email"));
        assert_eq!(emails.get(1), Some("customer1@example.com"));
    }
}
