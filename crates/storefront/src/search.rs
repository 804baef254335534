//! Product search over an already-fetched listing.

use thiserror::Error;

use crate::catalog::Product;

/// Search input rejected before filtering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search text cannot be empty")]
    EmptyQuery,
}

/// Products whose title contains `text`, case-insensitively, in listing order.
///
/// # Errors
///
/// Returns `SearchError::EmptyQuery` if `text` is blank.
pub fn filter_by_title<'a>(
    products: &'a [Product],
    text: &str,
) -> Result<Vec<&'a Product>, SearchError> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    Ok(products
        .iter()
        .filter(|product| product.title.to_lowercase().contains(&needle))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn products(titles: &[&str]) -> Vec<Product> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                serde_json::from_value(serde_json::json!({
                    "id": i + 1,
                    "title": title,
                    "price": 10,
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_case_insensitive_substring() {
        let listing = products(&["Red Lipstick", "Eyeshadow Palette", "Lip Balm"]);
        let found = filter_by_title(&listing, "LIP").unwrap();
        let titles: Vec<_> = found.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Red Lipstick", "Lip Balm"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let listing = products(&["Red Lipstick"]);
        assert!(filter_by_title(&listing, "sofa").unwrap().is_empty());
    }

    #[test]
    fn test_blank_query_rejected() {
        let listing = products(&["Red Lipstick"]);
        assert_eq!(filter_by_title(&listing, "   "), Err(SearchError::EmptyQuery));
    }

    #[test]
    fn test_query_is_trimmed() {
        let listing = products(&["Red Lipstick"]);
        assert_eq!(filter_by_title(&listing, "  red ").unwrap().len(), 1);
    }
}
