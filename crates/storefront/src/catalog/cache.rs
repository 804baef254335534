//! Cache types for catalog responses.

use super::{Product, ProductPage};
use subify_core::ProductId;

/// Cache key for product listings and details.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products { limit: u32, skip: u32 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
}
