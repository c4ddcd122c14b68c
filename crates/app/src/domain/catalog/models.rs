//! Catalog Models

use estante::books::{Dimensions, PricingGroup};

/// New Book Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub categories: Vec<String>,
    pub price: u64,
    pub stock: u32,
    pub synopsis: String,
    pub dimensions: Dimensions,
    pub pages: u32,
    pub publisher: String,
    pub year: i16,
    pub edition: String,
    pub barcode: String,
    pub pricing_group: PricingGroup,
    pub exchangeable: bool,
}

/// Book Update Model. `None` leaves a field unchanged; stock only moves
/// through inventory entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub categories: Option<Vec<String>>,
    pub price: Option<u64>,
    pub synopsis: Option<String>,
    pub pricing_group: Option<PricingGroup>,
    pub exchangeable: Option<bool>,
}
