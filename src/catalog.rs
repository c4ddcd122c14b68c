//! Catalog queries

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::books::{Book, BookStatus};

/// Field to order catalog results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Alphabetical by title.
    #[default]
    Title,

    /// By unit price.
    Price,

    /// Alphabetical by author.
    Author,

    /// By publication year.
    Year,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,

    /// Largest first.
    Descending,
}

/// Filters and ordering for a catalog listing. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive match against title, author or ISBN.
    pub text: Option<String>,

    /// Exact (case-insensitive) category.
    pub category: Option<String>,

    /// Case-insensitive author substring.
    pub author: Option<String>,

    /// Inclusive lower price bound, in centavos.
    pub min_price: Option<u64>,

    /// Inclusive upper price bound, in centavos.
    pub max_price: Option<u64>,

    /// Restrict to a sale status. Storefront listings pass `Active`.
    pub status: Option<BookStatus>,

    /// Sort field.
    pub sort: SortKey,

    /// Sort direction.
    pub order: SortOrder,
}

impl CatalogQuery {
    /// The storefront listing: active books only, by title.
    pub fn storefront() -> Self {
        Self {
            status: Some(BookStatus::Active),
            ..Self::default()
        }
    }

    /// Whether `book` passes every filter.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(text) = non_blank(self.text.as_deref()) {
            let needle = text.to_lowercase();

            let hit = book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
                || book.isbn.to_lowercase().contains(&needle);

            if !hit {
                return false;
            }
        }

        if let Some(category) = non_blank(self.category.as_deref())
            && !book
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
        {
            return false;
        }

        if let Some(author) = non_blank(self.author.as_deref())
            && !book
                .author
                .to_lowercase()
                .contains(&author.to_lowercase())
        {
            return false;
        }

        if self.min_price.is_some_and(|min| book.price < min)
            || self.max_price.is_some_and(|max| book.price > max)
        {
            return false;
        }

        self.status.is_none_or(|status| book.status == status)
    }

    /// Apply the filters and ordering to `books`.
    pub fn apply<'a>(&self, books: impl IntoIterator<Item = &'a Book>) -> Vec<&'a Book> {
        let mut hits: Vec<&Book> = books.into_iter().filter(|b| self.matches(b)).collect();

        hits.sort_by(|a, b| {
            let ordering = compare(a, b, self.sort);

            match self.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        hits
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn compare(a: &Book, b: &Book, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
        SortKey::Year => a.year.cmp(&b.year),
    }
}

/// Distinct categories across `books`, sorted.
pub fn categories<'a>(books: impl IntoIterator<Item = &'a Book>) -> Vec<String> {
    let mut all: Vec<String> = books
        .into_iter()
        .flat_map(|b| b.categories.iter().cloned())
        .collect();

    all.sort();
    all.dedup();

    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::test_support::book;

    fn shelf() -> Vec<Book> {
        let mut dom = book("Dom Casmurro", 29_90, 30);
        dom.author = "Machado de Assis".to_string();
        dom.categories = vec!["Literatura".to_string()];
        dom.year = 1899;

        let mut clean = book("Clean Code", 89_90, 4);
        clean.author = "Robert C. Martin".to_string();
        clean.categories = vec!["Tecnologia".to_string()];
        clean.year = 2008;

        let mut pequeno = book("O Pequeno Príncipe", 19_90, 0);
        pequeno.author = "Antoine de Saint-Exupéry".to_string();
        pequeno.categories = vec!["Infantil".to_string(), "Literatura".to_string()];
        pequeno.year = 1943;
        pequeno.status = BookStatus::Inactive;

        vec![dom, clean, pequeno]
    }

    fn titles(hits: &[&Book]) -> Vec<String> {
        hits.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn empty_query_returns_everything_by_title() {
        let books = shelf();

        let hits = CatalogQuery::default().apply(&books);

        assert_eq!(
            titles(&hits),
            vec!["Clean Code", "Dom Casmurro", "O Pequeno Príncipe"]
        );
    }

    #[test]
    fn storefront_hides_inactive_books() {
        let books = shelf();

        let hits = CatalogQuery::storefront().apply(&books);

        assert_eq!(titles(&hits), vec!["Clean Code", "Dom Casmurro"]);
    }

    #[test]
    fn text_matches_author_case_insensitively() {
        let books = shelf();
        let query = CatalogQuery {
            text: Some("machado".to_string()),
            ..CatalogQuery::default()
        };

        assert_eq!(titles(&query.apply(&books)), vec!["Dom Casmurro"]);
    }

    #[test]
    fn category_and_price_range_combine() {
        let books = shelf();
        let query = CatalogQuery {
            category: Some("literatura".to_string()),
            max_price: Some(25_00),
            ..CatalogQuery::default()
        };

        assert_eq!(titles(&query.apply(&books)), vec!["O Pequeno Príncipe"]);
    }

    #[test]
    fn sorts_by_price_descending() {
        let books = shelf();
        let query = CatalogQuery {
            sort: SortKey::Price,
            order: SortOrder::Descending,
            ..CatalogQuery::default()
        };

        assert_eq!(
            titles(&query.apply(&books)),
            vec!["Clean Code", "Dom Casmurro", "O Pequeno Príncipe"]
        );
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let books = shelf();

        assert_eq!(
            categories(&books),
            vec!["Infantil", "Literatura", "Tecnologia"]
        );
    }
}
