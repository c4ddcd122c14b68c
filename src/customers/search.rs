//! Customer search

use std::fmt;

use crate::customers::{Customer, CustomerStatus, Gender};

/// Loyalty band derived from a customer's ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingTier {
    /// 80 and up.
    High,

    /// 60 to 79.
    Medium,

    /// Below 60.
    Low,
}

impl RankingTier {
    /// Band for a ranking score.
    pub fn of(ranking: u8) -> Self {
        match ranking {
            80.. => RankingTier::High,
            60..=79 => RankingTier::Medium,
            _ => RankingTier::Low,
        }
    }
}

impl fmt::Display for RankingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RankingTier::High => "premium",
            RankingTier::Medium => "intermediate",
            RankingTier::Low => "basic",
        })
    }
}

/// Admin customer listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    /// Case-insensitive match against name, email, CPF or customer code.
    pub text: Option<String>,

    /// Restrict to one account status.
    pub status: Option<CustomerStatus>,

    /// Restrict to one gender.
    pub gender: Option<Gender>,

    /// Restrict to one ranking band.
    pub ranking: Option<RankingTier>,
}

impl CustomerQuery {
    /// Whether `customer` passes every filter.
    pub fn matches(&self, customer: &Customer) -> bool {
        if self.status.is_some_and(|s| customer.status != s) {
            return false;
        }

        if self.gender.is_some_and(|g| customer.gender != g) {
            return false;
        }

        if self.ranking.is_some_and(|r| RankingTier::of(customer.ranking) != r) {
            return false;
        }

        match self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => {
                let needle = text.to_lowercase();

                customer.name.to_lowercase().contains(&needle)
                    || customer.email.to_lowercase().contains(&needle)
                    || customer.cpf.contains(text)
                    || customer.code.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    /// Matching customers, by code.
    pub fn apply<'a>(&self, customers: impl IntoIterator<Item = &'a Customer>) -> Vec<&'a Customer> {
        let mut hits: Vec<&Customer> = customers.into_iter().filter(|c| self.matches(c)).collect();

        hits.sort_by(|a, b| a.code.cmp(&b.code));

        hits
    }
}
