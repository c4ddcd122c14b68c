//! Customer Fixtures

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::Deserialize;

use crate::{
    customers::{
        Address, AddressType, AddressUuid, AdminAccount, CardBrand, CardUuid, Customer,
        CustomerStatus, CustomerUuid, Gender, SavedCard,
    },
    fixtures::FixtureError,
};

/// Wrapper for customers and admins in YAML
#[derive(Debug, Deserialize)]
pub struct CustomersFixture {
    /// Map of customer key -> customer fixture
    #[serde(default)]
    pub customers: BTreeMap<String, CustomerFixture>,

    /// Administrator accounts
    #[serde(default)]
    pub admins: Vec<AdminAccount>,
}

/// Customer fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CustomerFixture {
    /// Customer code, e.g. `CLI001`
    pub code: String,

    /// Full name
    pub name: String,

    /// CPF
    pub cpf: String,

    /// Login email
    pub email: String,

    /// Hex SHA-256 of the password
    pub password_digest: String,

    /// Gender
    pub gender: Gender,

    /// Birth date
    pub birth_date: Date,

    /// Phone
    pub phone: String,

    /// Ranking
    #[serde(default = "ranking")]
    pub ranking: u8,

    /// Addresses
    #[serde(default)]
    pub addresses: Vec<AddressFixture>,

    /// Saved cards
    #[serde(default)]
    pub cards: Vec<CardFixture>,

    /// Account status
    #[serde(default)]
    pub status: CustomerStatus,
}

fn ranking() -> u8 {
    1
}

/// Address fixture from YAML
#[derive(Debug, Deserialize)]
pub struct AddressFixture {
    /// Label
    pub identifier: String,

    /// Usage
    #[serde(default)]
    pub kind: AddressType,

    /// Residence type
    #[serde(default)]
    pub residence_type: String,

    /// Street
    pub street: String,

    /// Number
    pub number: String,

    /// Complement
    #[serde(default)]
    pub complement: Option<String>,

    /// Neighborhood
    pub neighborhood: String,

    /// City
    pub city: String,

    /// State
    pub state: String,

    /// Country
    #[serde(default)]
    pub country: Option<String>,

    /// Zip code
    pub zip_code: String,

    /// Delivery notes
    #[serde(default)]
    pub observations: Option<String>,

    /// Default flag
    #[serde(default)]
    pub is_default: bool,
}

impl From<AddressFixture> for Address {
    fn from(fixture: AddressFixture) -> Self {
        Self {
            uuid: AddressUuid::new(),
            identifier: fixture.identifier,
            kind: fixture.kind,
            residence_type: fixture.residence_type,
            street: fixture.street,
            number: fixture.number,
            complement: fixture.complement.filter(|c| !c.is_empty()),
            neighborhood: fixture.neighborhood,
            city: fixture.city,
            state: fixture.state,
            country: fixture.country.unwrap_or_else(|| "Brasil".to_string()),
            zip_code: fixture.zip_code,
            observations: fixture.observations.filter(|o| !o.is_empty()),
            is_default: fixture.is_default,
        }
    }
}

/// Saved card fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CardFixture {
    /// Network
    pub brand: CardBrand,

    /// Last four digits
    pub last_four: String,

    /// Name on card
    pub holder: String,

    /// Expiry, `MM/YY`
    pub expiry: String,

    /// Default flag
    #[serde(default)]
    pub is_default: bool,
}

impl TryFrom<CardFixture> for SavedCard {
    type Error = FixtureError;

    fn try_from(fixture: CardFixture) -> Result<Self, Self::Error> {
        let (expiry_month, expiry_year) = parse_expiry(&fixture.expiry)?;

        Ok(Self {
            uuid: CardUuid::new(),
            brand: fixture.brand,
            last_four: fixture.last_four,
            holder: fixture.holder,
            expiry_month,
            expiry_year,
            is_default: fixture.is_default,
        })
    }
}

/// Parse a card expiry in `MM/YY` form into `(month, year)`.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidExpiry`] if the string is malformed or the month is out of range.
pub fn parse_expiry(s: &str) -> Result<(i8, i16), FixtureError> {
    let invalid = || FixtureError::InvalidExpiry(s.to_string());

    let (month, year) = s.trim().split_once('/').ok_or_else(invalid)?;
    let month: i8 = month.parse().map_err(|_err| invalid())?;
    let year: i16 = year.parse().map_err(|_err| invalid())?;

    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let year = if year < 100 { year + 2000 } else { year };

    Ok((month, year))
}

impl TryFrom<CustomerFixture> for Customer {
    type Error = FixtureError;

    fn try_from(fixture: CustomerFixture) -> Result<Self, Self::Error> {
        let cards = fixture
            .cards
            .into_iter()
            .map(SavedCard::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            uuid: CustomerUuid::new(),
            code: fixture.code,
            name: fixture.name,
            cpf: fixture.cpf,
            email: fixture.email,
            password_digest: fixture.password_digest,
            gender: fixture.gender,
            birth_date: fixture.birth_date,
            phone: fixture.phone,
            ranking: fixture.ranking,
            addresses: fixture.addresses.into_iter().map(Address::from).collect(),
            cards,
            status: fixture.status,
        })
    }
}
