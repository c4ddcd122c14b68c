//! Customers

use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::TypedUuid,
    repository::Entity,
    validation::{self, ValidationError},
};

pub mod search;

pub use search::{CustomerQuery, RankingTier};

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// Address UUID
pub type AddressUuid = TypedUuid<Address>;

/// Saved card UUID
pub type CardUuid = TypedUuid<SavedCard>;

/// Prefix of customer codes (`CLI001`, `CLI002`, ...).
pub const CUSTOMER_CODE_PREFIX: &str = "CLI";

/// Customer code for the `sequence`th registered customer.
pub fn customer_code(sequence: usize) -> String {
    format!("{CUSTOMER_CODE_PREFIX}{sequence:03}")
}

/// Profile maintenance errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CustomerError {
    /// No such address on file.
    #[error("address {0} not found")]
    AddressNotFound(AddressUuid),

    /// No such card on file.
    #[error("card {0} not found")]
    CardNotFound(CardUuid),

    /// The default address has to be replaced before it can go.
    #[error("address {0} is the default; choose another default first")]
    DefaultAddress(AddressUuid),

    /// The default card has to be replaced before it can go.
    #[error("card {0} is the default; choose another default first")]
    DefaultCard(CardUuid),
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    /// May log in and purchase.
    #[default]
    Active,

    /// Locked out.
    Inactive,
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
        })
    }
}

/// Gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// Male
    #[serde(rename = "M")]
    Male,

    /// Female
    #[serde(rename = "F")]
    Female,

    /// Other
    #[serde(rename = "O")]
    Other,
}

/// What an address may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    /// Delivery only.
    Delivery,

    /// Billing only.
    Billing,

    /// Delivery and billing.
    #[default]
    Both,
}

impl AddressType {
    /// Whether orders may be shipped here.
    pub fn delivers(self) -> bool {
        matches!(self, AddressType::Delivery | AddressType::Both)
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressType::Delivery => "delivery",
            AddressType::Billing => "billing",
            AddressType::Both => "delivery and billing",
        })
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Identifier
    pub uuid: AddressUuid,

    /// Customer-chosen label, e.g. "Casa".
    pub identifier: String,

    /// Usage
    #[serde(default)]
    pub kind: AddressType,

    /// Residence type, e.g. "Apartamento".
    #[serde(default)]
    pub residence_type: String,

    /// Street
    pub street: String,

    /// Number
    pub number: String,

    /// Complement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,

    /// Neighborhood
    pub neighborhood: String,

    /// City
    pub city: String,

    /// State
    pub state: String,

    /// Country
    #[serde(default = "default_country")]
    pub country: String,

    /// Zip code (CEP)
    pub zip_code: String,

    /// Delivery notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,

    /// Preselected at checkout.
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "Brasil".to_string()
}

impl Address {
    /// Check the fields a deliverable address needs.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("identifier", &self.identifier)?;
        validation::required("street", &self.street)?;
        validation::required("number", &self.number)?;
        validation::required("neighborhood", &self.neighborhood)?;
        validation::required("city", &self.city)?;
        validation::required("state", &self.state)?;
        validation::zip_code(&self.zip_code)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.street, self.number)?;

        if let Some(complement) = &self.complement {
            write!(f, " ({complement})")?;
        }

        write!(
            f,
            " - {}, {}/{} - {}",
            self.neighborhood, self.city, self.state, self.zip_code
        )
    }
}

/// Card network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    /// Visa
    Visa,

    /// Mastercard
    Mastercard,

    /// American Express
    Amex,

    /// Elo
    Elo,

    /// Hipercard
    Hipercard,
}

impl CardBrand {
    /// Guess the network from the leading digits of a card number.
    pub fn detect(number: &str) -> Option<Self> {
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();

        if digits.starts_with("4011") || digits.starts_with("4389") || digits.starts_with("5067") {
            Some(CardBrand::Elo)
        } else if digits.starts_with("6062") || digits.starts_with("3841") {
            Some(CardBrand::Hipercard)
        } else if digits.starts_with("34") || digits.starts_with("37") {
            Some(CardBrand::Amex)
        } else if digits.starts_with('4') {
            Some(CardBrand::Visa)
        } else if digits.starts_with('5') || digits.starts_with('2') {
            Some(CardBrand::Mastercard)
        } else {
            None
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "American Express",
            CardBrand::Elo => "Elo",
            CardBrand::Hipercard => "Hipercard",
        })
    }
}

/// A card kept on file. Only the last four digits are retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCard {
    /// Identifier
    pub uuid: CardUuid,

    /// Network
    pub brand: CardBrand,

    /// Last four digits.
    pub last_four: String,

    /// Name printed on the card.
    pub holder: String,

    /// Expiry month, 1-12.
    pub expiry_month: i8,

    /// Expiry year.
    pub expiry_year: i16,

    /// Preselected at checkout.
    #[serde(default)]
    pub is_default: bool,
}

impl SavedCard {
    /// Keep a card on file from its full number.
    pub fn from_number(
        brand: CardBrand,
        number: &str,
        holder: impl Into<String>,
        expiry: (i8, i16),
    ) -> Self {
        let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
        let last_four: String = digits.iter().skip(digits.len().saturating_sub(4)).collect();

        Self {
            uuid: CardUuid::new(),
            brand,
            last_four,
            holder: holder.into(),
            expiry_month: expiry.0,
            expiry_year: expiry.1,
            is_default: false,
        }
    }

    /// Masked number for display, e.g. `**** **** **** 9012`.
    pub fn masked(&self) -> String {
        format!("**** **** **** {}", self.last_four)
    }
}

impl fmt::Display for SavedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.brand, self.masked())
    }
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Identifier
    pub uuid: CustomerUuid,

    /// Human-facing code, e.g. `CLI001`.
    pub code: String,

    /// Full name
    pub name: String,

    /// CPF, digits and punctuation as entered.
    pub cpf: String,

    /// Login email
    pub email: String,

    /// Hex SHA-256 of the password. Simulation only.
    pub password_digest: String,

    /// Gender
    pub gender: Gender,

    /// Birth date
    pub birth_date: Date,

    /// Phone
    pub phone: String,

    /// Loyalty ranking, starting at 1.
    #[serde(default = "default_ranking")]
    pub ranking: u8,

    /// Addresses on file.
    #[serde(default)]
    pub addresses: Vec<Address>,

    /// Cards on file.
    #[serde(default)]
    pub cards: Vec<SavedCard>,

    /// Account status
    #[serde(default)]
    pub status: CustomerStatus,
}

fn default_ranking() -> u8 {
    1
}

impl Entity for Customer {
    type Id = CustomerUuid;

    fn id(&self) -> CustomerUuid {
        self.uuid
    }
}

impl Customer {
    /// Whether the customer may log in.
    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }

    /// Look up an address on file.
    pub fn address(&self, uuid: AddressUuid) -> Option<&Address> {
        self.addresses.iter().find(|a| a.uuid == uuid)
    }

    /// Look up a card on file.
    pub fn card(&self, uuid: CardUuid) -> Option<&SavedCard> {
        self.cards.iter().find(|c| c.uuid == uuid)
    }

    /// The address preselected for delivery: the default one if it delivers,
    /// otherwise the first that does.
    pub fn default_delivery_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.is_default && a.kind.delivers())
            .or_else(|| self.addresses.iter().find(|a| a.kind.delivers()))
    }

    /// Add an address, making it the default if it is the first.
    pub fn add_address(&mut self, mut address: Address) {
        if self.addresses.is_empty() {
            address.is_default = true;
        }

        self.addresses.push(address);
    }

    /// Add a card, making it the default if it is the first.
    pub fn add_card(&mut self, mut card: SavedCard) {
        if self.cards.is_empty() {
            card.is_default = true;
        }

        self.cards.push(card);
    }

    /// Replace an address's details, keeping its identity and default flag.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::AddressNotFound`].
    pub fn update_address(&mut self, uuid: AddressUuid, mut address: Address) -> Result<&Address, CustomerError> {
        let slot = self
            .addresses
            .iter_mut()
            .find(|a| a.uuid == uuid)
            .ok_or(CustomerError::AddressNotFound(uuid))?;

        address.uuid = uuid;
        address.is_default = slot.is_default;
        *slot = address;

        Ok(slot)
    }

    /// Drop a non-default address.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::AddressNotFound`], or
    /// [`CustomerError::DefaultAddress`] for the default one.
    pub fn remove_address(&mut self, uuid: AddressUuid) -> Result<Address, CustomerError> {
        let index = self
            .addresses
            .iter()
            .position(|a| a.uuid == uuid)
            .ok_or(CustomerError::AddressNotFound(uuid))?;

        if self.addresses.get(index).is_some_and(|a| a.is_default) {
            return Err(CustomerError::DefaultAddress(uuid));
        }

        Ok(self.addresses.remove(index))
    }

    /// Make one address the default and clear the flag on the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::AddressNotFound`].
    pub fn set_default_address(&mut self, uuid: AddressUuid) -> Result<(), CustomerError> {
        if self.address(uuid).is_none() {
            return Err(CustomerError::AddressNotFound(uuid));
        }

        for address in &mut self.addresses {
            address.is_default = address.uuid == uuid;
        }

        Ok(())
    }

    /// Change the holder name and expiry of a card on file. The number
    /// cannot change; a new number is a new card.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::CardNotFound`].
    pub fn update_card(
        &mut self,
        uuid: CardUuid,
        holder: impl Into<String>,
        expiry: (i8, i16),
    ) -> Result<&SavedCard, CustomerError> {
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.uuid == uuid)
            .ok_or(CustomerError::CardNotFound(uuid))?;

        card.holder = holder.into();
        card.expiry_month = expiry.0;
        card.expiry_year = expiry.1;

        Ok(card)
    }

    /// Drop a non-default card.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::CardNotFound`], or
    /// [`CustomerError::DefaultCard`] for the default one.
    pub fn remove_card(&mut self, uuid: CardUuid) -> Result<SavedCard, CustomerError> {
        let index = self
            .cards
            .iter()
            .position(|c| c.uuid == uuid)
            .ok_or(CustomerError::CardNotFound(uuid))?;

        if self.cards.get(index).is_some_and(|c| c.is_default) {
            return Err(CustomerError::DefaultCard(uuid));
        }

        Ok(self.cards.remove(index))
    }

    /// Make one card the default and clear the flag on the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::CardNotFound`].
    pub fn set_default_card(&mut self, uuid: CardUuid) -> Result<(), CustomerError> {
        if self.card(uuid).is_none() {
            return Err(CustomerError::CardNotFound(uuid));
        }

        for card in &mut self.cards {
            card.is_default = card.uuid == uuid;
        }

        Ok(())
    }
}

/// A store administrator's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    /// Login email
    pub email: String,

    /// Hex SHA-256 of the password. Simulation only.
    pub password_digest: String,
}

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum User {
    /// Store administrator.
    Admin {
        /// Login email
        email: String,
    },

    /// A customer.
    Customer {
        /// Their record at login time.
        customer: Box<Customer>,
    },
}

impl User {
    /// Login email
    pub fn email(&self) -> &str {
        match self {
            User::Admin { email } => email,
            User::Customer { customer } => &customer.email,
        }
    }

    /// Whether this user may manage the store.
    pub fn is_admin(&self) -> bool {
        matches!(self, User::Admin { .. })
    }

    /// The owning-customer key, if a customer is logged in.
    pub fn customer_id(&self) -> Option<CustomerUuid> {
        match self {
            User::Admin { .. } => None,
            User::Customer { customer } => Some(customer.uuid),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use jiff::civil::date;

    use super::*;

    pub(crate) fn address(identifier: &str) -> Address {
        Address {
            uuid: AddressUuid::new(),
            identifier: identifier.to_string(),
            kind: AddressType::Both,
            residence_type: "Casa".to_string(),
            street: "Rua das Flores".to_string(),
            number: "123".to_string(),
            complement: None,
            neighborhood: "Centro".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            country: "Brasil".to_string(),
            zip_code: "01310-100".to_string(),
            observations: None,
            is_default: false,
        }
    }

    pub(crate) fn customer(name: &str) -> Customer {
        let mut customer = Customer {
            uuid: CustomerUuid::new(),
            code: customer_code(1),
            name: name.to_string(),
            cpf: "529.982.247-25".to_string(),
            email: format!("{}@email.com", name.to_lowercase().replace(' ', ".")),
            password_digest: String::new(),
            gender: Gender::Other,
            birth_date: date(1990, 5, 15),
            phone: "(11) 99999-9999".to_string(),
            ranking: 1,
            addresses: Vec::new(),
            cards: Vec::new(),
            status: CustomerStatus::Active,
        };

        customer.add_address(address("Casa"));

        customer
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::{test_support::*, *};

    #[test]
    fn customer_codes_are_zero_padded() {
        assert_eq!(customer_code(3), "CLI003");
        assert_eq!(customer_code(1234), "CLI1234");
    }

    #[test]
    fn first_address_becomes_default() {
        let mut customer = customer("João Silva");
        let mut billing = address("Escritório");
        billing.kind = AddressType::Billing;

        customer.add_address(billing);

        let default = customer.default_delivery_address().map(|a| a.identifier.as_str());

        assert_eq!(default, Some("Casa"));
        assert_eq!(customer.addresses.iter().filter(|a| a.is_default).count(), 1);
    }

    #[test]
    fn default_address_moves_and_cannot_be_removed() -> TestResult {
        let mut customer = customer("Ana Silva");
        let home = customer.addresses.first().map(|a| a.uuid).ok_or("no address")?;
        let office = address("Escritório");
        let office_id = office.uuid;

        customer.add_address(office);

        assert_eq!(customer.remove_address(home), Err(CustomerError::DefaultAddress(home)));

        customer.set_default_address(office_id)?;

        assert_eq!(customer.addresses.iter().filter(|a| a.is_default).count(), 1);
        assert_eq!(customer.remove_address(home)?.identifier, "Casa");
        assert_eq!(customer.addresses.len(), 1);

        let stranger = AddressUuid::new();

        assert_eq!(
            customer.set_default_address(stranger),
            Err(CustomerError::AddressNotFound(stranger))
        );

        Ok(())
    }

    #[test]
    fn address_edits_keep_identity_and_default() -> TestResult {
        let mut customer = customer("Ana Silva");
        let home = customer.addresses.first().map(|a| a.uuid).ok_or("no address")?;
        let mut moved = address("Casa Nova");
        moved.street = "Rua Nova".to_string();

        let updated = customer.update_address(home, moved)?;

        assert_eq!(updated.uuid, home);
        assert!(updated.is_default);
        assert_eq!(updated.street, "Rua Nova");

        Ok(())
    }

    #[test]
    fn cards_can_be_edited_and_swapped() -> TestResult {
        let mut customer = customer("Ana Silva");
        let first = SavedCard::from_number(CardBrand::Visa, "4532 1234 5678 9012", "ANA", (12, 2027));
        let second = SavedCard::from_number(CardBrand::Mastercard, "5555 4444 3333 2222", "ANA", (1, 2028));
        let (first_id, second_id) = (first.uuid, second.uuid);

        customer.add_card(first);
        customer.add_card(second);

        assert_eq!(customer.remove_card(first_id), Err(CustomerError::DefaultCard(first_id)));

        let edited = customer.update_card(second_id, "ANA S SILVA", (6, 2031))?;

        assert_eq!((edited.expiry_month, edited.expiry_year), (6, 2031));
        assert_eq!(edited.last_four, "2222");

        customer.set_default_card(second_id)?;
        customer.remove_card(first_id)?;

        assert_eq!(customer.cards.len(), 1);
        assert!(customer.cards.iter().all(|c| c.is_default));

        Ok(())
    }

    #[test]
    fn saved_cards_keep_only_last_four() {
        let card = SavedCard::from_number(CardBrand::Visa, "4532 1234 5678 9012", "João", (12, 2027));

        assert_eq!(card.last_four, "9012");
        assert_eq!(card.to_string(), "Visa **** **** **** 9012");
    }

    #[test]
    fn detects_common_brands() {
        assert_eq!(CardBrand::detect("4532 1234 5678 9012"), Some(CardBrand::Visa));
        assert_eq!(CardBrand::detect("5555 4444 3333 2222"), Some(CardBrand::Mastercard));
        assert_eq!(CardBrand::detect("3782 822463 10005"), Some(CardBrand::Amex));
        assert_eq!(CardBrand::detect("9999"), None);
    }

    #[test]
    fn user_round_trips_with_role_tag() -> TestResult {
        let user = User::Admin {
            email: "admin@bookstore.com".to_string(),
        };

        let json = serde_json::to_string(&user)?;

        assert_eq!(json, r#"{"role":"admin","email":"admin@bookstore.com"}"#);
        assert_eq!(serde_json::from_str::<User>(&json)?, user);

        Ok(())
    }
}
