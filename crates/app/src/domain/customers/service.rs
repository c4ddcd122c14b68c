//! Customers service.

use async_trait::async_trait;
use estante::{
    checkout::NewCard,
    customers::{Address, AddressUuid, CardUuid, Customer, CustomerQuery, CustomerStatus, CustomerUuid},
    validation,
};
use jiff::tz::TimeZone;
use mockall::automock;
use tracing::info;

use crate::domain::{Customers, SharedClock, customers::errors::CustomersServiceError};

#[derive(Clone)]
pub struct InMemoryCustomersService {
    customers: Customers,
    clock: SharedClock,
}

impl InMemoryCustomersService {
    #[must_use]
    pub fn new(customers: Customers, clock: SharedClock) -> Self {
        Self { customers, clock }
    }

    fn find(&self, uuid: CustomerUuid) -> Result<Customer, CustomersServiceError> {
        self.customers
            .find_by_id(uuid)?
            .ok_or(CustomersServiceError::NotFound(uuid))
    }

    /// Load, change and save one customer. A failed change saves nothing.
    fn modify(
        &self,
        uuid: CustomerUuid,
        change: impl FnOnce(&mut Customer) -> Result<(), CustomersServiceError>,
    ) -> Result<Customer, CustomersServiceError> {
        let mut customer = self.find(uuid)?;

        change(&mut customer)?;

        self.customers.save(customer.clone())?;

        Ok(customer)
    }
}

#[async_trait]
impl CustomersService for InMemoryCustomersService {
    async fn list(&self, query: CustomerQuery) -> Result<Vec<Customer>, CustomersServiceError> {
        let customers = self.customers.list()?;

        Ok(query.apply(&customers).into_iter().cloned().collect())
    }

    async fn get(&self, uuid: CustomerUuid) -> Result<Customer, CustomersServiceError> {
        self.find(uuid)
    }

    #[tracing::instrument(name = "customers.service.change_status", skip(self), fields(customer = %uuid, %status), err)]
    async fn change_status(
        &self,
        uuid: CustomerUuid,
        status: CustomerStatus,
    ) -> Result<Customer, CustomersServiceError> {
        let customer = self.modify(uuid, |customer| {
            customer.status = status;

            Ok(())
        })?;

        info!(customer = %uuid, code = %customer.code, %status, "customer status changed");

        Ok(customer)
    }

    #[tracing::instrument(name = "customers.service.add_address", skip(self, address), fields(%customer), err)]
    async fn add_address(
        &self,
        customer: CustomerUuid,
        mut address: Address,
    ) -> Result<Customer, CustomersServiceError> {
        address.validate()?;
        address.uuid = AddressUuid::new();
        address.is_default = false;

        self.modify(customer, |c| {
            c.add_address(address);

            Ok(())
        })
    }

    #[tracing::instrument(name = "customers.service.update_address", skip(self, address), fields(%customer, address = %uuid), err)]
    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: Address,
    ) -> Result<Customer, CustomersServiceError> {
        address.validate()?;

        self.modify(customer, |c| {
            c.update_address(uuid, address)?;

            Ok(())
        })
    }

    #[tracing::instrument(name = "customers.service.remove_address", skip(self), fields(%customer, address = %uuid), err)]
    async fn remove_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<Customer, CustomersServiceError> {
        self.modify(customer, |c| {
            c.remove_address(uuid)?;

            Ok(())
        })
    }

    async fn set_default_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<Customer, CustomersServiceError> {
        self.modify(customer, |c| Ok(c.set_default_address(uuid)?))
    }

    #[tracing::instrument(name = "customers.service.add_card", skip(self, card), fields(%customer), err)]
    async fn add_card(&self, customer: CustomerUuid, card: NewCard) -> Result<Customer, CustomersServiceError> {
        let today = self.clock.now().to_zoned(TimeZone::UTC).date();

        card.instrument(today)?;

        let saved = card.saved()?;

        self.modify(customer, |c| {
            c.add_card(saved);

            Ok(())
        })
    }

    #[tracing::instrument(name = "customers.service.update_card", skip(self, holder), fields(%customer, card = %uuid), err)]
    async fn update_card(
        &self,
        customer: CustomerUuid,
        uuid: CardUuid,
        holder: String,
        expiry: (i8, i16),
    ) -> Result<Customer, CustomersServiceError> {
        let today = self.clock.now().to_zoned(TimeZone::UTC).date();

        validation::required("card holder", &holder)?;
        validation::card_expiry(expiry, today)?;

        self.modify(customer, |c| {
            c.update_card(uuid, holder.trim(), expiry)?;

            Ok(())
        })
    }

    #[tracing::instrument(name = "customers.service.remove_card", skip(self), fields(%customer, card = %uuid), err)]
    async fn remove_card(&self, customer: CustomerUuid, uuid: CardUuid) -> Result<Customer, CustomersServiceError> {
        self.modify(customer, |c| {
            c.remove_card(uuid)?;

            Ok(())
        })
    }

    async fn set_default_card(
        &self,
        customer: CustomerUuid,
        uuid: CardUuid,
    ) -> Result<Customer, CustomersServiceError> {
        self.modify(customer, |c| Ok(c.set_default_card(uuid)?))
    }
}

#[automock]
#[async_trait]
pub trait CustomersService: Send + Sync {
    /// Customers matching `query`, by code.
    async fn list(&self, query: CustomerQuery) -> Result<Vec<Customer>, CustomersServiceError>;

    async fn get(&self, uuid: CustomerUuid) -> Result<Customer, CustomersServiceError>;

    /// Activate or inactivate an account. Inactive customers cannot log in.
    async fn change_status(
        &self,
        uuid: CustomerUuid,
        status: CustomerStatus,
    ) -> Result<Customer, CustomersServiceError>;

    /// Add an address; the first one becomes the default.
    async fn add_address(
        &self,
        customer: CustomerUuid,
        address: Address,
    ) -> Result<Customer, CustomersServiceError>;

    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: Address,
    ) -> Result<Customer, CustomersServiceError>;

    /// Drop an address other than the default.
    async fn remove_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<Customer, CustomersServiceError>;

    async fn set_default_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<Customer, CustomersServiceError>;

    /// Validate a card and keep its masked form on file.
    async fn add_card(&self, customer: CustomerUuid, card: NewCard) -> Result<Customer, CustomersServiceError>;

    /// Change the holder and expiry of a card on file.
    async fn update_card(
        &self,
        customer: CustomerUuid,
        uuid: CardUuid,
        holder: String,
        expiry: (i8, i16),
    ) -> Result<Customer, CustomersServiceError>;

    /// Drop a card other than the default.
    async fn remove_card(&self, customer: CustomerUuid, uuid: CardUuid) -> Result<Customer, CustomersServiceError>;

    async fn set_default_card(
        &self,
        customer: CustomerUuid,
        uuid: CardUuid,
    ) -> Result<Customer, CustomersServiceError>;
}

#[cfg(test)]
mod tests {
    use estante::{
        customers::{CustomerError, Gender, RankingTier},
        validation::ValidationError,
    };
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::session::{AuthError, SessionService},
        test::TestContext,
    };

    #[tokio::test]
    async fn admin_filters_customers() -> TestResult {
        let ctx = TestContext::new()?;
        let ana = ctx.fixture.customer("ana")?;
        let joao = ctx.fixture.customer("joao")?;

        let women = ctx
            .profiles
            .list(CustomerQuery {
                gender: Some(Gender::Female),
                ..CustomerQuery::default()
            })
            .await?;

        assert_eq!(women.iter().map(|c| c.uuid).collect::<Vec<_>>(), vec![ana.uuid]);

        let medium = ctx
            .profiles
            .list(CustomerQuery {
                ranking: Some(RankingTier::Medium),
                ..CustomerQuery::default()
            })
            .await?;

        assert_eq!(medium.iter().map(|c| c.uuid).collect::<Vec<_>>(), vec![joao.uuid]);

        let by_email = ctx
            .profiles
            .list(CustomerQuery {
                text: Some("JOAO.SANTOS".to_string()),
                ..CustomerQuery::default()
            })
            .await?;

        assert_eq!(by_email.len(), 1);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn inactivated_customers_cannot_log_in() -> TestResult {
        let ctx = TestContext::new()?;
        let joao = ctx.fixture.customer("joao")?;

        let changed = ctx
            .profiles
            .change_status(joao.uuid, CustomerStatus::Inactive)
            .await?;

        assert_eq!(changed.status, CustomerStatus::Inactive);

        let inactive = ctx
            .profiles
            .list(CustomerQuery {
                status: Some(CustomerStatus::Inactive),
                ..CustomerQuery::default()
            })
            .await?;

        assert_eq!(inactive.len(), 1);

        let login = ctx.session.login("joao.santos@email.com", "Senha@456").await;

        assert!(matches!(login, Err(AuthError::InactiveAccount)), "{login:?}");

        ctx.profiles.change_status(joao.uuid, CustomerStatus::Active).await?;
        ctx.session.login("joao.santos@email.com", "Senha@456").await?;

        Ok(())
    }

    #[tokio::test]
    async fn addresses_can_be_edited_swapped_and_removed() -> TestResult {
        let ctx = TestContext::new()?;
        let ana = ctx.fixture.customer("ana")?;
        let home = ana.addresses.iter().find(|a| a.is_default).ok_or("no default")?;
        let work = ana.addresses.iter().find(|a| !a.is_default).ok_or("no second")?;

        let refused = ctx.profiles.remove_address(ana.uuid, home.uuid).await;

        assert!(matches!(
            refused,
            Err(CustomersServiceError::Profile(CustomerError::DefaultAddress(_)))
        ));

        let mut moved = work.clone();
        moved.zip_code = "123".to_string();

        let invalid = ctx.profiles.update_address(ana.uuid, work.uuid, moved.clone()).await;

        assert!(matches!(
            invalid,
            Err(CustomersServiceError::Validation(ValidationError::InvalidZipCode))
        ));

        moved.zip_code = "04567-000".to_string();

        let updated = ctx.profiles.update_address(ana.uuid, work.uuid, moved).await?;

        assert_eq!(updated.address(work.uuid).map(|a| a.zip_code.as_str()), Some("04567-000"));

        ctx.profiles.set_default_address(ana.uuid, work.uuid).await?;

        let remaining = ctx.profiles.remove_address(ana.uuid, home.uuid).await?;

        assert_eq!(remaining.addresses.len(), 1);
        assert!(remaining.addresses.iter().all(|a| a.is_default));
        assert_eq!(ctx.customers.find_by_id(ana.uuid)?, Some(remaining));

        Ok(())
    }

    #[tokio::test]
    async fn cards_are_validated_and_managed() -> TestResult {
        let ctx = TestContext::new()?;
        let ana = ctx.fixture.customer("ana")?;
        let original = ana.cards.first().ok_or("no card")?.uuid;

        let mut card = NewCard {
            number: "5555 4444 3333 2222".to_string(),
            holder: "ANA SILVA".to_string(),
            security_code: "321".to_string(),
            expiry_month: 1,
            expiry_year: 2020,
        };

        let expired = ctx.profiles.add_card(ana.uuid, card.clone()).await;

        assert!(matches!(
            expired,
            Err(CustomersServiceError::Validation(ValidationError::CardExpired))
        ));

        card.expiry_year = 2030;

        let added = ctx.profiles.add_card(ana.uuid, card).await?;
        let master = added
            .cards
            .iter()
            .find(|c| c.last_four == "2222")
            .map(|c| c.uuid)
            .ok_or("card not saved")?;

        let edited = ctx
            .profiles
            .update_card(ana.uuid, master, "ANA S SILVA".to_string(), (7, 2031))
            .await?;

        assert_eq!(edited.card(master).map(|c| c.holder.as_str()), Some("ANA S SILVA"));

        ctx.profiles.set_default_card(ana.uuid, master).await?;

        let remaining = ctx.profiles.remove_card(ana.uuid, original).await?;

        assert_eq!(remaining.cards.len(), 1);

        let missing = ctx.profiles.remove_card(ana.uuid, original).await;

        assert!(matches!(
            missing,
            Err(CustomersServiceError::Profile(CustomerError::CardNotFound(_)))
        ));

        Ok(())
    }
}
