//! Session service.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use estante::{
    customers::{AdminAccount, Customer, CustomerStatus, CustomerUuid, User, customer_code},
    storage::SESSION_KEY,
    validation::{self, ValidationError},
};
use jiff::{civil::Date, tz::TimeZone};
use mockall::automock;
use sha2::{Digest, Sha256};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::domain::{
    Customers, SharedClock, SharedStore,
    session::{errors::AuthError, models::Registration},
};

/// Hex SHA-256 of a password, as kept on customer and admin records.
#[must_use]
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn cpf_digits(cpf: &str) -> String {
    cpf.chars().filter(char::is_ascii_digit).collect()
}

/// Simulated latencies for the account flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delays {
    pub login: Duration,
    pub register: Duration,
}

#[derive(Clone)]
pub struct InMemorySessionService {
    customers: Customers,
    admins: Arc<[AdminAccount]>,
    store: SharedStore,
    clock: SharedClock,
    delays: Delays,
}

impl InMemorySessionService {
    #[must_use]
    pub fn new(
        customers: Customers,
        admins: impl Into<Arc<[AdminAccount]>>,
        store: SharedStore,
        clock: SharedClock,
        delays: Delays,
    ) -> Self {
        Self {
            customers,
            admins: admins.into(),
            store,
            clock,
            delays,
        }
    }

    fn today(&self) -> Date {
        self.clock.now().to_zoned(TimeZone::UTC).date()
    }

    fn persist(&self, user: &User) -> Result<(), AuthError> {
        let json = serde_json::to_string(user).map_err(AuthError::Encode)?;

        self.store.set(SESSION_KEY, &json)?;

        Ok(())
    }

    fn validate(&self, registration: &Registration) -> Result<(), ValidationError> {
        validation::name(&registration.name)?;
        validation::cpf(&registration.cpf)?;
        validation::email(&registration.email)?;
        validation::password(&registration.password)?;

        if registration.password != registration.password_confirmation {
            return Err(ValidationError::PasswordMismatch);
        }

        validation::phone(&registration.phone)?;
        validation::adult_enough(registration.birth_date, self.today())?;

        if let Some(address) = &registration.address {
            validation::required("street", &address.street)?;
            validation::required("number", &address.number)?;
            validation::required("city", &address.city)?;
            validation::zip_code(&address.zip_code)?;
        }

        Ok(())
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    #[tracing::instrument(name = "session.service.login", skip(self, password), err)]
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        sleep(self.delays.login).await;

        let digest = password_digest(password);

        if let Some(admin) = self.admins.iter().find(|a| same_email(&a.email, email)) {
            if admin.password_digest != digest {
                return Err(AuthError::InvalidCredentials);
            }

            let user = User::Admin {
                email: admin.email.clone(),
            };

            self.persist(&user)?;

            info!(email = %admin.email, "administrator logged in");

            return Ok(user);
        }

        let customer = self
            .customers
            .list()?
            .into_iter()
            .find(|c| same_email(&c.email, email))
            .filter(|c| c.password_digest == digest)
            .ok_or(AuthError::InvalidCredentials)?;

        if !customer.is_active() {
            return Err(AuthError::InactiveAccount);
        }

        info!(customer = %customer.uuid, code = %customer.code, "customer logged in");

        let user = User::Customer {
            customer: Box::new(customer),
        };

        self.persist(&user)?;

        Ok(user)
    }

    #[tracing::instrument(name = "session.service.register", skip_all, fields(email = %registration.email), err)]
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        sleep(self.delays.register).await;

        self.validate(&registration)?;

        let existing = self.customers.list()?;

        if existing.iter().any(|c| same_email(&c.email, &registration.email))
            || self.admins.iter().any(|a| same_email(&a.email, &registration.email))
        {
            return Err(AuthError::EmailTaken);
        }

        let cpf = cpf_digits(&registration.cpf);

        if existing.iter().any(|c| cpf_digits(&c.cpf) == cpf) {
            return Err(AuthError::CpfTaken);
        }

        let mut customer = Customer {
            uuid: CustomerUuid::new(),
            code: customer_code(existing.len() + 1),
            name: registration.name.trim().to_string(),
            cpf: registration.cpf.trim().to_string(),
            email: registration.email.trim().to_lowercase(),
            password_digest: password_digest(&registration.password),
            gender: registration.gender,
            birth_date: registration.birth_date,
            phone: registration.phone.trim().to_string(),
            ranking: 1,
            addresses: Vec::new(),
            cards: Vec::new(),
            status: CustomerStatus::Active,
        };

        if let Some(address) = registration.address {
            customer.add_address(address);
        }

        self.customers.save(customer.clone())?;

        info!(customer = %customer.uuid, code = %customer.code, "registered customer");

        let user = User::Customer {
            customer: Box::new(customer),
        };

        self.persist(&user)?;

        Ok(user)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.store.remove(SESSION_KEY)?;

        info!("logged out");

        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };

        let user = match serde_json::from_str::<User>(&raw) {
            Ok(user) => user,
            Err(error) => {
                warn!(%error, "discarding corrupt session record");
                self.store.remove(SESSION_KEY)?;

                return Ok(None);
            }
        };

        // Profile edits made at checkout land in the directory, not the record.
        match user {
            User::Customer { customer } => Ok(Some(User::Customer {
                customer: Box::new(self.customers.find_by_id(customer.uuid)?.unwrap_or(*customer)),
            })),
            admin @ User::Admin { .. } => Ok(Some(admin)),
        }
    }
}

#[automock]
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Log in as an administrator or a customer.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Create a customer account and log it in.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Forget the logged-in user.
    async fn logout(&self) -> Result<(), AuthError>;

    /// The logged-in user, if any.
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}
