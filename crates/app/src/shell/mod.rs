//! Interactive storefront shell
//!
//! Reads one command per line, dispatches it to the app services and prints
//! the result. While a cart exists its countdown runs in the background and
//! the shell announces when the reservation is about to lapse or has lapsed.

use std::io;

use clap::Parser;
use estante::{
    cart::{EXPIRY_WARNING, TickOutcome},
    catalog::CatalogQuery,
    checkout::{NewCard, payments::InstrumentId},
    customers::{Address, AddressType, AddressUuid, CustomerQuery, CustomerUuid, User},
    fixtures::customers::parse_expiry,
    inventory::NewStockEntry,
    money,
    orders::OrderQuery,
};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::{
    context::AppContext,
    domain::{
        carts::CartsServiceError,
        catalog::CatalogServiceError,
        checkout::{
            CheckoutServiceError,
            models::{AddressChoice, PaymentChoice},
        },
        customers::CustomersServiceError,
        inventory::InventoryServiceError,
        orders::OrdersServiceError,
        session::{AuthError, models::Registration},
    },
    render::{self, RenderError},
};

mod commands;

use commands::{
    AddressArgs, AddressCommand, CardCommand, CartCommand, CatalogArgs, CheckoutCommand, Command,
    CustomersCommand, ExchangeCommand, InventoryCommand, Line, NewAddressArgs, NewCardArgs,
    OrdersCommand, PayCommand, ProfileCommand, RegisterArgs, UnpayCommand,
};

const PROMPT: &str = "estante> ";

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("log in to continue")]
    NotLoggedIn,

    #[error("administrators only")]
    Forbidden,

    #[error("customers only")]
    CustomersOnly,

    #[error("invalid card expiry {0}")]
    InvalidExpiry(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),

    #[error(transparent)]
    Carts(#[from] CartsServiceError),

    #[error(transparent)]
    Checkout(#[from] CheckoutServiceError),

    #[error(transparent)]
    Orders(#[from] OrdersServiceError),

    #[error(transparent)]
    Inventory(#[from] InventoryServiceError),

    #[error(transparent)]
    Customers(#[from] CustomersServiceError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to read input")]
    Input(#[source] io::Error),
}

impl ShellError {
    /// Output and input failures end the session; everything else is
    /// reported and the shell carries on.
    fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Render(_) | ShellError::Input(_))
    }
}

impl From<io::Error> for ShellError {
    fn from(error: io::Error) -> Self {
        ShellError::Render(RenderError::Io(error))
    }
}

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'a> {
    ctx: &'a AppContext,
}

impl<'a> Shell<'a> {
    #[must_use]
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Run commands from `input` until it ends or the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error when reading `input` or writing `out` fails.
    pub async fn run<R, W>(&self, input: R, mut out: W) -> Result<(), ShellError>
    where
        R: AsyncBufRead + Unpin,
        W: io::Write,
    {
        let restored = self.ctx.carts.restore().await;

        if !restored.is_empty() {
            writeln!(out, "Cart restored.")?;
            render::write_cart(&mut out, &restored)?;
        }

        let mut outcomes = self.ctx.carts.countdown().await;
        let mut lines = input.lines();
        let mut warned = false;
        let mut ticking = true;

        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let line = loop {
                tokio::select! {
                    line = lines.next_line() => break line,
                    changed = outcomes.changed(), if ticking => {
                        if changed.is_err() {
                            ticking = false;
                            continue;
                        }

                        let outcome = *outcomes.borrow_and_update();

                        announce(&mut out, outcome, &mut warned)?;
                    }
                }
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(()),
                Err(error) => return Err(ShellError::Input(error)),
            };

            match self.execute(&line, &mut out).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => writeln!(out, "error: {error}")?,
            }
        }
    }

    /// Parse and run a single command line.
    ///
    /// # Errors
    ///
    /// Returns the failing service's error, or a permission error when the
    /// logged-in user may not run the command.
    pub async fn execute(&self, line: &str, out: &mut impl io::Write) -> Result<Flow, ShellError> {
        let words = commands::split_line(line);

        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        let name = words.first().cloned().unwrap_or_default();

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(error) => {
                write!(out, "{}", error.render())?;

                return Ok(Flow::Continue);
            }
        };

        debug!(command = %name, "shell command");

        match command {
            Command::Login { email, password } => {
                let user = self.ctx.session.login(&email, &password).await?;

                writeln!(out, "Welcome, {}.", greeting(&user))?;
            }
            Command::Logout => {
                self.ctx.session.logout().await?;
                self.ctx.checkout.reset().await;

                writeln!(out, "Logged out.")?;
            }
            Command::Whoami => match self.ctx.session.current_user().await? {
                Some(user) => writeln!(out, "{} ({})", greeting(&user), user.email())?,
                None => writeln!(out, "Nobody is logged in.")?,
            },
            Command::Register(args) => self.register(args, out).await?,
            Command::Catalog(args) => self.catalog(args, out).await?,
            Command::Book { id } => {
                let book = self.ctx.catalog.get_book(id).await?;

                render::write_books(out, std::slice::from_ref(&book))?;

                if !book.synopsis.is_empty() {
                    writeln!(out, "{}", book.synopsis)?;
                }
            }
            Command::BookStatus {
                id,
                status,
                category,
                reason,
            } => {
                self.admin().await?;

                let book = self
                    .ctx
                    .catalog
                    .change_status(id, status.into(), category.into(), reason)
                    .await?;

                writeln!(out, "{}: {}", book.title, book.status)?;
            }
            Command::Cart(command) => self.cart(command, out).await?,
            Command::Checkout(command) => self.checkout(command, out).await?,
            Command::Orders(command) => self.orders(command, out).await?,
            Command::Inventory(command) => self.inventory(command, out).await?,
            Command::Customers(command) => self.customers(command, out).await?,
            Command::Profile(command) => self.profile(command, out).await?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    async fn customer(&self) -> Result<CustomerUuid, ShellError> {
        match self.ctx.session.current_user().await? {
            Some(user) => user.customer_id().ok_or(ShellError::CustomersOnly),
            None => Err(ShellError::NotLoggedIn),
        }
    }

    async fn admin(&self) -> Result<(), ShellError> {
        match self.ctx.session.current_user().await? {
            Some(user) if user.is_admin() => Ok(()),
            Some(_) => Err(ShellError::Forbidden),
            None => Err(ShellError::NotLoggedIn),
        }
    }

    async fn register(&self, args: RegisterArgs, out: &mut impl io::Write) -> Result<(), ShellError> {
        let user = self
            .ctx
            .session
            .register(Registration {
                name: args.name,
                cpf: args.cpf,
                email: args.email,
                password: args.password,
                password_confirmation: args.confirm,
                gender: args.gender.into(),
                birth_date: args.birth_date,
                phone: args.phone,
                address: None,
            })
            .await?;

        writeln!(out, "Account created. Welcome, {}.", greeting(&user))?;

        Ok(())
    }

    async fn catalog(&self, args: CatalogArgs, out: &mut impl io::Write) -> Result<(), ShellError> {
        if args.all {
            self.admin().await?;
        }

        let storefront = CatalogQuery::storefront();
        let query = CatalogQuery {
            text: args.search,
            category: args.category,
            author: args.author,
            min_price: args.min_price,
            max_price: args.max_price,
            status: if args.all { None } else { storefront.status },
            ..storefront
        };

        let books = self.ctx.catalog.list_books(query).await?;

        render::write_books(out, &books)?;

        Ok(())
    }

    async fn cart(&self, command: CartCommand, out: &mut impl io::Write) -> Result<(), ShellError> {
        let view = match command {
            CartCommand::Add { book, quantity } => self.ctx.carts.add(book, quantity).await?,
            CartCommand::Remove { book } => self.ctx.carts.remove(book).await?,
            CartCommand::Update { book, quantity } => self.ctx.carts.update(book, quantity).await?,
            CartCommand::Show => self.ctx.carts.view().await,
            CartCommand::Clear => {
                self.ctx.carts.clear().await;
                self.ctx.carts.view().await
            }
        };

        render::write_cart(out, &view)?;

        Ok(())
    }

    async fn checkout(
        &self,
        command: CheckoutCommand,
        out: &mut impl io::Write,
    ) -> Result<(), ShellError> {
        let checkout = &self.ctx.checkout;

        let summary = match command {
            CheckoutCommand::Address { id } => {
                let customer = self.customer().await?;

                checkout
                    .select_address(customer, AddressChoice::Saved(id))
                    .await?;
                checkout.summary().await
            }
            CheckoutCommand::NewAddress(args) => {
                let customer = self.customer().await?;
                let save = args.save;

                checkout
                    .select_address(
                        customer,
                        AddressChoice::New {
                            address: new_address(args),
                            save,
                        },
                    )
                    .await?;
                checkout.summary().await
            }
            CheckoutCommand::Freight => {
                self.customer().await?;
                checkout.quote_freight().await?;
                checkout.summary().await
            }
            CheckoutCommand::Pay(command) => {
                let customer = self.customer().await?;
                let (choice, amount) = payment_choice(command)?;

                checkout.add_payment(customer, choice, amount).await?
            }
            CheckoutCommand::Unpay(command) => {
                let id = match command {
                    UnpayCommand::Card { id } => InstrumentId::SavedCard(id),
                    UnpayCommand::NewCard => InstrumentId::NewCard,
                    UnpayCommand::Coupon { code } => InstrumentId::Coupon(code.trim().to_uppercase()),
                };

                checkout.remove_payment(id).await?
            }
            CheckoutCommand::Show => checkout.summary().await,
            CheckoutCommand::Finalize => {
                let customer = self.customer().await?;
                let order = checkout.finalize(customer).await?;

                writeln!(
                    out,
                    "Order {} placed, total {}.",
                    order.uuid,
                    money::format(order.total)
                )?;

                return Ok(());
            }
            CheckoutCommand::Reset => {
                checkout.reset().await;
                checkout.summary().await
            }
        };

        render::write_checkout(out, &summary)?;

        Ok(())
    }

    async fn orders(&self, command: OrdersCommand, out: &mut impl io::Write) -> Result<(), ShellError> {
        let orders = &self.ctx.orders;

        let changed = match command {
            OrdersCommand::List { search, status } => {
                let user = self
                    .ctx
                    .session
                    .current_user()
                    .await?
                    .ok_or(ShellError::NotLoggedIn)?;

                let listed = orders
                    .list(OrderQuery {
                        text: search,
                        status: status.map(Into::into),
                        customer: user.customer_id(),
                    })
                    .await?;

                render::write_orders(out, &listed)?;

                return Ok(());
            }
            OrdersCommand::Show { id } => {
                let user = self
                    .ctx
                    .session
                    .current_user()
                    .await?
                    .ok_or(ShellError::NotLoggedIn)?;
                let order = orders.get(id).await?;

                if let Some(customer) = user.customer_id()
                    && order.customer != customer
                {
                    return Err(OrdersServiceError::NotOwner(id).into());
                }

                render::write_order(out, &order)?;

                return Ok(());
            }
            OrdersCommand::Approve { id } => {
                self.admin().await?;
                vec![orders.approve(id).await?]
            }
            OrdersCommand::Reject { id } => {
                self.admin().await?;
                vec![orders.reject(id).await?]
            }
            OrdersCommand::Dispatch { ids, tracking } => {
                self.admin().await?;
                orders.dispatch(ids, tracking).await?
            }
            OrdersCommand::Deliver { id } => {
                self.admin().await?;
                vec![orders.mark_delivered(id).await?]
            }
            OrdersCommand::Exchange(ExchangeCommand::Request { order, lines, reason }) => {
                let customer = self.customer().await?;

                vec![orders.request_exchange(customer, order, lines, reason).await?]
            }
            OrdersCommand::Exchange(ExchangeCommand::Authorize { id }) => {
                self.admin().await?;
                vec![orders.authorize_exchange(id).await?]
            }
            OrdersCommand::Exchange(ExchangeCommand::Receive { id, no_restock }) => {
                self.admin().await?;
                vec![orders.confirm_exchange_received(id, !no_restock).await?]
            }
        };

        for order in &changed {
            writeln!(out, "Order {}: {}", order.uuid, order.status)?;
        }

        Ok(())
    }

    async fn inventory(
        &self,
        command: InventoryCommand,
        out: &mut impl io::Write,
    ) -> Result<(), ShellError> {
        self.admin().await?;

        let inventory = &self.ctx.inventory;

        match command {
            InventoryCommand::Entry {
                book,
                quantity,
                cost,
                supplier,
                kind,
                notes,
            } => {
                let entry = inventory
                    .record_entry(NewStockEntry {
                        book_id: book,
                        quantity,
                        cost_price: cost,
                        supplier,
                        kind: kind.into(),
                        notes,
                    })
                    .await?;

                render::write_entry(out, &entry)?;
            }
            InventoryCommand::Suggest { book, cost } => {
                let price = inventory.suggested_price(book, cost).await?;

                writeln!(out, "Suggested price: {}", money::format(price))?;
            }
            InventoryCommand::LowStock => {
                render::write_low_stock(out, &inventory.low_stock().await?)?;
            }
        }

        Ok(())
    }

    async fn customers(
        &self,
        command: CustomersCommand,
        out: &mut impl io::Write,
    ) -> Result<(), ShellError> {
        self.admin().await?;

        let customers = &self.ctx.customers;

        match command {
            CustomersCommand::List {
                search,
                status,
                gender,
                ranking,
            } => {
                let listed = customers
                    .list(CustomerQuery {
                        text: search,
                        status: status.map(Into::into),
                        gender: gender.map(Into::into),
                        ranking: ranking.map(Into::into),
                    })
                    .await?;

                render::write_customers(out, &listed)?;
            }
            CustomersCommand::Show { id } => {
                render::write_profile(out, &customers.get(id).await?)?;
            }
            CustomersCommand::Status { id, status } => {
                let customer = customers.change_status(id, status.into()).await?;

                writeln!(out, "{} {}: {}", customer.code, customer.name, customer.status)?;
            }
        }

        Ok(())
    }

    async fn profile(&self, command: ProfileCommand, out: &mut impl io::Write) -> Result<(), ShellError> {
        let me = self.customer().await?;
        let customers = &self.ctx.customers;

        let customer = match command {
            ProfileCommand::Show => customers.get(me).await?,
            ProfileCommand::Address(AddressCommand::Add(args)) => {
                customers.add_address(me, profile_address(args)).await?
            }
            ProfileCommand::Address(AddressCommand::Update { id, address }) => {
                customers.update_address(me, id, profile_address(address)).await?
            }
            ProfileCommand::Address(AddressCommand::Remove { id }) => {
                customers.remove_address(me, id).await?
            }
            ProfileCommand::Address(AddressCommand::Default { id }) => {
                customers.set_default_address(me, id).await?
            }
            ProfileCommand::Card(CardCommand::Add {
                number,
                holder,
                cvv,
                expiry,
            }) => {
                let (expiry_month, expiry_year) = expiry_of(&expiry)?;

                customers
                    .add_card(
                        me,
                        NewCard {
                            number,
                            holder,
                            security_code: cvv,
                            expiry_month,
                            expiry_year,
                        },
                    )
                    .await?
            }
            ProfileCommand::Card(CardCommand::Update { id, holder, expiry }) => {
                customers.update_card(me, id, holder, expiry_of(&expiry)?).await?
            }
            ProfileCommand::Card(CardCommand::Remove { id }) => customers.remove_card(me, id).await?,
            ProfileCommand::Card(CardCommand::Default { id }) => {
                customers.set_default_card(me, id).await?
            }
        };

        render::write_profile(out, &customer)?;

        Ok(())
    }
}

fn greeting(user: &User) -> &str {
    match user {
        User::Admin { .. } => "administrator",
        User::Customer { customer } => &customer.name,
    }
}

fn new_address(args: NewAddressArgs) -> Address {
    Address {
        uuid: AddressUuid::new(),
        identifier: args.identifier,
        kind: AddressType::Delivery,
        residence_type: String::new(),
        street: args.street,
        number: args.number,
        complement: args.complement,
        neighborhood: args.neighborhood,
        city: args.city,
        state: args.state,
        country: "Brasil".to_string(),
        zip_code: args.zip,
        observations: None,
        is_default: false,
    }
}

fn profile_address(args: AddressArgs) -> Address {
    Address {
        uuid: AddressUuid::new(),
        identifier: args.identifier,
        kind: args.kind.into(),
        residence_type: args.residence_type,
        street: args.street,
        number: args.number,
        complement: args.complement,
        neighborhood: args.neighborhood,
        city: args.city,
        state: args.state,
        country: "Brasil".to_string(),
        zip_code: args.zip,
        observations: args.observations,
        is_default: false,
    }
}

fn expiry_of(expiry: &str) -> Result<(i8, i16), ShellError> {
    parse_expiry(expiry).map_err(|_err| ShellError::InvalidExpiry(expiry.to_string()))
}

fn payment_choice(command: PayCommand) -> Result<(PaymentChoice, u64), ShellError> {
    match command {
        PayCommand::Card { id, amount } => Ok((PaymentChoice::SavedCard(id), amount)),
        PayCommand::Coupon { code, amount } => Ok((PaymentChoice::Coupon(code), amount)),
        PayCommand::NewCard(NewCardArgs {
            number,
            holder,
            cvv,
            expiry,
            save,
            amount,
        }) => {
            let (expiry_month, expiry_year) = expiry_of(&expiry)?;

            Ok((
                PaymentChoice::NewCard {
                    card: NewCard {
                        number,
                        holder,
                        security_code: cvv,
                        expiry_month,
                        expiry_year,
                    },
                    save,
                },
                amount,
            ))
        }
    }
}

/// Print countdown notices. Warns once per reservation when it enters the
/// final minutes.
fn announce(out: &mut impl io::Write, outcome: TickOutcome, warned: &mut bool) -> io::Result<()> {
    let warning_seconds = EXPIRY_WARNING.as_secs().unsigned_abs();

    match outcome {
        TickOutcome::Active { remaining_seconds } if remaining_seconds <= warning_seconds => {
            if !*warned {
                *warned = true;
                writeln!(
                    out,
                    "\nHurry: your reservation expires in {remaining_seconds} seconds."
                )?;
            }
        }
        TickOutcome::Active { .. } | TickOutcome::Idle => *warned = false,
        TickOutcome::Expired => {
            *warned = false;
            writeln!(out, "\nYour reservation expired and the cart was emptied.")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::SignedDuration;
    use testresult::TestResult;

    use super::*;
    use crate::test::app_context;

    async fn exec(shell: &Shell<'_>, line: &str) -> Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();

        match shell.execute(line, &mut out).await {
            Ok(_) => {}
            Err(error) if !error.is_fatal() => {
                use std::io::Write as _;
                writeln!(out, "error: {error}")?;
            }
            Err(error) => return Err(error.into()),
        }

        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn customer_buys_a_book() -> TestResult {
        let (ctx, fixture, _clock) = app_context()?;
        let shell = Shell::new(&ctx);
        let ana = fixture.customer("ana")?;
        let dom = fixture.book("dom-casmurro")?.uuid;
        let address = ana.default_delivery_address().ok_or("no address")?.uuid;
        let card = ana.cards.iter().find(|c| c.is_default).ok_or("no card")?.uuid;

        let denied = exec(&shell, &format!("checkout address {address}")).await?;

        assert!(denied.contains("log in to continue"), "{denied}");

        let welcome = exec(&shell, "login ana.silva@email.com Senha@123").await?;

        assert!(welcome.contains(&ana.name), "{welcome}");

        exec(&shell, &format!("cart add {dom} 2")).await?;
        exec(&shell, &format!("checkout address {address}")).await?;

        let quoted = exec(&shell, "checkout freight").await?;

        assert!(quoted.contains("Freight:"), "{quoted}");

        let due = ctx.checkout.summary().await.due;
        let paid = exec(
            &shell,
            &format!("checkout pay card {card} {}.{:02}", due / 100, due % 100),
        )
        .await?;

        assert!(paid.contains("Remaining"), "{paid}");
        assert_eq!(ctx.checkout.summary().await.remaining, 0);

        let placed = exec(&shell, "checkout finalize").await?;

        assert!(placed.contains("placed"), "{placed}");
        assert!(ctx.carts.view().await.is_empty());

        let listed = exec(&shell, "orders list --status processing").await?;

        assert!(listed.contains(&ana.name), "{listed}");

        Ok(())
    }

    #[tokio::test]
    async fn admin_commands_are_guarded() -> TestResult {
        let (ctx, fixture, _clock) = app_context()?;
        let shell = Shell::new(&ctx);
        let order = fixture.orders().first().ok_or("no order")?.uuid;

        exec(&shell, "login ana.silva@email.com Senha@123").await?;

        let denied = exec(&shell, &format!("orders approve {order}")).await?;

        assert!(denied.contains("administrators only"), "{denied}");

        let low = exec(&shell, "inventory low-stock").await?;

        assert!(low.contains("administrators only"), "{low}");

        exec(&shell, "logout").await?;
        exec(&shell, "login admin@bookstore.com admin123").await?;

        let dom = fixture.book("dom-casmurro")?.uuid;
        let withdrawn = exec(
            &shell,
            &format!(r#"book-status {dom} inactive low-demand "sem procura""#),
        )
        .await?;

        assert!(withdrawn.contains("Dom Casmurro: inactive"), "{withdrawn}");
        assert!(!exec(&shell, "catalog").await?.contains("Dom Casmurro"));

        let low = exec(&shell, "inventory low-stock").await?;

        assert!(!low.contains("error"), "{low}");

        let buying = exec(&shell, "checkout freight").await?;

        assert!(buying.contains("customers only"), "{buying}");

        Ok(())
    }

    #[tokio::test]
    async fn parse_errors_keep_the_session_open() -> TestResult {
        let (ctx, _fixture, _clock) = app_context()?;
        let shell = Shell::new(&ctx);
        let mut out = Vec::new();

        assert_eq!(shell.execute("cart add nonsense", &mut out).await?, Flow::Continue);
        assert!(!out.is_empty());
        assert_eq!(shell.execute("", &mut out).await?, Flow::Continue);
        assert_eq!(shell.execute("quit", &mut out).await?, Flow::Quit);

        Ok(())
    }

    #[tokio::test]
    async fn run_reads_until_quit() -> TestResult {
        let (ctx, _fixture, _clock) = app_context()?;
        let shell = Shell::new(&ctx);
        let mut out = Vec::new();

        shell
            .run(&b"catalog\nquit\ncatalog --all\n"[..], &mut out)
            .await?;

        let text = String::from_utf8(out)?;

        assert!(text.contains("Dom Casmurro"), "{text}");
        assert_eq!(text.matches(PROMPT).count(), 2, "{text}");

        Ok(())
    }

    #[tokio::test]
    async fn restored_cart_is_shown_on_start() -> TestResult {
        let (ctx, fixture, _clock) = app_context()?;
        let dom = fixture.book("dom-casmurro")?.uuid;

        ctx.carts.add(dom, 1).await?;

        let mut out = Vec::new();

        Shell::new(&ctx).run(&b""[..], &mut out).await?;

        let text = String::from_utf8(out)?;

        assert!(text.contains("Cart restored"), "{text}");

        Ok(())
    }

    #[test]
    fn announces_warning_once_and_expiry() -> TestResult {
        let mut out = Vec::new();
        let mut warned = false;

        announce(&mut out, TickOutcome::Active { remaining_seconds: 600 }, &mut warned)?;
        announce(&mut out, TickOutcome::Active { remaining_seconds: 300 }, &mut warned)?;
        announce(&mut out, TickOutcome::Active { remaining_seconds: 299 }, &mut warned)?;
        announce(&mut out, TickOutcome::Expired, &mut warned)?;

        let text = String::from_utf8(out)?;

        assert_eq!(text.matches("expires in").count(), 1, "{text}");
        assert!(text.contains("300 seconds"), "{text}");
        assert!(text.contains("expired"), "{text}");

        Ok(())
    }

    #[tokio::test]
    async fn expiry_is_announced_during_the_session() -> TestResult {
        let (ctx, fixture, clock) = app_context()?;
        let dom = fixture.book("dom-casmurro")?.uuid;

        ctx.carts.add(dom, 1).await?;

        let (mut writer, reader) = tokio::io::duplex(64);
        let input = tokio::io::BufReader::new(reader);

        let session = tokio::spawn({
            let ctx = ctx.clone();

            async move {
                let mut out = Vec::new();
                let result = Shell::new(&ctx).run(input, &mut out).await;

                result.map(|()| out)
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        clock.advance(SignedDuration::from_mins(16));
        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::io::AsyncWriteExt::write_all(&mut writer, b"quit\n").await?;

        let text = String::from_utf8(session.await??)?;

        assert!(text.contains("expired"), "{text}");

        Ok(())
    }

    #[tokio::test]
    async fn admin_inactivates_a_customer() -> TestResult {
        let (ctx, fixture, _clock) = app_context()?;
        let shell = Shell::new(&ctx);
        let joao = fixture.customer("joao")?;

        exec(&shell, "login ana.silva@email.com Senha@123").await?;

        let denied = exec(&shell, "customers list").await?;

        assert!(denied.contains("administrators only"), "{denied}");

        exec(&shell, "logout").await?;
        exec(&shell, "login admin@bookstore.com admin123").await?;

        let listed = exec(&shell, "customers list --ranking intermediate").await?;

        assert!(listed.contains(&joao.name), "{listed}");
        assert!(!listed.contains("Ana Silva"), "{listed}");

        let changed = exec(&shell, &format!("customers status {} inactive", joao.uuid)).await?;

        assert!(changed.contains("CLI002"), "{changed}");
        assert!(changed.contains("inactive"), "{changed}");

        exec(&shell, "logout").await?;

        let refused = exec(&shell, "login joao.santos@email.com Senha@456").await?;

        assert!(refused.contains("inactive"), "{refused}");

        Ok(())
    }

    #[tokio::test]
    async fn customer_maintains_their_profile() -> TestResult {
        let (ctx, fixture, _clock) = app_context()?;
        let shell = Shell::new(&ctx);
        let ana = fixture.customer("ana")?;
        let home = ana.addresses.iter().find(|a| a.is_default).ok_or("no default")?.uuid;
        let work = ana.addresses.iter().find(|a| !a.is_default).ok_or("no second")?.uuid;

        exec(&shell, "login ana.silva@email.com Senha@123").await?;

        let added = exec(
            &shell,
            r#"profile card add --number "5555 4444 3333 2222" --holder "ANA SILVA" --cvv 321 --expiry 08/29"#,
        )
        .await?;

        assert!(added.contains("**** **** **** 2222"), "{added}");

        let refused = exec(&shell, &format!("profile address remove {home}")).await?;

        assert!(refused.contains("is the default"), "{refused}");

        exec(&shell, &format!("profile address default {work}")).await?;

        let removed = exec(&shell, &format!("profile address remove {home}")).await?;

        assert!(!removed.contains(&home.to_string()), "{removed}");

        let saved = ctx.customers.get(ana.uuid).await?;

        assert_eq!(saved.cards.len(), 2);
        assert_eq!(saved.addresses.len(), 1);

        Ok(())
    }
}

