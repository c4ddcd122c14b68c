//! Shell command grammar.

use clap::{Args, Parser, Subcommand, ValueEnum};
use estante::{
    books::{BookStatus, BookUuid, StatusReason},
    customers::{AddressType, AddressUuid, CardUuid, CustomerStatus, CustomerUuid, Gender, RankingTier},
    inventory::EntryType,
    money,
    orders::{OrderLineUuid, OrderStatus, OrderUuid},
};
use jiff::civil::Date;

#[derive(Debug, Parser)]
#[command(name = "estante", no_binary_name = true, disable_version_flag = true)]
pub(crate) struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Log in as a customer or administrator
    Login { email: String, password: String },

    /// Log out
    Logout,

    /// Show who is logged in
    Whoami,

    /// Create a customer account
    Register(RegisterArgs),

    /// Browse the catalog
    Catalog(CatalogArgs),

    /// Show a single book
    Book { id: BookUuid },

    /// Activate or inactivate a book (administrators)
    BookStatus {
        id: BookUuid,

        #[arg(value_enum)]
        status: BookStatusArg,

        #[arg(value_enum)]
        category: ReasonArg,

        reason: String,
    },

    /// Manage the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Pay for the cart
    #[command(subcommand)]
    Checkout(CheckoutCommand),

    /// Follow and manage orders
    #[command(subcommand)]
    Orders(OrdersCommand),

    /// Record stock entries (administrators)
    #[command(subcommand)]
    Inventory(InventoryCommand),

    /// Manage customer accounts (administrators)
    #[command(subcommand)]
    Customers(CustomersCommand),

    /// Your addresses and cards
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub cpf: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    #[arg(long)]
    pub confirm: String,

    #[arg(long, value_enum)]
    pub gender: GenderArg,

    /// YYYY-MM-DD
    #[arg(long)]
    pub birth_date: Date,

    #[arg(long)]
    pub phone: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum GenderArg {
    M,
    F,
    O,
}

impl From<GenderArg> for Gender {
    fn from(value: GenderArg) -> Self {
        match value {
            GenderArg::M => Gender::Male,
            GenderArg::F => Gender::Female,
            GenderArg::O => Gender::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum BookStatusArg {
    Active,
    Inactive,
}

impl From<BookStatusArg> for BookStatus {
    fn from(value: BookStatusArg) -> Self {
        match value {
            BookStatusArg::Active => BookStatus::Active,
            BookStatusArg::Inactive => BookStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum ReasonArg {
    OutOfMarket,
    Discontinued,
    EditorialProblem,
    LowDemand,
    Restock,
    NewEdition,
    DemandIncreased,
    SystemCorrection,
}

impl From<ReasonArg> for StatusReason {
    fn from(value: ReasonArg) -> Self {
        match value {
            ReasonArg::OutOfMarket => StatusReason::OutOfMarket,
            ReasonArg::Discontinued => StatusReason::Discontinued,
            ReasonArg::EditorialProblem => StatusReason::EditorialProblem,
            ReasonArg::LowDemand => StatusReason::LowDemand,
            ReasonArg::Restock => StatusReason::Restock,
            ReasonArg::NewEdition => StatusReason::NewEdition,
            ReasonArg::DemandIncreased => StatusReason::DemandIncreased,
            ReasonArg::SystemCorrection => StatusReason::SystemCorrection,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct CatalogArgs {
    /// Title, author or ISBN
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long, value_parser = money::parse_price)]
    pub min_price: Option<u64>,

    #[arg(long, value_parser = money::parse_price)]
    pub max_price: Option<u64>,

    /// Include inactive books (administrators)
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CartCommand {
    /// Reserve copies of a book
    Add {
        book: BookUuid,
        #[arg(default_value_t = 1)]
        quantity: u32,
    },

    /// Drop a book from the cart
    Remove { book: BookUuid },

    /// Change a line's quantity; 0 removes it
    Update { book: BookUuid, quantity: u32 },

    /// Show the cart and the reservation countdown
    Show,

    /// Empty the cart
    Clear,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CheckoutCommand {
    /// Deliver to a saved address
    Address { id: AddressUuid },

    /// Deliver to a new address
    NewAddress(NewAddressArgs),

    /// Quote freight for the cart
    Freight,

    /// Allocate part of the total to a payment instrument
    #[command(subcommand)]
    Pay(PayCommand),

    /// Drop a payment allocation
    #[command(subcommand)]
    Unpay(UnpayCommand),

    /// Show the running totals
    Show,

    /// Place the order
    Finalize,

    /// Start over
    Reset,
}

#[derive(Debug, Args)]
pub(crate) struct NewAddressArgs {
    #[arg(long, default_value = "Delivery")]
    pub identifier: String,

    #[arg(long)]
    pub street: String,

    #[arg(long)]
    pub number: String,

    #[arg(long)]
    pub complement: Option<String>,

    #[arg(long)]
    pub neighborhood: String,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub zip: String,

    /// Keep the address on the profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum PayCommand {
    /// Charge a saved card
    Card {
        id: CardUuid,
        #[arg(value_parser = money::parse_price)]
        amount: u64,
    },

    /// Charge a card entered now
    NewCard(NewCardArgs),

    /// Redeem a coupon
    Coupon {
        code: String,
        #[arg(value_parser = money::parse_price)]
        amount: u64,
    },
}

#[derive(Debug, Args)]
pub(crate) struct NewCardArgs {
    #[arg(long)]
    pub number: String,

    #[arg(long)]
    pub holder: String,

    #[arg(long)]
    pub cvv: String,

    /// MM/YY
    #[arg(long)]
    pub expiry: String,

    /// Keep the card on the profile
    #[arg(long)]
    pub save: bool,

    #[arg(value_parser = money::parse_price)]
    pub amount: u64,
}

#[derive(Debug, Subcommand)]
pub(crate) enum UnpayCommand {
    Card { id: CardUuid },
    NewCard,
    Coupon { code: String },
}

#[derive(Debug, Subcommand)]
pub(crate) enum OrdersCommand {
    /// List orders, newest first
    List {
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Show an order's lines
    Show { id: OrderUuid },

    /// Approve the payment (administrators)
    Approve { id: OrderUuid },

    /// Refuse the payment (administrators)
    Reject { id: OrderUuid },

    /// Ship approved orders under one tracking code (administrators)
    Dispatch {
        #[arg(required = true)]
        ids: Vec<OrderUuid>,

        #[arg(long)]
        tracking: String,
    },

    /// Confirm delivery (administrators)
    Deliver { id: OrderUuid },

    /// Exchange flow
    #[command(subcommand)]
    Exchange(ExchangeCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum ExchangeCommand {
    /// Ask to exchange lines of a delivered order
    Request {
        order: OrderUuid,

        #[arg(required = true)]
        lines: Vec<OrderLineUuid>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Authorize a requested exchange (administrators)
    Authorize { id: OrderUuid },

    /// Confirm the items came back (administrators)
    Receive {
        id: OrderUuid,

        /// Do not credit the items back to stock
        #[arg(long)]
        no_restock: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum StatusArg {
    Processing,
    Approved,
    Rejected,
    InTransit,
    Delivered,
    ExchangeRequested,
    ExchangeAuthorized,
    Exchanged,
}

impl From<StatusArg> for OrderStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Processing => OrderStatus::Processing,
            StatusArg::Approved => OrderStatus::Approved,
            StatusArg::Rejected => OrderStatus::Rejected,
            StatusArg::InTransit => OrderStatus::InTransit,
            StatusArg::Delivered => OrderStatus::Delivered,
            StatusArg::ExchangeRequested => OrderStatus::ExchangeRequested,
            StatusArg::ExchangeAuthorized => OrderStatus::ExchangeAuthorized,
            StatusArg::Exchanged => OrderStatus::Exchanged,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum InventoryCommand {
    /// Record incoming stock
    Entry {
        book: BookUuid,
        quantity: u32,

        #[arg(long, value_parser = money::parse_price, default_value = "0")]
        cost: u64,

        #[arg(long, default_value = "")]
        supplier: String,

        #[arg(long, value_enum, default_value_t = KindArg::Purchase)]
        kind: KindArg,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Sale price suggested for a purchase cost
    Suggest {
        book: BookUuid,

        #[arg(value_parser = money::parse_price)]
        cost: u64,
    },

    /// Books running out
    LowStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindArg {
    Purchase,
    Adjustment,
}

impl From<KindArg> for EntryType {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Purchase => EntryType::Purchase,
            KindArg::Adjustment => EntryType::Adjustment,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum CustomersCommand {
    /// List customers by code
    List {
        /// Name, email, CPF or code
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum)]
        status: Option<CustomerStatusArg>,

        #[arg(long, value_enum)]
        gender: Option<GenderArg>,

        #[arg(long, value_enum)]
        ranking: Option<RankingArg>,
    },

    /// Show a customer's addresses and cards
    Show { id: CustomerUuid },

    /// Activate or inactivate an account
    Status {
        id: CustomerUuid,

        #[arg(value_enum)]
        status: CustomerStatusArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum CustomerStatusArg {
    Active,
    Inactive,
}

impl From<CustomerStatusArg> for CustomerStatus {
    fn from(value: CustomerStatusArg) -> Self {
        match value {
            CustomerStatusArg::Active => CustomerStatus::Active,
            CustomerStatusArg::Inactive => CustomerStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum RankingArg {
    Premium,
    Intermediate,
    Basic,
}

impl From<RankingArg> for RankingTier {
    fn from(value: RankingArg) -> Self {
        match value {
            RankingArg::Premium => RankingTier::High,
            RankingArg::Intermediate => RankingTier::Medium,
            RankingArg::Basic => RankingTier::Low,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum ProfileCommand {
    /// Show your addresses and cards
    Show,

    #[command(subcommand)]
    Address(AddressCommand),

    #[command(subcommand)]
    Card(CardCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum AddressCommand {
    /// Add an address; the first one becomes the default
    Add(AddressArgs),

    /// Replace an address's details
    Update {
        id: AddressUuid,

        #[command(flatten)]
        address: AddressArgs,
    },

    /// Drop an address other than the default
    Remove { id: AddressUuid },

    /// Make an address the default
    Default { id: AddressUuid },
}

#[derive(Debug, Args)]
pub(crate) struct AddressArgs {
    #[arg(long)]
    pub identifier: String,

    #[arg(long, value_enum, default_value_t = KindOfAddress::Both)]
    pub kind: KindOfAddress,

    #[arg(long, default_value = "")]
    pub residence_type: String,

    #[arg(long)]
    pub street: String,

    #[arg(long)]
    pub number: String,

    #[arg(long)]
    pub complement: Option<String>,

    #[arg(long)]
    pub neighborhood: String,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub zip: String,

    #[arg(long)]
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindOfAddress {
    Delivery,
    Billing,
    Both,
}

impl From<KindOfAddress> for AddressType {
    fn from(value: KindOfAddress) -> Self {
        match value {
            KindOfAddress::Delivery => AddressType::Delivery,
            KindOfAddress::Billing => AddressType::Billing,
            KindOfAddress::Both => AddressType::Both,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum CardCommand {
    /// Keep a card on file
    Add {
        #[arg(long)]
        number: String,

        #[arg(long)]
        holder: String,

        #[arg(long)]
        cvv: String,

        /// MM/YY
        #[arg(long)]
        expiry: String,
    },

    /// Change a card's holder and expiry
    Update {
        id: CardUuid,

        #[arg(long)]
        holder: String,

        /// MM/YY
        #[arg(long)]
        expiry: String,
    },

    /// Drop a card other than the default
    Remove { id: CardUuid },

    /// Make a card the default
    Default { id: CardUuid },
}

/// Split a command line into words. Double quotes group words.
pub(crate) fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut started = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut word));
                    started = false;
                }
            }
            c => {
                word.push(c);
                started = true;
            }
        }
    }

    if started {
        words.push(word);
    }

    words
}
