//! Terminal tables for the shell and the catalog command.

use std::{io, ops::Range, time::Duration};

use estante::{
    books::Book,
    customers::{Customer, RankingTier},
    inventory::StockEntry,
    money,
    orders::Order,
};
use humanize_duration::{Truncate, prelude::DurationExt};
use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::domain::{carts::models::CartView, checkout::models::CheckoutSummary};

/// Errors raised while writing output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write output")]
    Io(#[from] io::Error),
}

fn finish(mut table: Table, money_columns: Columns<Range<usize>>) -> String {
    table.with(Style::modern_rounded());
    table.modify(money_columns, Alignment::right());
    table.modify(Rows::first(), Alignment::center());

    table.to_string()
}

/// Catalog listing.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_books(out: &mut impl io::Write, books: &[Book]) -> Result<(), RenderError> {
    if books.is_empty() {
        writeln!(out, "No books found.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Title", "Author", "Categories", "Price", "Stock", "Status"]);

    for book in books {
        builder.push_record([
            book.uuid.to_string(),
            book.title.clone(),
            book.author.clone(),
            book.categories.join(", "),
            money::format(book.price),
            book.stock.to_string(),
            book.status.to_string(),
        ]);
    }

    writeln!(out, "{}", finish(builder.build(), Columns::new(4..6)))?;

    Ok(())
}

/// Cart contents with the reservation countdown.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_cart(out: &mut impl io::Write, view: &CartView) -> Result<(), RenderError> {
    let Some(cart) = &view.cart else {
        writeln!(out, "Cart is empty.")?;

        return Ok(());
    };

    let mut builder = Builder::default();

    builder.push_record(["ID", "Title", "Qty", "Price", "Total"]);

    for item in &cart.items {
        builder.push_record([
            item.book_id.to_string(),
            item.book.title.clone(),
            item.quantity.to_string(),
            money::format(item.price),
            money::format(money::line_total(item.price, item.quantity)),
        ]);
    }

    writeln!(out, "{}", finish(builder.build(), Columns::new(2..5)))?;
    writeln!(
        out,
        "{} items, total {}",
        view.items_count,
        money::format(view.total)
    )?;

    let remaining = Duration::from_secs(view.remaining_seconds).human(Truncate::Second);

    if view.expiring_soon {
        writeln!(out, "Hurry: the reservation expires in {remaining}.")?;
    } else {
        writeln!(out, "Reservation valid for {remaining}.")?;
    }

    Ok(())
}

/// Order history, one row per order.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_orders(out: &mut impl io::Write, orders: &[Order]) -> Result<(), RenderError> {
    if orders.is_empty() {
        writeln!(out, "No orders found.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Date", "Customer", "Items", "Total", "Status", "Tracking"]);

    for order in orders {
        builder.push_record([
            order.uuid.to_string(),
            order.created_at.strftime("%d/%m/%Y %H:%M").to_string(),
            order.customer_name.clone(),
            order.lines.iter().map(|l| l.quantity).sum::<u32>().to_string(),
            money::format(order.total),
            order.status.to_string(),
            order.tracking_code.clone().unwrap_or_default(),
        ]);
    }

    writeln!(out, "{}", finish(builder.build(), Columns::new(3..5)))?;

    Ok(())
}

/// Lines of a single order.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_order(out: &mut impl io::Write, order: &Order) -> Result<(), RenderError> {
    writeln!(out, "Order {} ({})", order.uuid, order.status)?;
    writeln!(out, "Deliver to: {}", order.delivery_address)?;

    let mut builder = Builder::default();

    builder.push_record(["Line", "Title", "Qty", "Price", "Exchangeable"]);

    for line in &order.lines {
        builder.push_record([
            line.uuid.to_string(),
            line.title.clone(),
            line.quantity.to_string(),
            money::format(line.unit_price),
            if line.exchangeable { "yes" } else { "no" }.to_string(),
        ]);
    }

    writeln!(out, "{}", finish(builder.build(), Columns::new(2..4)))?;
    writeln!(
        out,
        "Subtotal {}  Freight {} ({})  Total {}",
        money::format(order.subtotal),
        money::format(order.freight),
        order.freight_method,
        money::format(order.total)
    )?;

    Ok(())
}

/// Checkout totals and the payments allocated so far.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_checkout(out: &mut impl io::Write, summary: &CheckoutSummary) -> Result<(), RenderError> {
    match &summary.address {
        Some(address) => writeln!(out, "Deliver to: {address}")?,
        None => writeln!(out, "Deliver to: no address selected")?,
    }

    match &summary.freight {
        Some(quote) => writeln!(out, "Freight: {} ({})", money::format(quote.cost), quote.method)?,
        None => writeln!(out, "Freight: not calculated")?,
    }

    if !summary.payments.is_empty() {
        let mut builder = Builder::default();

        builder.push_record(["Payment", "Amount"]);

        for allocation in &summary.payments {
            builder.push_record([allocation.instrument.to_string(), money::format(allocation.amount)]);
        }

        writeln!(out, "{}", finish(builder.build(), Columns::new(1..2)))?;
    }

    writeln!(
        out,
        "Subtotal {}  Due {}  Paid {}  Remaining {}",
        money::format(summary.subtotal),
        money::format(summary.due),
        money::format(summary.paid),
        money::format(summary.remaining)
    )?;

    Ok(())
}

/// Books running out of stock.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_low_stock(out: &mut impl io::Write, books: &[Book]) -> Result<(), RenderError> {
    if books.is_empty() {
        writeln!(out, "No books running low.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Title", "Stock"]);

    for book in books {
        builder.push_record([book.uuid.to_string(), book.title.clone(), book.stock.to_string()]);
    }

    writeln!(out, "{}", finish(builder.build(), Columns::new(2..3)))?;

    Ok(())
}

/// A freshly recorded stock entry.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_entry(out: &mut impl io::Write, entry: &StockEntry) -> Result<(), RenderError> {
    writeln!(
        out,
        "{} entry of {} unit(s), cost {}, suggested price {}",
        entry.kind,
        entry.quantity,
        money::format(entry.cost_price),
        money::format(entry.suggested_price)
    )?;

    Ok(())
}

/// Admin customer listing.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_customers(out: &mut impl io::Write, customers: &[Customer]) -> Result<(), RenderError> {
    if customers.is_empty() {
        writeln!(out, "No customers found.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Code", "Name", "Email", "CPF", "Ranking", "Status"]);

    for customer in customers {
        builder.push_record([
            customer.uuid.to_string(),
            customer.code.clone(),
            customer.name.clone(),
            customer.email.clone(),
            customer.cpf.clone(),
            format!("{} ({})", customer.ranking, RankingTier::of(customer.ranking)),
            customer.status.to_string(),
        ]);
    }

    writeln!(out, "{}", finish(builder.build(), Columns::new(5..6)))?;

    Ok(())
}

/// A customer's addresses and cards on file.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_profile(out: &mut impl io::Write, customer: &Customer) -> Result<(), RenderError> {
    writeln!(out, "{} ({}) {}", customer.name, customer.code, customer.status)?;

    let default = |is_default: bool| if is_default { "*" } else { "" }.to_string();

    if customer.addresses.is_empty() {
        writeln!(out, "No addresses on file.")?;
    } else {
        let mut builder = Builder::default();

        builder.push_record(["ID", "Name", "Use", "Address", "Default"]);

        for address in &customer.addresses {
            builder.push_record([
                address.uuid.to_string(),
                address.identifier.clone(),
                address.kind.to_string(),
                address.to_string(),
                default(address.is_default),
            ]);
        }

        writeln!(out, "{}", finish(builder.build(), Columns::new(4..5)))?;
    }

    if customer.cards.is_empty() {
        writeln!(out, "No cards on file.")?;
    } else {
        let mut builder = Builder::default();

        builder.push_record(["ID", "Card", "Holder", "Expiry", "Default"]);

        for card in &customer.cards {
            builder.push_record([
                card.uuid.to_string(),
                card.to_string(),
                card.holder.clone(),
                format!("{:02}/{}", card.expiry_month, card.expiry_year),
                default(card.is_default),
            ]);
        }

        writeln!(out, "{}", finish(builder.build(), Columns::new(3..5)))?;
    }

    Ok(())
}
