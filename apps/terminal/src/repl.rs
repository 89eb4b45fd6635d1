//! # Register REPL
//!
//! Turns operator input into command calls and command results into one
//! JSON line each.
//!
//! ## Input
//! ```text
//! 5901234123457            manual entry (one or more codes)
//! 590123 400000, 7622210   manual entry, split on whitespace and commas
//! /qty p-1:v-1 3           slash command
//! ```
//!
//! ## Output
//! ```text
//! {"ok":true,"data":{...}}
//! {"ok":false,"error":{"code":"INSUFFICIENT_STOCK","message":"..."}}
//! ```
//!
//! Codes from the scanner listener arrive separately through
//! [`Register::on_scanned`] and produce the same kind of reply.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use tally_core::{DiscountValue, FocusContext, FocusTarget, Money, PaymentMethod};

use crate::commands;
use crate::error::ApiError;
use crate::scanner::ScannerHandle;
use crate::state::{CartState, CatalogState, ConfigState, CustomerState, DbState, TaxState};
use crate::upstream::{BackOffice, PaymentEntry};

const HELP: &str = "\
<codes>                      add codes typed or pasted
/cart                        show the cart
/add <variant-id>            add a variant by id
/qty <line-id> <n>           set a line quantity (0 removes)
/rm <line-id>                remove a line
/clear                       start over
/toggle <line-id>            toggle a line's product discount
/discount <10%|5.00|auto>    manual cart discount, or back to auto
/tax [percent]               show or set the tax rate
/drafts                      list parked sales
/save                        park the current sale
/restore <draft-id>          bring a parked sale back
/discard <draft-id>          delete a parked sale
/customers                   list customers
/customer <id>               attribute the sale to a customer
/refresh                     reload catalog and customers
/catalog [query]             search the catalog
/checkout <method> <amount>  pay and submit (repeat pairs for split tender)
/focus <target>              none|scan|text|number|select|other
/modal <on|off>              mark a modal as open or closed
/config                      show configuration
/help                        this text
/quit                        exit";

// =============================================================================
// Commands
// =============================================================================

/// A parsed line of operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Manual(String),
    Cart,
    Add(String),
    Quantity { line_id: String, quantity: i64 },
    Remove(String),
    Clear,
    Toggle(String),
    ManualDiscount(DiscountValue),
    AutoDiscount,
    ShowTax,
    SetTax(f64),
    Drafts,
    Save,
    Restore(String),
    Discard(String),
    Customers,
    SelectCustomer(String),
    Refresh,
    Catalog(String),
    Checkout(Vec<PaymentEntry>),
    Focus(FocusTarget),
    Modal(bool),
    Config,
    Help,
    Quit,
}

impl Command {
    /// Parses one line. Amounts are read in the configured currency.
    pub fn parse(line: &str, config: &ConfigState) -> Result<Option<Command>, ApiError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Command::Manual(line.to_string())));
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let command = match (name, args.as_slice()) {
            ("cart", []) => Command::Cart,
            ("add", [id]) => Command::Add(id.to_string()),
            ("qty", [line_id, qty]) => Command::Quantity {
                line_id: line_id.to_string(),
                quantity: qty
                    .parse()
                    .map_err(|_| ApiError::validation(format!("Not a quantity: {}", qty)))?,
            },
            ("rm", [line_id]) => Command::Remove(line_id.to_string()),
            ("clear", []) => Command::Clear,
            ("toggle", [line_id]) => Command::Toggle(line_id.to_string()),
            ("discount", ["auto"]) => Command::AutoDiscount,
            ("discount", [value]) => Command::ManualDiscount(parse_discount(value, config)?),
            ("tax", []) => Command::ShowTax,
            ("tax", [pct]) => Command::SetTax(
                pct.trim_end_matches('%')
                    .parse()
                    .map_err(|_| ApiError::validation(format!("Not a percentage: {}", pct)))?,
            ),
            ("drafts", []) => Command::Drafts,
            ("save", []) => Command::Save,
            ("restore", [id]) => Command::Restore(id.to_string()),
            ("discard", [id]) => Command::Discard(id.to_string()),
            ("customers", []) => Command::Customers,
            ("customer", [id]) => Command::SelectCustomer(id.to_string()),
            ("refresh", []) => Command::Refresh,
            ("catalog", query) => Command::Catalog(query.join(" ")),
            ("checkout", tenders) => Command::Checkout(parse_tenders(tenders, config)?),
            ("focus", [target]) => Command::Focus(parse_focus(target)?),
            ("modal", ["on"]) => Command::Modal(true),
            ("modal", ["off"]) => Command::Modal(false),
            ("config", []) => Command::Config,
            ("help", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => {
                return Err(ApiError::validation(format!(
                    "Unknown command or wrong arguments: /{} (try /help)",
                    rest
                )))
            }
        };

        Ok(Some(command))
    }
}

/// `10%` is a percentage, anything else an amount in the store currency.
fn parse_discount(input: &str, config: &ConfigState) -> Result<DiscountValue, ApiError> {
    if let Some(pct) = input.strip_suffix('%') {
        let pct: f64 = pct
            .parse()
            .map_err(|_| ApiError::validation(format!("Not a percentage: {}", input)))?;
        if !pct.is_finite() || pct < 0.0 {
            return Err(ApiError::validation(format!("Not a percentage: {}", input)));
        }
        return Ok(DiscountValue::percentage_bps((pct * 100.0).round() as u32));
    }

    config
        .parse_amount(input)
        .map(DiscountValue::fixed_cents)
        .ok_or_else(|| ApiError::validation(format!("Not an amount: {}", input)))
}

fn parse_tenders(args: &[&str], config: &ConfigState) -> Result<Vec<PaymentEntry>, ApiError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(ApiError::validation(
            "Expected <method> <amount> pairs, e.g. /checkout cash 20.00",
        ));
    }

    args.chunks(2)
        .map(|pair| -> Result<PaymentEntry, ApiError> {
            let method: PaymentMethod = pair[0].parse()?;
            let cents = config
                .parse_amount(pair[1])
                .ok_or_else(|| ApiError::validation(format!("Not an amount: {}", pair[1])))?;
            Ok(PaymentEntry {
                method,
                amount: Money::from_cents(cents),
            })
        })
        .collect()
}

fn parse_focus(input: &str) -> Result<FocusTarget, ApiError> {
    match input {
        "none" => Ok(FocusTarget::None),
        "scan" => Ok(FocusTarget::ScanField),
        "text" => Ok(FocusTarget::TextInput),
        "number" => Ok(FocusTarget::NumberInput),
        "select" => Ok(FocusTarget::Select),
        "other" => Ok(FocusTarget::Other),
        _ => Err(ApiError::validation(format!("Unknown focus target: {}", input))),
    }
}

// =============================================================================
// Replies
// =============================================================================

/// One line of output.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Reply {
    fn from_result(result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(data) => Reply {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Reply {
                ok: false,
                data: None,
                error: Some(error),
            },
        }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"ok":false,"error":{{"code":"INTERNAL","message":"{}"}}}}"#,
                e
            )
        })
    }
}

/// What the caller does after a line.
#[derive(Debug)]
pub enum Step {
    Reply(Reply),
    Skip,
    Quit,
}

fn json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

// =============================================================================
// Register
// =============================================================================

/// Everything one register session owns.
pub struct Register {
    pub config: ConfigState,
    pub db: DbState,
    pub cart: CartState,
    pub catalog: CatalogState,
    pub customers: CustomerState,
    pub tax: TaxState,
    pub back_office: Arc<dyn BackOffice>,
    pub scanner: Option<ScannerHandle>,
}

impl Register {
    /// Handles one line of operator input.
    pub async fn handle_line(&self, line: &str) -> Step {
        match Command::parse(line, &self.config) {
            Ok(None) => Step::Skip,
            Ok(Some(Command::Quit)) => Step::Quit,
            Ok(Some(command)) => Step::Reply(Reply::from_result(self.execute(command).await)),
            Err(e) => Step::Reply(Reply::from_result(Err(e))),
        }
    }

    /// Handles a code classified by the scanner listener.
    pub fn on_scanned(&self, code: &str) -> Reply {
        let result = commands::scan::scan_code(&self.catalog, &self.cart, &self.tax, code)
            .and_then(json);
        Reply::from_result(result)
    }

    /// Reloads catalog and customers. Failures come back as notices.
    pub async fn refresh(&self) -> Value {
        let (catalog, customers) = tokio::join!(
            commands::catalog::refresh_catalog(self.back_office.as_ref(), &self.catalog),
            commands::customer::refresh_customers(self.back_office.as_ref(), &self.customers),
        );
        serde_json::json!({ "catalog": catalog, "customers": customers })
    }

    fn scanner(&self) -> Result<&ScannerHandle, ApiError> {
        self.scanner
            .as_ref()
            .ok_or_else(|| ApiError::validation("Scanner listener is not running"))
    }

    pub async fn execute(&self, command: Command) -> Result<Value, ApiError> {
        debug!(?command, "Executing");
        let bo = self.back_office.as_ref();

        match command {
            Command::Manual(input) => json(commands::scan::submit_manual_entry(
                &self.config,
                &self.catalog,
                &self.cart,
                &self.tax,
                &input,
            )?),
            Command::Cart => json(commands::cart::get_cart(&self.cart, &self.tax)),
            Command::Add(id) => json(commands::cart::add_variant(
                &self.catalog,
                &self.cart,
                &self.tax,
                &id,
            )?),
            Command::Quantity { line_id, quantity } => json(commands::cart::update_quantity(
                &self.cart, &self.tax, &line_id, quantity,
            )?),
            Command::Remove(line_id) => {
                json(commands::cart::remove_line(&self.cart, &self.tax, &line_id))
            }
            Command::Clear => json(commands::cart::clear_cart(&self.cart, &self.tax)),
            Command::Toggle(line_id) => json(commands::discount::toggle_line_discount(
                &self.cart, &self.tax, &line_id,
            )?),
            Command::ManualDiscount(value) => json(commands::discount::set_manual_discount(
                &self.cart, &self.tax, value,
            )?),
            Command::AutoDiscount => {
                json(commands::discount::use_auto_discounts(&self.cart, &self.tax))
            }
            Command::ShowTax => json(commands::config::get_tax_rate(&self.tax)),
            Command::SetTax(pct) => {
                json(commands::config::set_tax_rate(&self.db, &self.tax, pct).await?)
            }
            Command::Drafts => json(commands::draft::list_drafts(&self.db).await?),
            Command::Save => json(
                commands::draft::save_draft(&self.db, &self.cart, &self.customers, &self.tax)
                    .await?,
            ),
            Command::Restore(id) => json(
                commands::draft::restore_draft(
                    &self.db,
                    &self.cart,
                    &self.customers,
                    &self.tax,
                    &id,
                )
                .await?,
            ),
            Command::Discard(id) => {
                let deleted = commands::draft::delete_draft(&self.db, &id).await?;
                json(serde_json::json!({ "draftId": id, "deleted": deleted }))
            }
            Command::Customers => json(commands::customer::list_customers(&self.customers)),
            Command::SelectCustomer(id) => {
                json(commands::customer::select_customer(&self.customers, &id)?)
            }
            Command::Refresh => Ok(self.refresh().await),
            Command::Catalog(query) => {
                json(commands::catalog::search_catalog(&self.catalog, &query))
            }
            Command::Checkout(payments) => json(
                commands::checkout::checkout(bo, &self.cart, &self.customers, &self.tax, payments)
                    .await?,
            ),
            Command::Focus(target) => {
                let scanner = self.scanner()?;
                let modal_open = scanner.focus().modal_open;
                scanner.set_focus(FocusContext {
                    modal_open,
                    focused: target,
                });
                json(scanner.focus())
            }
            Command::Modal(open) => {
                let scanner = self.scanner()?;
                scanner.set_modal(open);
                json(scanner.focus())
            }
            Command::Config => json(commands::config::get_config(&self.config)),
            Command::Help => Ok(Value::String(HELP.to_string())),
            Command::Quit => Ok(Value::Null),
        }
    }
}
