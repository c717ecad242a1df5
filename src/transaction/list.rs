//! The expense and income lists and their period filters.

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    app_state::DatabaseState,
    auth::UserID,
    html::{
        BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency,
    },
    navigation::NavBar,
    period::{Period, resolve_period},
    timezone::local_today,
    transaction::{Transaction, TransactionKind, get_transactions},
    validation::DATE_FORMAT,
};

const TABLE_ID: &str = "transactions-table";

/// The query string of the table fragment endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    /// "day", "week", "month" or "year". Anything else shows everything.
    pub filter: Option<String>,
}

/// Render the list of the user's expenses.
pub async fn get_expenses_page(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
) -> Result<Response, Error> {
    transactions_page(state, user_id, TransactionKind::Expense)
}

/// Render the list of the user's incomes.
pub async fn get_incomes_page(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
) -> Result<Response, Error> {
    transactions_page(state, user_id, TransactionKind::Income)
}

fn transactions_page(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
    kind: TransactionKind,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions(kind, user_id, None, &connection)
        .inspect_err(|error| tracing::error!("Could not get {kind} list: {error}"))?;

    let nav_bar = NavBar::new(kind.list_endpoint()).into_html();
    let target = format!("#{TABLE_ID}");

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { (kind.plural_label()) }

                    div class="flex gap-4 text-sm"
                    {
                        a href=(kind.period_endpoint()) class=(LINK_STYLE) { "Sum by category" }
                        a href=(kind.add_endpoint()) class=(LINK_STYLE) { "Add " (kind.label()) }
                    }
                }

                div class="flex flex-wrap gap-2" role="group"
                {
                    @for period in Period::ALL {
                        button
                            type="button"
                            hx-get=(format!("{}?filter={}", kind.fetch_endpoint(), period.as_query_value()))
                            hx-target=(target)
                            hx-swap="outerHTML"
                            hx-target-error="#alert-container"
                            class=(BUTTON_SECONDARY_STYLE)
                        {
                            (period.label())
                        }
                    }

                    button
                        type="button"
                        hx-get=(kind.fetch_endpoint())
                        hx-target=(target)
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "All"
                    }
                }

                (transactions_table(kind, &transactions))
            }
        }
    };

    Ok(base(kind.plural_label(), &[], &content).into_response())
}

/// The table of expenses for the period in the query string.
pub async fn fetch_expenses(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
    query: Query<FilterQuery>,
) -> Response {
    fetch_transactions(state, user_id, query, TransactionKind::Expense)
}

/// The table of incomes for the period in the query string.
pub async fn fetch_incomes(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
    query: Query<FilterQuery>,
) -> Response {
    fetch_transactions(state, user_id, query, TransactionKind::Income)
}

fn fetch_transactions(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<FilterQuery>,
    kind: TransactionKind,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };
    let range = resolve_period(query.filter.as_deref(), today);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_transactions(kind, user_id, range, &connection) {
        Ok(transactions) => transactions_table(kind, &transactions).into_response(),
        Err(error) => {
            tracing::error!("Could not get {kind} list for {range:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// A table of transactions, replaced as a whole by the filter buttons.
fn transactions_table(kind: TransactionKind, transactions: &[Transaction]) -> Markup {
    html! {
        table id=(TABLE_ID) class=(TABLE_STYLE)
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Comment" }
                }
            }

            tbody
            {
                @for transaction in transactions {
                    tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            (transaction.date.format(DATE_FORMAT).unwrap_or_default())
                        }
                        td class=(TABLE_CELL_STYLE)
                        {
                            span class=(CATEGORY_BADGE_STYLE) { (transaction.category_name) }
                        }
                        td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount.as_decimal())) }
                        td class=(TABLE_CELL_STYLE) { (transaction.comment.as_deref().unwrap_or_default()) }
                    }
                }

                @if transactions.is_empty() {
                    tr
                    {
                        td colspan="4" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No " (kind.plural_label().to_lowercase()) " to show."
                        }
                    }
                }
            }
        }
    }
}
