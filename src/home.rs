//! The home page: a landing page for visitors and a dashboard for users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    aggregation::totals,
    auth::{UserID, get_token_from_cookies},
    budget::{budgets_table, get_budgets, totals_view},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    transaction::{Transaction, TransactionKind, get_recent_transactions},
    validation::DATE_FORMAT,
};

/// How many of the latest expenses and incomes the dashboard shows.
const RECENT_TRANSACTION_LIMIT: u32 = 5;

/// The state needed for the home page.
#[derive(Debug, Clone)]
pub struct HomeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the dashboard for a logged-in user, or the landing page otherwise.
///
/// A missing, invalid or expired session is treated as a visitor rather than
/// redirected to the log-in page.
pub async fn get_home_page(
    State(state): State<HomeState>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    match get_token_from_cookies(&jar) {
        Ok(token) => dashboard(&state, token.user_id),
        Err(_) => Ok(landing_page().into_response()),
    }
}

fn landing_page() -> Markup {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-md space-y-6 text-center"
            {
                h1 class="text-3xl font-bold" { "Budget Tracker" }

                p class="text-gray-600 dark:text-gray-300"
                {
                    "Record your expenses and incomes, set budgets and see where your money goes."
                }

                a href=(endpoints::LOG_IN) class=(BUTTON_PRIMARY_STYLE) { "Log in" }

                p class="text-sm"
                {
                    "New here? " (link(endpoints::REGISTER, "Create an account"))
                }
            }
        }
    };

    base("Budget Tracker", &[], &content)
}

fn dashboard(state: &HomeState, user_id: UserID) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let totals = totals(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get totals: {error}"))?;
    let budgets = get_budgets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get budgets: {error}"))?;
    let expenses = get_recent_transactions(
        TransactionKind::Expense,
        user_id,
        RECENT_TRANSACTION_LIMIT,
        &connection,
    )?;
    let incomes = get_recent_transactions(
        TransactionKind::Income,
        user_id,
        RECENT_TRANSACTION_LIMIT,
        &connection,
    )?;

    let nav_bar = NavBar::new(endpoints::ROOT).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-8"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                (totals_view(&totals))

                section class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Budgets" }
                    (budgets_table(&budgets))
                }

                div class="grid gap-8 lg:grid-cols-2"
                {
                    (recent_transactions(TransactionKind::Expense, &expenses))
                    (recent_transactions(TransactionKind::Income, &incomes))
                }
            }
        }
    };

    Ok(base("Dashboard", &[], &content).into_response())
}

fn recent_transactions(kind: TransactionKind, transactions: &[Transaction]) -> Markup {
    html! {
        section class="space-y-2" data-recent=(kind.as_str())
        {
            header class="flex justify-between items-end"
            {
                h2 class="text-lg font-semibold" { "Recent " (kind.plural_label().to_lowercase()) }
                a href=(kind.list_endpoint()) class=(LINK_STYLE) { "See all" }
            }

            table class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE) data-recent-row="true"
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.date.format(DATE_FORMAT).unwrap_or_default()) }
                            td class=(TABLE_CELL_STYLE) { (transaction.category_name) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount.as_decimal())) }
                        }
                    }

                    @if transactions.is_empty() {
                        tr
                        {
                            td colspan="3" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "Nothing yet."
                            }
                        }
                    }
                }
            }
        }
    }
}
