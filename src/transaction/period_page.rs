//! Per-category sums of expenses or incomes over a date range.

use std::collections::BTreeMap;

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    Error,
    aggregation::sum_by_category,
    app_state::DatabaseState,
    auth::UserID,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, field_error,
        format_currency,
    },
    navigation::NavBar,
    period::DateRange,
    transaction::TransactionKind,
    validation::{END_DATE_FIELD, START_DATE_FIELD, ValidationErrors, validate_date_range},
};

/// The date range in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(rename = "start-date")]
    pub start_date: Option<String>,
    #[serde(rename = "end-date")]
    pub end_date: Option<String>,
}

/// Sum the user's expenses by category.
pub async fn get_expenses_period_page(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
    query: Query<PeriodQuery>,
) -> Result<Response, Error> {
    period_page(state, user_id, query, TransactionKind::Expense)
}

/// Sum the user's incomes by category.
pub async fn get_incomes_period_page(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
    query: Query<PeriodQuery>,
) -> Result<Response, Error> {
    period_page(state, user_id, query, TransactionKind::Income)
}

/// Without any dates only the form is shown. Invalid dates show the form with
/// the errors.
fn period_page(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
    kind: TransactionKind,
) -> Result<Response, Error> {
    let is_blank = |value: &Option<String>| value.as_deref().is_none_or(|value| value.trim().is_empty());

    let (sums, errors) = if is_blank(&query.start_date) && is_blank(&query.end_date) {
        (None, ValidationErrors::new())
    } else {
        match validate_date_range(query.start_date.as_deref(), query.end_date.as_deref()) {
            Ok(range) => {
                let connection = state
                    .db_connection
                    .lock()
                    .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                    .map_err(|_| Error::DatabaseLockError)?;

                let sums = sum_by_category(kind, user_id, range, &connection).inspect_err(
                    |error| tracing::error!("Could not sum {kind} by category: {error}"),
                )?;

                (Some((range, sums)), ValidationErrors::new())
            }
            Err(errors) => (None, errors),
        }
    };

    let nav_bar = NavBar::new(kind.period_endpoint()).into_html();
    let title = format!("{} by Category", kind.plural_label());

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-6"
            {
                h1 class="text-xl font-bold" { (title) }

                (period_form(kind, &query, &errors))

                @if let Some((range, sums)) = &sums {
                    (sums_table(range, sums))
                }
            }
        }
    };

    Ok(base(&title, &[], &content).into_response())
}

fn period_form(kind: TransactionKind, query: &PeriodQuery, errors: &ValidationErrors) -> Markup {
    html! {
        form method="get" action=(kind.period_endpoint()) class="flex flex-wrap items-start gap-4"
        {
            div
            {
                label for="start-date" class=(FORM_LABEL_STYLE) { "Start date" }

                input
                    id="start-date"
                    type="date"
                    name=(START_DATE_FIELD)
                    required
                    value=[query.start_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors, START_DATE_FIELD))
            }

            div
            {
                label for="end-date" class=(FORM_LABEL_STYLE) { "End date" }

                input
                    id="end-date"
                    type="date"
                    name=(END_DATE_FIELD)
                    required
                    value=[query.end_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors, END_DATE_FIELD))
            }

            div class="self-end"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }
            }
        }
    }
}

fn sums_table(range: &DateRange, sums: &BTreeMap<String, Decimal>) -> Markup {
    let grand_total: Decimal = sums.values().sum();

    html! {
        table class=(TABLE_STYLE) data-sums-table="true"
        {
            caption class="p-2 text-left text-gray-900 dark:text-white"
            {
                (range.start) " to " (range.end)
            }

            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                }
            }

            tbody
            {
                @for (category, sum) in sums {
                    tr class=(TABLE_ROW_STYLE) data-sum-row="true"
                    {
                        td class=(TABLE_CELL_STYLE) { (category) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(*sum)) }
                    }
                }

                @if sums.is_empty() {
                    tr
                    {
                        td colspan="2" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "Nothing recorded in this period."
                        }
                    }
                }
            }

            tfoot
            {
                tr class="font-semibold text-gray-900 dark:text-white"
                {
                    th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                    td class=(TABLE_CELL_STYLE) data-grand-total="true" { (format_currency(grand_total)) }
                }
            }
        }
    }
}
