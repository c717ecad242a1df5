//! The budget summary page and the endpoint for creating budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    aggregation::{Totals, totals},
    amount::Amount,
    auth::UserID,
    budget::{Budget, create_budget, get_budgets},
    category::{CATEGORY_NAME_MAX_LENGTH, CategoryName, get_or_create_category},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
        dollar_input_styles, field_error, format_currency,
    },
    navigation::NavBar,
    transaction::TransactionKind,
    validation::ValidationErrors,
};

const CATEGORY_FIELD: &str = "category";
const CATEGORY_TYPE_FIELD: &str = "category_type";
const AMOUNT_FIELD: &str = "amount";

/// The state needed for the budget summary page and creating budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The budget form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetForm {
    /// The category name. A blank name creates a budget without a category.
    #[serde(default)]
    pub category: String,
    /// "expense" or "income", defaults to "expense".
    #[serde(default)]
    pub category_type: String,
    #[serde(default)]
    pub amount: String,
}

struct ValidatedBudget {
    category: Option<(CategoryName, TransactionKind)>,
    amount: Amount,
}

fn validate_budget_form(form: &BudgetForm) -> Result<ValidatedBudget, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let kind = match form.category_type.trim() {
        "" => Some(TransactionKind::Expense),
        raw => raw
            .parse::<TransactionKind>()
            .map_err(|error| errors.push(CATEGORY_TYPE_FIELD, error.to_string()))
            .ok(),
    };

    let category = if form.category.trim().is_empty() {
        Some(None)
    } else {
        CategoryName::new(&form.category)
            .map(Some)
            .map_err(|error| errors.push(CATEGORY_FIELD, error.to_string()))
            .ok()
    };

    let amount = if form.amount.trim().is_empty() {
        errors.push(AMOUNT_FIELD, "Amount is required");
        None
    } else {
        Amount::parse(&form.amount)
            .map_err(|error| errors.push(AMOUNT_FIELD, error.to_string()))
            .ok()
    };

    match (category, kind, amount) {
        (Some(category), Some(kind), Some(amount)) => errors.into_result(ValidatedBudget {
            category: category.map(|name| (name, kind)),
            amount,
        }),
        _ => Err(errors),
    }
}

/// Render the totals, the user's budgets and the budget form.
pub async fn get_budget_summary_page(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let totals = totals(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not calculate totals: {error}"))?;
    let budgets = get_budgets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get budgets: {error}"))?;

    let nav_bar = NavBar::new(endpoints::BUDGET_SUMMARY).into_html();
    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-5xl space-y-8"
            {
                h1 class="text-xl font-bold" { "Summary" }

                (totals_view(&totals))

                section class="space-y-4"
                {
                    h2 class="text-lg font-semibold" { "Budgets" }
                    (budgets_table(&budgets))
                }

                section class="max-w-md space-y-4"
                {
                    h2 class="text-lg font-semibold" { "New budget" }
                    (budget_form(&BudgetForm::default(), &ValidationErrors::new()))
                }
            }
        }
    };

    Ok(base("Summary", &[dollar_input_styles()], &content).into_response())
}

/// Create a budget and send the client back to the summary page.
///
/// A named category is created if it does not exist yet.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let budget = match validate_budget_form(&form) {
        Ok(budget) => budget,
        Err(errors) => return budget_form(&form, &errors).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = budget
        .category
        .map(|(name, kind)| get_or_create_category(&name, kind, &connection))
        .transpose()
        .and_then(|category| {
            create_budget(
                user_id,
                category.map(|category| category.id),
                budget.amount,
                &connection,
            )
        });

    match result {
        Ok(budget_id) => {
            tracing::info!("Created budget {budget_id} for user {user_id}");
            (
                HxRedirect(endpoints::BUDGET_SUMMARY.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a budget: {error}");
            error.into_alert_response()
        }
    }
}

/// Cards with the all-time income, expenses and balance.
pub(crate) fn totals_view(totals: &Totals) -> Markup {
    let card = |label: &str, value| {
        html! {
            div
                class="flex-1 rounded border border-gray-200 bg-white px-4 py-3 shadow-sm
                    dark:border-gray-700 dark:bg-gray-800"
                data-total=(label)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
                p class="text-2xl font-semibold tabular-nums" { (format_currency(value)) }
            }
        }
    };

    html! {
        div class="flex flex-col gap-4 sm:flex-row"
        {
            (card("Income", totals.income))
            (card("Expenses", totals.expense))
            (card("Balance", totals.balance))
        }
    }
}

/// A table of budgets with their category and running amount.
pub(crate) fn budgets_table(budgets: &[Budget]) -> Markup {
    html! {
        table class=(TABLE_STYLE) data-budgets-table="true"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                }
            }

            tbody
            {
                @for budget in budgets {
                    tr class=(TABLE_ROW_STYLE) data-budget-row="true"
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            @match &budget.category_name {
                                Some(name) => { (name) }
                                None => { span class="italic" { "No category" } }
                            }
                        }
                        td class=(TABLE_CELL_STYLE) { (format_currency(budget.amount.as_decimal())) }
                    }
                }

                @if budgets.is_empty() {
                    tr
                    {
                        td colspan="2" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No budgets yet."
                        }
                    }
                }
            }
        }
    }
}

fn budget_form(form: &BudgetForm, errors: &ValidationErrors) -> Markup {
    let selected_kind = form
        .category_type
        .parse::<TransactionKind>()
        .unwrap_or(TransactionKind::Expense);

    html! {
        form
            hx-post=(endpoints::ADD_BUDGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="budget-category" class=(FORM_LABEL_STYLE) { "Category (optional)" }

                input
                    id="budget-category"
                    type="text"
                    name=(CATEGORY_FIELD)
                    maxlength=(CATEGORY_NAME_MAX_LENGTH)
                    value=(form.category)
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors, CATEGORY_FIELD))
            }

            div
            {
                label for="budget-category-type" class=(FORM_LABEL_STYLE) { "Category Type" }

                select id="budget-category-type" name=(CATEGORY_TYPE_FIELD) class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in [TransactionKind::Expense, TransactionKind::Income] {
                        option value=(kind.as_str()) selected[kind == selected_kind] { (kind.label()) }
                    }
                }

                (field_error(errors, CATEGORY_TYPE_FIELD))
            }

            div
            {
                label for="budget-amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper"
                {
                    input
                        id="budget-amount"
                        type="number"
                        name=(AMOUNT_FIELD)
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        required
                        value=(form.amount)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (field_error(errors, AMOUNT_FIELD))
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Budget" }
        }
    }
}
