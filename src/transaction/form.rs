//! The pages and endpoints for recording an expense or income.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    amount::Amount,
    app_state::DatabaseState,
    auth::UserID,
    category::{
        CATEGORY_NAME_MAX_LENGTH, Category, CategoryName, get_categories_by_kind,
        get_or_create_category,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, field_error, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{NewTransaction, TransactionKind, create_transaction},
    validation::{DATE_FORMAT, ValidationErrors, parse_date},
};

const AMOUNT_FIELD: &str = "amount";
const CATEGORY_FIELD: &str = "category";
const DATE_FIELD: &str = "date";
const COMMENT_FIELD: &str = "comment";

/// The fields of the expense and income forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub amount: String,
    /// The category name, created if it does not exist.
    #[serde(default)]
    pub category: String,
    /// The date in the format YYYY-MM-DD. Blank means today.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, PartialEq)]
struct ValidatedTransaction {
    amount: Amount,
    category: CategoryName,
    date: Date,
    comment: String,
}

fn validate_transaction_form(
    form: &TransactionForm,
    today: Date,
) -> Result<ValidatedTransaction, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let amount = if form.amount.trim().is_empty() {
        errors.push(AMOUNT_FIELD, "Amount is required");
        None
    } else {
        Amount::parse(&form.amount)
            .map_err(|error| errors.push(AMOUNT_FIELD, error.to_string()))
            .ok()
    };

    let category = CategoryName::new(&form.category)
        .map_err(|error| errors.push(CATEGORY_FIELD, error.to_string()))
        .ok();

    let date = if form.date.trim().is_empty() {
        Some(today)
    } else {
        parse_date(&form.date)
            .map_err(|error| errors.push(DATE_FIELD, error.to_string()))
            .ok()
    };

    match (amount, category, date) {
        (Some(amount), Some(category), Some(date)) => errors.into_result(ValidatedTransaction {
            amount,
            category,
            date,
            comment: form.comment.clone(),
        }),
        _ => Err(errors),
    }
}

/// Render the page for recording an expense.
pub async fn get_add_expense_page(state: State<DatabaseState>) -> Result<Response, Error> {
    add_transaction_page(state, TransactionKind::Expense)
}

/// Render the page for recording an income.
pub async fn get_add_income_page(state: State<DatabaseState>) -> Result<Response, Error> {
    add_transaction_page(state, TransactionKind::Income)
}

fn add_transaction_page(
    State(state): State<DatabaseState>,
    kind: TransactionKind,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_by_kind(kind, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve {kind} categories: {error}"))?;

    let form = TransactionForm {
        date: today.format(DATE_FORMAT).unwrap_or_default(),
        ..Default::default()
    };

    let nav_bar = NavBar::new(kind.add_endpoint()).into_html();
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Add " (kind.label()) }
            (transaction_form(kind, &form, &categories, &ValidationErrors::new()))
        }
    };

    let title = format!("Add {}", kind.label());
    Ok(base(&title, &[dollar_input_styles()], &content).into_response())
}

/// Record an expense.
pub async fn create_expense_endpoint(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
    form: Form<TransactionForm>,
) -> Response {
    create_transaction_endpoint(state, user_id, form, TransactionKind::Expense)
}

/// Record an income.
pub async fn create_income_endpoint(
    state: State<DatabaseState>,
    user_id: Extension<UserID>,
    form: Form<TransactionForm>,
) -> Response {
    create_transaction_endpoint(state, user_id, form, TransactionKind::Income)
}

/// Record a transaction of `kind` from the submitted form.
///
/// The category is looked up by name and created when missing. Invalid input
/// re-renders the form with the errors, success sends the client to the list
/// of transactions of `kind`.
fn create_transaction_endpoint(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
    kind: TransactionKind,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let validated = match validate_transaction_form(&form, today) {
        Ok(validated) => validated,
        Err(errors) => {
            let categories = get_categories_by_kind(kind, &connection).unwrap_or_else(|error| {
                tracing::error!("Failed to retrieve {kind} categories: {error}");
                Vec::new()
            });

            return transaction_form(kind, &form, &categories, &errors).into_response();
        }
    };

    let result = get_or_create_category(&validated.category, kind, &connection).and_then(
        |category| {
            let new_transaction =
                NewTransaction::new(user_id, category.id, validated.amount, validated.date)
                    .comment(&validated.comment);

            create_transaction(kind, new_transaction, &connection)
        },
    );

    match result {
        Ok(transaction) => {
            tracing::debug!(
                "Recorded {kind} {} of {} for user {user_id}",
                transaction.id,
                transaction.amount
            );
            (
                HxRedirect(kind.list_endpoint().to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while recording an {kind}: {error}");
            error.into_alert_response()
        }
    }
}

fn transaction_form(
    kind: TransactionKind,
    form: &TransactionForm,
    categories: &[Category],
    errors: &ValidationErrors,
) -> Markup {
    let datalist_id = format!("{kind}-categories");

    html! {
        form
            hx-post=(kind.add_endpoint())
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper"
                {
                    input
                        id="amount"
                        type="number"
                        name=(AMOUNT_FIELD)
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        required
                        autofocus
                        value=(form.amount)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (field_error(errors, AMOUNT_FIELD))
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                input
                    id="category"
                    type="text"
                    name=(CATEGORY_FIELD)
                    list=(datalist_id)
                    maxlength=(CATEGORY_NAME_MAX_LENGTH)
                    required
                    value=(form.category)
                    class=(FORM_TEXT_INPUT_STYLE);

                datalist id=(datalist_id)
                {
                    @for category in categories {
                        option value=(category.name) {}
                    }
                }

                (field_error(errors, CATEGORY_FIELD))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name=(DATE_FIELD)
                    value=(form.date)
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors, DATE_FIELD))
            }

            div
            {
                label for="comment" class=(FORM_LABEL_STYLE) { "Comment" }

                input
                    id="comment"
                    type="text"
                    name=(COMMENT_FIELD)
                    placeholder="Optional"
                    value=(form.comment)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (loading_spinner()) }
                "Add " (kind.label())
            }
        }
    }
}

#[cfg(test)]
mod validate_transaction_form_tests {
    use time::macros::date;

    use crate::{Amount, category::CategoryName};

    use super::{
        AMOUNT_FIELD, CATEGORY_FIELD, DATE_FIELD, TransactionForm, ValidatedTransaction,
        validate_transaction_form,
    };

    fn form(amount: &str, category: &str, date: &str) -> TransactionForm {
        TransactionForm {
            amount: amount.to_owned(),
            category: category.to_owned(),
            date: date.to_owned(),
            comment: String::new(),
        }
    }

    #[test]
    fn blank_date_is_today() {
        let today = date!(2024 - 05 - 15);

        let got = validate_transaction_form(&form("12.50", "Food", ""), today);

        assert_eq!(
            got,
            Ok(ValidatedTransaction {
                amount: Amount::parse("12.50").unwrap(),
                category: CategoryName::new_unchecked("Food"),
                date: today,
                comment: String::new(),
            })
        );
    }

    #[test]
    fn reports_every_bad_field() {
        let errors =
            validate_transaction_form(&form("12.345", " ", "2024-13-01"), date!(2024 - 05 - 15))
                .unwrap_err();

        assert!(errors.message_for(AMOUNT_FIELD).is_some());
        assert_eq!(
            errors.message_for(CATEGORY_FIELD),
            Some("Category name cannot be empty")
        );
        assert!(errors.message_for(DATE_FIELD).is_some());
    }

    #[test]
    fn amount_is_required() {
        let errors = validate_transaction_form(&form("", "Food", ""), date!(2024 - 05 - 15))
            .unwrap_err();

        assert_eq!(errors.message_for(AMOUNT_FIELD), Some("Amount is required"));
    }
}
