//! Category listing pages and the inline creation form.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        Category, get_all_categories, get_categories_by_kind,
        create::{CategoryForm, category_form, create_category_from_form},
    },
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
    },
    navigation::NavBar,
    transaction::TransactionKind,
    validation::ValidationErrors,
};

const CONTENT_ID: &str = "categories-content";

/// The state needed for the category pages.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render every category with the form for creating one.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let content = categories_content(&categories, &CategoryForm::default(), &ValidationErrors::new());

    Ok(categories_page("Categories", endpoints::CATEGORIES, &content).into_response())
}

/// Render the expense categories.
pub async fn get_expense_categories_page(
    state: State<CategoriesPageState>,
) -> Result<Response, Error> {
    categories_of_kind_page(state, TransactionKind::Expense)
}

/// Render the income categories.
pub async fn get_income_categories_page(
    state: State<CategoriesPageState>,
) -> Result<Response, Error> {
    categories_of_kind_page(state, TransactionKind::Income)
}

fn categories_of_kind_page(
    State(state): State<CategoriesPageState>,
    kind: TransactionKind,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_by_kind(kind, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve {kind} categories: {error}"))?;

    let (title, endpoint) = match kind {
        TransactionKind::Expense => ("Expense Categories", endpoints::EXPENSE_CATEGORIES),
        TransactionKind::Income => ("Income Categories", endpoints::INCOME_CATEGORIES),
    };

    let content = html! {
        section id=(CONTENT_ID) class="space-y-4 w-full lg:max-w-5xl"
        {
            (categories_header(title))
            (categories_table(&categories))
        }
    };

    Ok(categories_page(title, endpoint, &content).into_response())
}

/// Create a category from the form on the categories page.
///
/// Responds with the page content: the updated list and an empty form, or
/// the unchanged list and the form with its errors.
pub async fn create_category_from_list(
    State(state): State<CategoriesPageState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let (form, errors) = match create_category_from_form(&form, &connection) {
        Ok(Ok(())) => (CategoryForm::default(), ValidationErrors::new()),
        Ok(Err(errors)) => (form, errors),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            return error.into_alert_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => categories_content(&categories, &form, &errors).into_response(),
        Err(error) => {
            tracing::error!("Failed to retrieve categories: {error}");
            error.into_alert_response()
        }
    }
}

fn categories_page(title: &str, active_endpoint: &str, content: &Markup) -> Markup {
    let nav_bar = NavBar::new(active_endpoint).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (content)
        }
    };

    base(title, &[], &content)
}

fn categories_header(title: &str) -> Markup {
    html! {
        header class="flex justify-between flex-wrap items-end gap-4"
        {
            h1 class="text-xl font-bold" { (title) }

            nav class="flex gap-4 text-sm"
            {
                a href=(endpoints::CATEGORIES) class=(LINK_STYLE) { "All" }
                a href=(endpoints::EXPENSE_CATEGORIES) class=(LINK_STYLE) { "Expense" }
                a href=(endpoints::INCOME_CATEGORIES) class=(LINK_STYLE) { "Income" }
                a href=(endpoints::ADD_CATEGORY) class=(LINK_STYLE) { "Create Category" }
            }
        }
    }
}

fn categories_content(
    categories: &[Category],
    form: &CategoryForm,
    errors: &ValidationErrors,
) -> Markup {
    let target = format!("#{CONTENT_ID}");

    html! {
        section id=(CONTENT_ID) class="space-y-4 w-full lg:max-w-5xl"
        {
            (categories_header("Categories"))
            (categories_table(categories))

            div class="max-w-md"
            {
                h2 class="text-lg font-semibold mb-2" { "Add a category" }
                (category_form(endpoints::CATEGORIES, Some(&target), form, errors))
            }
        }
    }
}

fn categories_table(categories: &[Category]) -> Markup {
    html! {
        table class=(TABLE_STYLE) data-categories-table="true"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for category in categories {
                    tr class=(TABLE_ROW_STYLE) data-category-row="true"
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            span class=(CATEGORY_BADGE_STYLE) { (category.name) }
                        }

                        td class=(TABLE_CELL_STYLE) { (category.kind.label()) }

                        td class=(TABLE_CELL_STYLE)
                        {
                            button
                                type="button"
                                hx-post=(endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id))
                                hx-confirm=(format!("Are you sure you want to delete '{}'?", category.name))
                                hx-target-error="#alert-container"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete"
                            }
                        }
                    }
                }

                @if categories.is_empty() {
                    tr
                    {
                        td colspan="3" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No categories yet."
                        }
                    }
                }
            }
        }
    }
}
