//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
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
    category::{CATEGORY_NAME_MAX_LENGTH, CategoryName, create_category},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        field_error,
    },
    navigation::NavBar,
    transaction::TransactionKind,
    validation::ValidationErrors,
};

pub(super) const NAME_FIELD: &str = "new_category";
pub(super) const KIND_FIELD: &str = "category_type";

/// The fields of the category forms on the categories page and the add
/// category page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub new_category: String,
    #[serde(default)]
    pub category_type: String,
}

pub(super) fn validate_category_form(
    form: &CategoryForm,
) -> Result<(CategoryName, TransactionKind), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = CategoryName::new(&form.new_category)
        .map_err(|error| errors.push(NAME_FIELD, error.to_string()))
        .ok();

    let kind = if form.category_type.trim().is_empty() {
        errors.push(KIND_FIELD, "Choose whether this is an expense or income category");
        None
    } else {
        form.category_type
            .parse::<TransactionKind>()
            .map_err(|error| errors.push(KIND_FIELD, error.to_string()))
            .ok()
    };

    match (name, kind) {
        (Some(name), Some(kind)) => errors.into_result((name, kind)),
        _ => Err(errors),
    }
}

/// Validate the form and insert the category.
///
/// A duplicate name is reported against the name field.
pub(super) fn create_category_from_form(
    form: &CategoryForm,
    connection: &Connection,
) -> Result<Result<(), ValidationErrors>, Error> {
    let (name, kind) = match validate_category_form(form) {
        Ok(validated) => validated,
        Err(errors) => return Ok(Err(errors)),
    };

    match create_category(name, kind, connection) {
        Ok(category) => {
            tracing::info!("Created {} category {}", category.kind, category.name);
            Ok(Ok(()))
        }
        Err(Error::DuplicateCategory) => {
            let mut errors = ValidationErrors::new();
            errors.push(NAME_FIELD, Error::DuplicateCategory.to_string());
            Ok(Err(errors))
        }
        Err(error) => Err(error),
    }
}

/// The category form.
///
/// `hx_target` is the element the response replaces, or `None` to let HTMX
/// follow the redirect on success.
pub(super) fn category_form(
    endpoint: &str,
    hx_target: Option<&str>,
    form: &CategoryForm,
    errors: &ValidationErrors,
) -> Markup {
    let selected_kind = form
        .category_type
        .parse::<TransactionKind>()
        .unwrap_or(TransactionKind::Expense);

    html! {
        form
            hx-post=(endpoint)
            hx-target=[hx_target]
            hx-swap=[hx_target.map(|_| "outerHTML")]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="new-category" class=(FORM_LABEL_STYLE) { "Category Name" }

                input
                    id="new-category"
                    type="text"
                    name=(NAME_FIELD)
                    placeholder="Groceries"
                    maxlength=(CATEGORY_NAME_MAX_LENGTH)
                    required
                    value=(form.new_category)
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors, NAME_FIELD))
            }

            div
            {
                label for="category-type" class=(FORM_LABEL_STYLE) { "Type" }

                select id="category-type" name=(KIND_FIELD) class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in [TransactionKind::Expense, TransactionKind::Income] {
                        option value=(kind.as_str()) selected[kind == selected_kind] { (kind.label()) }
                    }
                }

                (field_error(errors, KIND_FIELD))
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the add category page.
pub async fn get_add_category_page() -> Response {
    let nav_bar = NavBar::new(endpoints::ADD_CATEGORY).into_html();
    let form = category_form(
        endpoints::ADD_CATEGORY,
        None,
        &CategoryForm::default(),
        &ValidationErrors::new(),
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Category" }
            (form)
        }
    };

    base("Create Category", &[], &content).into_response()
}

/// Create a category and send the client to the categories page.
///
/// Invalid input re-renders the form with the errors.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category_from_form(&form, &connection) {
        Ok(Ok(())) => (
            HxRedirect(endpoints::CATEGORIES.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Ok(Err(errors)) => category_form(endpoints::ADD_CATEGORY, None, &form, &errors).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_alert_response()
        }
    }
}



#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;

    use crate::{
        category::{CategoryName, get_all_categories},
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html, get_test_connection,
            must_get_form, parse_html_fragment,
        },
        transaction::TransactionKind,
    };

    use super::{CategoryForm, CreateCategoryState, create_category_endpoint};

    fn get_state() -> CreateCategoryState {
        CreateCategoryState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn form(name: &str, kind: &str) -> CategoryForm {
        CategoryForm {
            new_category: name.to_owned(),
            category_type: kind.to_owned(),
        }
    }

    #[tokio::test]
    async fn creates_category_and_redirects() {
        let state = get_state();

        let response =
            create_category_endpoint(State(state.clone()), Form(form("Salary", "income"))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES);
        let categories = get_all_categories(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, CategoryName::new_unchecked("Salary"));
        assert_eq!(categories[0].kind, TransactionKind::Income);
    }

    #[tokio::test]
    async fn duplicate_category_rerenders_form() {
        let state = get_state();
        create_category_endpoint(State(state.clone()), Form(form("Rent", "expense"))).await;

        let response =
            create_category_endpoint(State(state.clone()), Form(form("Rent", "expense"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "a category with that name and type already exists");
    }

    #[tokio::test]
    async fn same_name_with_other_kind_is_allowed() {
        let state = get_state();
        create_category_endpoint(State(state.clone()), Form(form("Gifts", "expense"))).await;

        let response =
            create_category_endpoint(State(state.clone()), Form(form("Gifts", "income"))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_all_categories(&state.db_connection.lock().unwrap())
                .unwrap()
                .len(),
            2
        );
    }
}
