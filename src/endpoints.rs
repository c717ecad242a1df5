//! The endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/delete_category/{category_id}/', use [format_endpoint].

/// The home page: a landing page for visitors and a dashboard for logged in users.
pub const ROOT: &str = "/";
/// The route for the log-in page and log-in form submissions.
pub const LOG_IN: &str = "/login/";
/// The route for the registration page and registration form submissions.
pub const REGISTER: &str = "/register/";
/// The route for logging out the current user.
pub const LOG_OUT: &str = "/logout/";
/// The page with total income, expenses and the user's budgets.
pub const BUDGET_SUMMARY: &str = "/budget_summary/";
/// The route to create a budget.
pub const ADD_BUDGET: &str = "/add_budget/";
/// The page listing the user's expenses.
pub const EXPENSES_LIST: &str = "/expenses_list/";
/// The page and form submission route for recording an expense.
pub const ADD_EXPENSE: &str = "/add_expenses/";
/// The expense table fragment for a period filter.
pub const FETCH_EXPENSES: &str = "/fetch_expenses/";
/// The page summing expenses by category over a date range.
pub const EXPENSES_PERIOD: &str = "/expenses_period/";
/// The page listing the user's incomes.
pub const INCOMES_LIST: &str = "/incomes_list/";
/// The page and form submission route for recording an income.
pub const ADD_INCOME: &str = "/add_income/";
/// The income table fragment for a period filter.
pub const FETCH_INCOMES: &str = "/fetch_incomes/";
/// The page summing incomes by category over a date range.
pub const INCOMES_PERIOD: &str = "/incomes_period/";
/// The page with the monthly income and expense chart.
pub const CHARTS: &str = "/charts/";
/// The monthly summaries for a year as JSON.
pub const CHART_DATA: &str = "/data";
/// The page listing all categories and the route for creating one.
pub const CATEGORIES: &str = "/categories/";
/// The page listing expense categories.
pub const EXPENSE_CATEGORIES: &str = "/categories/expense/";
/// The page listing income categories.
pub const INCOME_CATEGORIES: &str = "/categories/income/";
/// The page and form submission route for creating a category.
pub const ADD_CATEGORY: &str = "/add_category/";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/delete_category/{category_id}/";
/// The page with links to the report downloads.
pub const REPORT: &str = "/report/";
/// The CSV report download.
pub const CSV_REPORT: &str = "/generate_csv_report/";
/// The PDF report download.
pub const PDF_REPORT: &str = "/generate_pdf_report/";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error/";
/// The route for static files.
pub const STATIC: &str = "/static";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::LOG_IN,
            endpoints::REGISTER,
            endpoints::LOG_OUT,
            endpoints::BUDGET_SUMMARY,
            endpoints::ADD_BUDGET,
            endpoints::EXPENSES_LIST,
            endpoints::ADD_EXPENSE,
            endpoints::FETCH_EXPENSES,
            endpoints::EXPENSES_PERIOD,
            endpoints::INCOMES_LIST,
            endpoints::ADD_INCOME,
            endpoints::FETCH_INCOMES,
            endpoints::INCOMES_PERIOD,
            endpoints::CHARTS,
            endpoints::CHART_DATA,
            endpoints::CATEGORIES,
            endpoints::EXPENSE_CATEGORIES,
            endpoints::INCOME_CATEGORIES,
            endpoints::ADD_CATEGORY,
            endpoints::REPORT,
            endpoints::CSV_REPORT,
            endpoints::PDF_REPORT,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }

        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::DELETE_CATEGORY, 1));
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_with_trailing_slash() {
        let formatted_path = format_endpoint(endpoints::DELETE_CATEGORY, 42);

        assert_eq!(formatted_path, "/delete_category/42/");
    }
}
