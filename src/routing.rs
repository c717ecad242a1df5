//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    budget::{create_budget_endpoint, get_budget_summary_page},
    category::{
        create_category_endpoint, create_category_from_list, delete_category_endpoint,
        get_add_category_page, get_categories_page, get_expense_categories_page,
        get_income_categories_page,
    },
    charts::{get_chart_data, get_charts_page},
    endpoints,
    home::get_home_page,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    report::{get_csv_report, get_pdf_report, get_report_page},
    transaction::{
        create_expense_endpoint, create_income_endpoint, fetch_expenses, fetch_incomes,
        get_add_expense_page, get_add_income_page, get_expenses_page, get_expenses_period_page,
        get_incomes_page, get_incomes_period_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(endpoints::LOG_IN, get(get_log_in_page).post(post_log_in))
        .route(endpoints::REGISTER, get(get_register_page).post(register_user))
        .route(endpoints::LOG_OUT, get(get_log_out).post(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::BUDGET_SUMMARY, get(get_budget_summary_page))
        .route(endpoints::EXPENSES_LIST, get(get_expenses_page))
        .route(endpoints::ADD_EXPENSE, get(get_add_expense_page))
        .route(endpoints::EXPENSES_PERIOD, get(get_expenses_period_page))
        .route(endpoints::INCOMES_LIST, get(get_incomes_page))
        .route(endpoints::ADD_INCOME, get(get_add_income_page))
        .route(endpoints::INCOMES_PERIOD, get(get_incomes_period_page))
        .route(endpoints::CHARTS, get(get_charts_page))
        .route(endpoints::CHART_DATA, get(get_chart_data))
        .route(endpoints::CATEGORIES, get(get_categories_page))
        .route(endpoints::EXPENSE_CATEGORIES, get(get_expense_categories_page))
        .route(endpoints::INCOME_CATEGORIES, get(get_income_categories_page))
        .route(endpoints::ADD_CATEGORY, get(get_add_category_page))
        .route(endpoints::REPORT, get(get_report_page))
        .route(endpoints::CSV_REPORT, get(get_csv_report))
        .route(endpoints::PDF_REPORT, get(get_pdf_report))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // Form submissions and table partials are requested by HTMX, which needs the HX-REDIRECT
    // header rather than a plain redirect to reach the log-in page.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::ADD_BUDGET, post(create_budget_endpoint))
            .route(endpoints::ADD_EXPENSE, post(create_expense_endpoint))
            .route(endpoints::FETCH_EXPENSES, get(fetch_expenses))
            .route(endpoints::ADD_INCOME, post(create_income_endpoint))
            .route(endpoints::FETCH_INCOMES, get(fetch_incomes))
            .route(endpoints::CATEGORIES, post(create_category_from_list))
            .route(endpoints::ADD_CATEGORY, post(create_category_endpoint))
            .route(endpoints::DELETE_CATEGORY, post(delete_category_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;

    use crate::{
        AppState,
        auth::COOKIE_TOKEN,
        endpoints::{self, format_endpoint},
        test_utils::insert_test_user,
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database");
        let state = AppState::new(connection, "nafstenoas", "Etc/UTC")
            .expect("Could not create app state");
        insert_test_user(&state.db_connection.lock().unwrap(), "alice", "hunter2");

        TestServer::try_new(build_router(state)).expect("Could not create test server")
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "alice"), ("password", "hunter2")])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn home_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::ROOT).await.assert_status_ok();
    }

    #[tokio::test]
    async fn pages_require_log_in() {
        let server = get_test_server();

        for page in [
            endpoints::BUDGET_SUMMARY,
            endpoints::EXPENSES_LIST,
            endpoints::INCOMES_PERIOD,
            endpoints::CHARTS,
            endpoints::CATEGORIES,
            endpoints::REPORT,
            endpoints::CSV_REPORT,
        ] {
            let response = server.get(page).await;

            response.assert_status(StatusCode::FOUND);
            assert!(
                response.header("location").to_str().unwrap().starts_with(endpoints::LOG_IN),
                "{page} should redirect to the log-in page"
            );
        }
    }

    #[tokio::test]
    async fn partials_redirect_plain_requests_with_found() {
        let server = get_test_server();

        let response = server.get(endpoints::FETCH_EXPENSES).await;

        response.assert_status(StatusCode::FOUND);
        assert!(
            response
                .header("location")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN)
        );

        let response = server.post(endpoints::ADD_EXPENSE).await;

        response.assert_status(StatusCode::FOUND);
    }

    #[tokio::test]
    async fn partials_redirect_htmx_requests_with_hx_redirect() {
        let server = get_test_server();

        let response = server
            .get(endpoints::FETCH_EXPENSES)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", "http://localhost:3000/expenses_list/")
            .await;

        response.assert_status_ok();
        assert!(response.maybe_header("location").is_none());
        assert!(
            response
                .header("hx-redirect")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN)
        );
    }

    #[tokio::test]
    async fn logged_in_user_can_view_pages() {
        let server = get_test_server();
        let token = log_in(&server).await;

        for page in [
            endpoints::ROOT,
            endpoints::BUDGET_SUMMARY,
            endpoints::EXPENSES_LIST,
            endpoints::ADD_INCOME,
            endpoints::EXPENSES_PERIOD,
            endpoints::CHARTS,
            endpoints::EXPENSE_CATEGORIES,
            endpoints::ADD_CATEGORY,
            endpoints::REPORT,
        ] {
            server
                .get(page)
                .add_cookie(token.clone())
                .await
                .assert_status_ok();
        }
    }

    #[tokio::test]
    async fn chart_data_needs_a_year() {
        let server = get_test_server();
        let token = log_in(&server).await;

        let missing = server
            .get(endpoints::CHART_DATA)
            .add_cookie(token.clone())
            .await;
        let present = server
            .get(endpoints::CHART_DATA)
            .add_query_param("year", 2024)
            .add_cookie(token)
            .await;

        missing.assert_status(StatusCode::BAD_REQUEST);
        present.assert_status_ok();
        assert_eq!(present.json::<Vec<Value>>().len(), 12);
    }

    #[tokio::test]
    async fn created_expense_shows_up_in_csv_report() {
        let server = get_test_server();
        let token = log_in(&server).await;

        server
            .post(endpoints::ADD_EXPENSE)
            .form(&[
                ("amount", "12.50"),
                ("category", "Food"),
                ("date", "2024-01-15"),
                ("comment", ""),
            ])
            .add_cookie(token.clone())
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let report = server
            .get(endpoints::CSV_REPORT)
            .add_cookie(token)
            .await;

        report.assert_status_ok();
        assert_eq!(
            report.text(),
            "Section,Date,Category,Amount,Comment\nExpense,2024-01-15,Food,12.50,\n"
        );
    }

    #[tokio::test]
    async fn deleting_unknown_category_is_not_found() {
        let server = get_test_server();
        let token = log_in(&server).await;

        server
            .post(&format_endpoint(endpoints::DELETE_CATEGORY, 999))
            .add_cookie(token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn log_out_works_with_post() {
        let server = get_test_server();

        let response = server.post(endpoints::LOG_OUT).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let server = get_test_server();

        server
            .get("/not/a/real/page")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
