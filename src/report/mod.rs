//! Downloadable reports of every expense and income a user has recorded.
//!
//! The reports list the raw rows, incomes first, without any aggregation.

mod csv;
mod pdf;

use axum::{
    Extension,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    amount::Amount,
    app_state::DatabaseState,
    auth::UserID,
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{TransactionKind, get_transactions_chronological},
};

/// The column names shared by both report formats.
pub(crate) const REPORT_COLUMNS: [&str; 5] = ["Section", "Date", "Category", "Amount", "Comment"];

/// One expense or income in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub section: TransactionKind,
    pub date: Date,
    pub category: String,
    pub amount: Amount,
    pub comment: Option<String>,
}

/// All of the user's incomes followed by all of their expenses.
///
/// Each section is ordered by date, then by the order the rows were recorded.
pub fn get_report_rows(user_id: UserID, connection: &Connection) -> Result<Vec<ReportRow>, Error> {
    let mut rows = Vec::new();

    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        let transactions = get_transactions_chronological(kind, user_id, connection)?;

        rows.extend(transactions.into_iter().map(|transaction| ReportRow {
            section: kind,
            date: transaction.date,
            category: transaction.category_name,
            amount: transaction.amount,
            comment: transaction.comment,
        }));
    }

    Ok(rows)
}

fn load_report_rows(state: &DatabaseState, user_id: UserID) -> Result<Vec<ReportRow>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_report_rows(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get report rows: {error}"))
}

/// Render the page linking to the report downloads.
pub async fn get_report_page(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let row_count = load_report_rows(&state, user_id)?.len();
    let nav_bar = NavBar::new(endpoints::REPORT).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { "Report" }

                p data-row-count=(row_count)
                {
                    @if row_count == 1 {
                        "The report has 1 row."
                    } @else {
                        "The report has " (row_count) " rows."
                    }
                }

                div class="flex gap-4"
                {
                    a href=(endpoints::CSV_REPORT) download class=(BUTTON_SECONDARY_STYLE) { "Download CSV" }
                    a href=(endpoints::PDF_REPORT) download class=(BUTTON_SECONDARY_STYLE) { "Download PDF" }
                }
            }
        }
    };

    Ok(base("Report", &[], &content).into_response())
}

/// Download the report as CSV.
pub async fn get_csv_report(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let rows = load_report_rows(&state, user_id)?;
    let body = csv::write_csv(&rows)
        .inspect_err(|error| tracing::error!("Could not write CSV report: {error}"))?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"report.csv\""),
        ],
        body,
    )
        .into_response())
}

/// Download the report as PDF.
pub async fn get_pdf_report(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let rows = load_report_rows(&state, user_id)?;
    let body = pdf::render_pdf("Financial Report", &rows)
        .inspect_err(|error| tracing::error!("Could not render PDF report: {error}"))?;

    Ok((
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
        ],
        body,
    )
        .into_response())
}
