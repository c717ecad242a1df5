//! The monthly income and expense chart and the JSON data behind it.
//!
//! The page renders the chart for one year with ECharts options built by
//! `charming`. Picking another year fetches that year's monthly summaries from
//! the data endpoint and swaps them into the chart.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::Bar,
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::{
    Error,
    aggregation::{MonthlySummary, monthly_summary, years_with_transactions},
    app_state::DatabaseState,
    auth::UserID,
    endpoints,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::local_today,
};

const CHART_ID: &str = "monthly-chart";
const YEAR_SELECT_ID: &str = "chart-year";
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// The query string for the charts page and the chart data.
#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<String>,
}

/// Parse a four digit calendar year.
fn parse_year(raw: Option<&str>) -> Result<i32, String> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| "the query parameter \"year\" is required".to_owned())?;

    match raw.parse::<i32>() {
        Ok(year) if (MIN_YEAR..=MAX_YEAR).contains(&year) => Ok(year),
        _ => Err(format!(
            "\"{raw}\" is not a valid year, expected a number between {MIN_YEAR} and {MAX_YEAR}"
        )),
    }
}

/// The twelve monthly summaries for the year in the query string as JSON.
///
/// Responds with 400 Bad Request and an `error` message if the year is
/// missing or invalid.
pub async fn get_chart_data(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearQuery>,
) -> Response {
    let year = match parse_year(query.year.as_deref()) {
        Ok(year) => year,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": Error::DatabaseLockError.to_string() })),
            )
                .into_response();
        }
    };

    match monthly_summary(user_id, year, &connection) {
        Ok(months) => Json(months).into_response(),
        Err(error) => {
            tracing::error!("Could not summarise {year} for user {user_id}: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "could not load the chart data" })),
            )
                .into_response()
        }
    }
}

/// Render the chart for the year in the query string, or the current year.
pub async fn get_charts_page(
    State(state): State<DatabaseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearQuery>,
) -> Result<Response, Error> {
    let current_year = local_today(&state.local_timezone)?.year();
    let year = parse_year(query.year.as_deref()).unwrap_or(current_year);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let months = monthly_summary(user_id, year, &connection)
        .inspect_err(|error| tracing::error!("Could not summarise {year}: {error}"))?;

    let mut years = years_with_transactions(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get years with transactions: {error}"))?;
    for required_year in [current_year, year] {
        if !years.contains(&required_year) {
            years.push(required_year);
        }
    }
    years.sort_unstable_by(|a, b| b.cmp(a));

    let options = monthly_chart(year, &months).to_string();
    let nav_bar = NavBar::new(endpoints::CHARTS).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Charts" }
                    (year_select(&years, year))
                }

                div id=(CHART_ID) class="min-h-[420px] w-full rounded dark:bg-gray-100" {}
            }
        }
    };

    let head_elements = [
        HeadElement::ScriptLink(
            "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js".to_owned(),
        ),
        chart_script(&options),
    ];

    Ok(base("Charts", &head_elements, &content).into_response())
}

fn year_select(years: &[i32], selected_year: i32) -> Markup {
    html! {
        div
        {
            label for=(YEAR_SELECT_ID) class=(FORM_LABEL_STYLE) { "Year" }

            select id=(YEAR_SELECT_ID) name="year" class=(FORM_TEXT_INPUT_STYLE)
            {
                @for year in years {
                    option value=(year) selected[*year == selected_year] { (year) }
                }
            }
        }
    }
}

/// A bar chart with one group of income, expense and balance bars per month.
fn monthly_chart(year: i32, months: &[MonthlySummary]) -> Chart {
    let values = |select: fn(&MonthlySummary) -> rust_decimal::Decimal| {
        months
            .iter()
            .map(|month| select(month).to_f64().unwrap_or_default())
            .collect::<Vec<f64>>()
    };

    Chart::new()
        .title(Title::new().text("Income and expenses").subtext(year.to_string()))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .legend(Legend::new().top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(80)
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(MONTH_LABELS.to_vec()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Income").data(values(|month| month.income)))
        .series(Bar::new().name("Expenses").data(values(|month| month.expense)))
        .series(Bar::new().name("Balance").data(values(|month| month.balance)))
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Initialise the chart and reload its data when another year is picked.
fn chart_script(options: &str) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chart = echarts.init(document.getElementById("{CHART_ID}"));
            chart.setOption({options});
            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();

            document.getElementById("{YEAR_SELECT_ID}").addEventListener('change', async (event) => {{
                const year = event.target.value;
                const response = await fetch(`{data_endpoint}?year=${{encodeURIComponent(year)}}`);
                if (!response.ok) {{
                    console.error('Could not load chart data', await response.text());
                    return;
                }}
                const months = await response.json();
                chart.setOption({{
                    title: {{ subtext: year }},
                    series: [
                        {{ data: months.map((month) => month.income) }},
                        {{ data: months.map((month) => month.expense) }},
                        {{ data: months.map((month) => month.balance) }},
                    ],
                }});
                history.replaceState(null, '', `{charts_endpoint}?year=${{encodeURIComponent(year)}}`);
            }});
        }});"#,
        data_endpoint = endpoints::CHART_DATA,
        charts_endpoint = endpoints::CHARTS,
    );

    HeadElement::ScriptSource(PreEscaped(script))
}
