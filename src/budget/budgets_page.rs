//! The budgets page: this month's budgets with their usage, and the form
//! for setting one.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserContext,
    budget::{BudgetStatus, get_budget_statuses, upsert_budget},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        dollar_input_styles, format_currency,
    },
    navigation::NavBar,
    session::UserId,
    timezone::today_in,
    transaction::{TransactionCategory, TransactionKind, get_categories, get_visible_category},
};

/// The state needed for the budgets page and endpoint.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    /// The database connection for reading and writing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating or replacing a monthly budget.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetForm {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub amount: String,
}

struct ValidatedBudget {
    category_id: i64,
    year: i32,
    month: u8,
    amount: f64,
}

impl BudgetForm {
    fn validate(
        &self,
        user_id: UserId,
        connection: &Connection,
    ) -> Result<ValidatedBudget, Vec<String>> {
        let mut errors = Vec::new();

        let category_id = self.category_id.parse::<i64>().unwrap_or(0);
        let category_is_valid = category_id > 0
            && get_visible_category(category_id, user_id, connection)
                .is_ok_and(|category| category.kind == TransactionKind::Expense);
        if !category_is_valid {
            errors.push("Please select a valid expense category.".to_owned());
        }

        let year = self.year.parse::<i32>().unwrap_or(0);
        if !(2000..=2100).contains(&year) {
            errors.push("Please enter a valid year.".to_owned());
        }

        let month = self.month.parse::<u8>().unwrap_or(0);
        if !(1..=12).contains(&month) {
            errors.push("Please select a valid month.".to_owned());
        }

        let amount = self.amount.trim().parse::<f64>().unwrap_or(0.0);
        if amount <= 0.0 {
            errors.push("Please enter a budget amount greater than 0.".to_owned());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedBudget {
            category_id,
            year,
            month,
            amount,
        })
    }
}

/// Display this month's budgets and the form for setting one.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = today_in(&state.local_timezone)?;
    let statuses = get_budget_statuses(user.user_id, today, &connection)?;
    let categories = get_categories(TransactionKind::Expense, user.user_id, &connection)?;

    let form = BudgetForm {
        year: today.year().to_string(),
        month: u8::from(today.month()).to_string(),
        ..Default::default()
    };

    Ok(budgets_view(&statuses, &categories, &form, "").into_response())
}

/// A route handler for creating or replacing a monthly budget, redirects to
/// the budgets view on success.
pub async fn upsert_budget_endpoint(
    State(state): State<BudgetsPageState>,
    user: UserContext,
    Form(form): Form<BudgetForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let validated = match form.validate(user.user_id, &connection) {
        Ok(validated) => validated,
        Err(errors) => {
            let categories =
                match get_categories(TransactionKind::Expense, user.user_id, &connection) {
                    Ok(categories) => categories,
                    Err(error) => return error.into_alert_response(),
                };

            return budget_form_view(&categories, &form, &errors.join(" ")).into_response();
        }
    };

    match upsert_budget(
        user.user_id,
        validated.category_id,
        validated.year,
        validated.month,
        validated.amount,
        &connection,
    ) {
        Ok(()) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not save budget with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

fn budgets_view(
    statuses: &[BudgetStatus],
    categories: &[TransactionCategory],
    form: &BudgetForm,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg grid grid-cols-1 lg:grid-cols-3 gap-6"
            {
                section class="lg:col-span-2"
                {
                    h2 class="text-xl font-semibold mb-4" { "This Month's Budgets" }

                    @if statuses.is_empty() {
                        p class="text-gray-600 dark:text-gray-400"
                        {
                            "No budgets set for this month. Budgets warn you when a \
                            category's spending goes over its ceiling."
                        }
                    } @else {
                        div class="relative overflow-x-auto rounded shadow-md"
                        {
                            table class="w-full text-sm text-left text-gray-600 dark:text-gray-400"
                            {
                                thead class=(TABLE_HEADER_STYLE)
                                {
                                    tr
                                    {
                                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                        th scope="col" class=(TABLE_CELL_STYLE) { "Budget" }
                                        th scope="col" class=(TABLE_CELL_STYLE) { "Spent" }
                                        th scope="col" class=(TABLE_CELL_STYLE) { "Usage" }
                                    }
                                }

                                tbody
                                {
                                    @for status in statuses {
                                        tr class=(TABLE_ROW_STYLE)
                                        {
                                            td class=(TABLE_CELL_STYLE) { (status.category_name) }
                                            td class=(TABLE_CELL_STYLE)
                                            {
                                                (format_currency(status.budget_amount))
                                            }
                                            td class=(TABLE_CELL_STYLE)
                                            {
                                                (format_currency(status.spent_amount))
                                            }
                                            td class=(TABLE_CELL_STYLE)
                                            {
                                                @if status.usage_percentage > 100.0 {
                                                    span class="text-red-600 dark:text-red-400 font-semibold"
                                                    {
                                                        (status.usage_percentage) "%"
                                                    }
                                                } @else {
                                                    (status.usage_percentage) "%"
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                section
                {
                    h2 class="text-xl font-semibold mb-4" { "Set a Budget" }
                    (budget_form_view(categories, form, error_message))
                }
            }
        }
    };

    base("Budgets", &[dollar_input_styles()], &content)
}

fn budget_form_view(
    categories: &[TransactionCategory],
    form: &BudgetForm,
    error_message: &str,
) -> Markup {
    const MONTH_NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    html! {
        form
            hx-post=(endpoints::POST_BUDGET)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="category_id"
                    name="category_id"
                    required
                    class=(FORM_SELECT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in categories {
                        @if form.category_id == category.id.to_string() {
                            option value=(category.id) selected { (category.name) }
                        } @else {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                    select
                        id="month"
                        name="month"
                        required
                        class=(FORM_SELECT_STYLE)
                    {
                        @for (index, name) in MONTH_NAMES.iter().enumerate() {
                            @let number = (index + 1).to_string();

                            @if form.month == number {
                                option value=(number) selected { (name) }
                            } @else {
                                option value=(number) { (name) }
                            }
                        }
                    }
                }

                div
                {
                    label for="year" class=(FORM_LABEL_STYLE) { "Year" }

                    input
                        id="year"
                        name="year"
                        type="number"
                        min="2000"
                        max="2100"
                        value=(form.year)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Monthly Budget" }

                div class="input-wrapper w-full"
                {
                    input
                        id="amount"
                        name="amount"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=(form.amount)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Budget" }
        }
    }
}
