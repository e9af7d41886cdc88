//! The savings goals page: goals with progress bars, the new goal form,
//! and the contribute endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, UserContext,
    alert::Alert,
    endpoints,
    endpoints::format_endpoint,
    goal::{GoalId, NewGoal, SavingsGoal, add_contribution, create_goal, get_goals},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, dollar_input_styles, format_currency,
    },
    navigation::NavBar,
    session::UserId,
};

/// The state needed for the goals page and endpoints.
#[derive(Debug, Clone)]
pub struct GoalsPageState {
    /// The database connection for reading and writing goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a savings goal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_amount: String,
    #[serde(default)]
    pub deadline: String,
}

impl GoalForm {
    fn validate(&self, user_id: UserId) -> Result<NewGoal, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.push("Please enter a goal name.".to_owned());
        }

        let target_amount = self.target_amount.trim().parse::<f64>().unwrap_or(0.0);
        if target_amount <= 0.0 {
            errors.push("Please enter a target amount greater than 0.".to_owned());
        }

        let date_format = format_description!("[year]-[month]-[day]");
        let deadline = if self.deadline.trim().is_empty() {
            None
        } else {
            match Date::parse(self.deadline.trim(), &date_format) {
                Ok(deadline) => Some(deadline),
                Err(_) => {
                    errors.push("Please enter a valid deadline.".to_owned());
                    None
                }
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewGoal {
            user_id,
            name,
            target_amount,
            deadline,
        })
    }
}

/// The form data for adding money to a goal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContributionForm {
    #[serde(default)]
    pub amount: String,
}

/// Display the user's savings goals and the new goal form.
pub async fn get_goals_page(
    State(state): State<GoalsPageState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let goals = get_goals(user.user_id, &connection)?;

    Ok(goals_view(&goals, &Default::default(), "").into_response())
}

/// A route handler for creating a savings goal, redirects to the goals view
/// on success.
pub async fn create_goal_endpoint(
    State(state): State<GoalsPageState>,
    user: UserContext,
    Form(form): Form<GoalForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_goal = match form.validate(user.user_id) {
        Ok(new_goal) => new_goal,
        Err(errors) => {
            return new_goal_form_view(&form, &errors.join(" ")).into_response();
        }
    };

    match create_goal(&new_goal, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::GOALS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create goal with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for adding money to a savings goal, redirects to the
/// goals view on success.
pub async fn contribute_goal_endpoint(
    State(state): State<GoalsPageState>,
    user: UserContext,
    Path(goal_id): Path<GoalId>,
    Form(form): Form<ContributionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let amount = form.amount.trim().parse::<f64>().unwrap_or(0.0);
    if amount <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Alert::error(
                "Invalid contribution",
                "Please enter an amount greater than 0.",
            )
            .into_html(),
        )
            .into_response();
    }

    match add_contribution(goal_id, user.user_id, amount, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::GOALS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

fn goals_view(goals: &[SavingsGoal], form: &GoalForm, error_message: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::GOALS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg grid grid-cols-1 lg:grid-cols-3 gap-6"
            {
                section class="lg:col-span-2"
                {
                    h2 class="text-xl font-semibold mb-4" { "Savings Goals" }

                    @if goals.is_empty() {
                        p class="text-gray-600 dark:text-gray-400"
                        {
                            "No savings goals yet. Set a target and track your progress \
                            towards it."
                        }
                    } @else {
                        div class="grid grid-cols-1 sm:grid-cols-2 gap-4"
                        {
                            @for goal in goals {
                                (goal_card(goal))
                            }
                        }
                    }
                }

                section
                {
                    h2 class="text-xl font-semibold mb-4" { "New Goal" }
                    (new_goal_form_view(form, error_message))
                }
            }
        }
    };

    base("Goals", &[dollar_input_styles()], &content)
}

fn goal_card(goal: &SavingsGoal) -> Markup {
    let progress = if goal.target_amount > 0.0 {
        (goal.current_amount / goal.target_amount * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let contribute_url = format_endpoint(endpoints::CONTRIBUTE_GOAL, goal.id);

    html! {
        div class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h3 class="text-lg font-semibold truncate" title=(goal.name) { (goal.name) }

                @if goal.is_completed {
                    span class="text-xs font-semibold text-green-700 dark:text-green-300"
                    {
                        "Completed"
                    }
                }
            }

            p class="text-sm text-gray-600 dark:text-gray-400 mb-2"
            {
                (format_currency(goal.current_amount))
                " of "
                (format_currency(goal.target_amount))

                @if let Some(deadline) = goal.deadline {
                    " by " (deadline)
                }
            }

            div
                class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2.5 mb-3"
                role="progressbar"
                aria-valuenow=(format!("{progress:.0}"))
                aria-valuemin="0"
                aria-valuemax="100"
            {
                @if progress > 0.0 {
                    div
                        class="bg-blue-600 dark:bg-blue-500 h-2.5 rounded-full"
                        style=(format!("width: {progress:.1}%"))
                    {}
                }
            }

            @if !goal.is_completed {
                form
                    hx-post=(contribute_url)
                    hx-target-error="#alert-container"
                    class="flex gap-2"
                {
                    div class="input-wrapper flex-1"
                    {
                        input
                            name="amount"
                            type="number"
                            step="0.01"
                            min="0.01"
                            placeholder="0.00"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button
                        type="submit"
                        class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600 \
                        hover:dark:bg-blue-700 text-white rounded text-sm"
                    {
                        "Add"
                    }
                }
            }
        }
    }
}

fn new_goal_form_view(form: &GoalForm, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_GOAL)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Goal Name" }

                input
                    id="name"
                    name="name"
                    type="text"
                    placeholder="Emergency fund"
                    value=(form.name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="target_amount" class=(FORM_LABEL_STYLE) { "Target Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        id="target_amount"
                        name="target_amount"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=(form.target_amount)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="deadline" class=(FORM_LABEL_STYLE) { "Deadline" }

                input
                    id="deadline"
                    name="deadline"
                    type="date"
                    value=(form.deadline)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Goal" }
        }
    }
}
