//! Defines the endpoint for creating a new wallet.

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
    AppState, Error, UserContext, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    session::UserId,
    wallet::{NewWallet, WalletType, create_wallet, get_wallet_types},
};

const DEFAULT_COLOR_CODE: &str = "#3498db";

/// The state needed to create a wallet.
#[derive(Debug, Clone)]
pub struct CreateWalletState {
    /// The database connection for managing wallets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateWalletState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a wallet.
///
/// Fields arrive as strings so invalid input can be redisplayed verbatim
/// alongside the validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletForm {
    #[serde(default)]
    pub wallet_name: String,
    #[serde(default)]
    pub wallet_type_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub initial_balance: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub card_last_four: String,
    #[serde(default)]
    pub credit_limit: String,
    #[serde(default)]
    pub color_code: String,
    /// Present ("on") when the checkbox is ticked, absent otherwise.
    #[serde(default)]
    pub is_default: Option<String>,
}

impl WalletForm {
    /// Check the form and convert it into the typed wallet fields.
    ///
    /// All problems are collected so the user sees every issue at once.
    fn validate(&self, user_id: UserId, wallet_types: &[WalletType]) -> Result<NewWallet, Vec<String>> {
        let mut errors = Vec::new();

        let wallet_name = self.wallet_name.trim().to_owned();
        if wallet_name.is_empty() {
            errors.push("Wallet name is required.".to_owned());
        } else if wallet_name.len() > 100 {
            errors.push("Wallet name must be less than 100 characters.".to_owned());
        }

        let wallet_type_id = self.wallet_type_id.parse::<i64>().unwrap_or(0);
        if !wallet_types.iter().any(|t| t.id == wallet_type_id) {
            errors.push("Please select a wallet type.".to_owned());
        }

        let initial_balance = if self.initial_balance.trim().is_empty() {
            Ok(0.0)
        } else {
            self.initial_balance.trim().parse::<f64>()
        };
        let initial_balance = match initial_balance {
            Ok(balance) if balance >= 0.0 => balance,
            _ => {
                errors.push("Initial balance must be zero or a positive amount.".to_owned());
                0.0
            }
        };

        let credit_limit = if self.credit_limit.trim().is_empty() {
            Ok(0.0)
        } else {
            self.credit_limit.trim().parse::<f64>()
        };
        let credit_limit = match credit_limit {
            Ok(limit) if limit >= 0.0 => limit,
            _ => {
                errors.push("Credit limit must be zero or a positive amount.".to_owned());
                0.0
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let optional = |value: &str| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        };

        // Keep at most the last four digits, the way card numbers are shown.
        let card_last_four = optional(&self.card_last_four).map(|digits| {
            digits
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<String>()
        });

        let color_code = if self.color_code.trim().is_empty() {
            DEFAULT_COLOR_CODE.to_owned()
        } else {
            self.color_code.trim().to_owned()
        };

        Ok(NewWallet {
            user_id,
            wallet_type_id,
            wallet_name,
            description: self.description.trim().to_owned(),
            initial_balance,
            account_number: optional(&self.account_number),
            bank_name: optional(&self.bank_name),
            card_last_four,
            credit_limit,
            color_code,
            is_default: self.is_default.is_some(),
        })
    }
}

/// A route handler for creating a new wallet, redirects to the wallets view
/// on success.
///
/// On validation failure the form is re-rendered with the submitted values
/// and the collected error messages; nothing is written.
pub async fn create_wallet_endpoint(
    State(state): State<CreateWalletState>,
    user: UserContext,
    Form(form): Form<WalletForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let wallet_types = match get_wallet_types(&connection) {
        Ok(types) => types,
        Err(error) => {
            tracing::error!("could not load wallet types: {error}");
            return error.into_alert_response();
        }
    };

    let new_wallet = match form.validate(user.user_id, &wallet_types) {
        Ok(new_wallet) => new_wallet,
        Err(errors) => {
            return new_wallet_form_view(&form, &wallet_types, &errors.join(" "))
                .into_response();
        }
    };

    // A default wallet clears the flag on the other wallets, so the whole
    // creation runs in one SQL transaction: a failed insert must not leave
    // the user without a default.
    let result: Result<_, Error> = (|| {
        let sql_transaction = connection.transaction()?;
        let wallet = create_wallet(&new_wallet, &sql_transaction)?;
        sql_transaction.commit()?;

        Ok(wallet)
    })();

    match result {
        Ok(_) => (
            HxRedirect(endpoints::WALLETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateWalletName(_)) => new_wallet_form_view(
            &form,
            &wallet_types,
            "A wallet with this name already exists.",
        )
        .into_response(),
        Err(error) => {
            tracing::error!("could not create wallet with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

pub(super) fn new_wallet_form_view(
    form: &WalletForm,
    wallet_types: &[WalletType],
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_WALLET)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="wallet_name" class=(FORM_LABEL_STYLE) { "Wallet Name" }

                input
                    id="wallet_name"
                    type="text"
                    name="wallet_name"
                    placeholder="Everyday Spending"
                    value=(form.wallet_name)
                    maxlength="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="wallet_type_id" class=(FORM_LABEL_STYLE) { "Wallet Type" }

                select
                    id="wallet_type_id"
                    name="wallet_type_id"
                    required
                    class=(FORM_SELECT_STYLE)
                {
                    option value="" { "Select a type" }

                    @for wallet_type in wallet_types {
                        @if form.wallet_type_id == wallet_type.id.to_string() {
                            option value=(wallet_type.id) selected { (wallet_type.type_name) }
                        } @else {
                            option value=(wallet_type.id) { (wallet_type.type_name) }
                        }
                    }
                }
            }

            div
            {
                label for="initial_balance" class=(FORM_LABEL_STYLE) { "Initial Balance" }

                div class="input-wrapper w-full"
                {
                    input
                        id="initial_balance"
                        type="number"
                        name="initial_balance"
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        value=(form.initial_balance)
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Optional description"
                    value=(form.description)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            details
            {
                summary class="text-sm text-gray-600 dark:text-gray-400 cursor-pointer mb-2"
                {
                    "Bank and card details"
                }

                div class="space-y-4"
                {
                    div
                    {
                        label for="bank_name" class=(FORM_LABEL_STYLE) { "Bank Name" }

                        input
                            id="bank_name"
                            type="text"
                            name="bank_name"
                            value=(form.bank_name)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="account_number" class=(FORM_LABEL_STYLE) { "Account Number" }

                        input
                            id="account_number"
                            type="text"
                            name="account_number"
                            value=(form.account_number)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="card_last_four" class=(FORM_LABEL_STYLE) { "Card Last Four Digits" }

                        input
                            id="card_last_four"
                            type="text"
                            name="card_last_four"
                            maxlength="4"
                            value=(form.card_last_four)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="credit_limit" class=(FORM_LABEL_STYLE) { "Credit Limit" }

                        div class="input-wrapper w-full"
                        {
                            input
                                id="credit_limit"
                                type="number"
                                name="credit_limit"
                                step="0.01"
                                min="0"
                                value=(form.credit_limit)
                                class=(FORM_TEXT_INPUT_STYLE);
                        }
                    }

                    div
                    {
                        label for="color_code" class=(FORM_LABEL_STYLE) { "Colour" }

                        input
                            id="color_code"
                            type="color"
                            name="color_code"
                            value=(if form.color_code.is_empty() { DEFAULT_COLOR_CODE } else { &form.color_code })
                            class="h-10 w-20 cursor-pointer rounded border border-gray-300 dark:border-gray-600";
                    }
                }
            }

            div class="flex items-center gap-2"
            {
                input
                    id="is_default"
                    type="checkbox"
                    name="is_default"
                    checked[form.is_default.is_some()]
                    class=(FORM_CHECKBOX_STYLE);

                label for="is_default" class=(FORM_LABEL_STYLE) { "Make this my default wallet" }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Wallet" }
        }
    }
}
