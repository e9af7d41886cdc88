//! The wallet transfer page: the form plus the user's recent transfers.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserContext,
    alert::Alert,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles,
        format_currency, link,
    },
    navigation::NavBar,
    timezone::today_in,
    transfer::{RecentTransfer, create_endpoint::TransferForm, get_recent_transfers},
    wallet::{Wallet, get_active_wallets},
};

/// How many recent transfers the page lists.
pub(super) const RECENT_TRANSFERS_LIMIT: u64 = 10;

/// The state needed for the transfer page.
#[derive(Debug, Clone)]
pub struct TransferPageState {
    /// The database connection for reading wallets and transfers.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransferPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the transfer form and the user's recent transfers.
pub async fn get_transfer_page(
    State(state): State<TransferPageState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = today_in(&state.local_timezone)?;
    let wallets = get_active_wallets(user.user_id, &connection)?;
    let transfers = get_recent_transfers(user.user_id, RECENT_TRANSFERS_LIMIT, &connection)?;

    let form = TransferForm {
        date: today.to_string(),
        fee: "0.00".to_owned(),
        ..Default::default()
    };

    Ok(transfer_page_view(&wallets, &transfers, &form).into_response())
}

pub(super) fn transfer_page_view(
    wallets: &[Wallet],
    transfers: &[RecentTransfer],
    form: &TransferForm,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFER_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg grid grid-cols-1 lg:grid-cols-2 gap-6"
            {
                section
                {
                    h2 class="text-xl font-semibold mb-4" { "Transfer Between Wallets" }

                    @if wallets.len() < 2 {
                        div class=(CARD_STYLE)
                        {
                            p class="mb-2 font-medium" { "Need more wallets" }
                            p class="text-sm text-gray-600 dark:text-gray-400 mb-4"
                            {
                                "You need at least 2 active wallets to make transfers."
                            }
                            (link(endpoints::WALLETS_VIEW, "Add another wallet"))
                        }
                    } @else {
                        div id="transfer-form-container"
                        {
                            (transfer_form_view(wallets, form, &[], ""))
                        }
                    }
                }

                (recent_transfers_panel(transfers))
            }
        }
    };

    base("Transfer", &[dollar_input_styles()], &content)
}

/// Render the transfer form fragment.
///
/// `banners` are shown above the form; `error_message` is shown inside the
/// form next to the submit button.
pub(super) fn transfer_form_view(
    wallets: &[Wallet],
    form: &TransferForm,
    banners: &[Alert],
    error_message: &str,
) -> Markup {
    let wallet_select = |field_id: &str, label: &str, selected: &str, placeholder: &str| -> Markup {
        html! {
            div
            {
                label for=(field_id) class=(FORM_LABEL_STYLE) { (label) }

                select
                    id=(field_id)
                    name=(field_id)
                    required
                    class=(FORM_SELECT_STYLE)
                {
                    option value="" { (placeholder) }

                    @for wallet in wallets {
                        @if selected == wallet.id.to_string() {
                            option value=(wallet.id) selected
                            {
                                (wallet.wallet_name) " (" (format_currency(wallet.balance)) ")"
                            }
                        } @else {
                            option value=(wallet.id)
                            {
                                (wallet.wallet_name) " (" (format_currency(wallet.balance)) ")"
                            }
                        }
                    }
                }
            }
        }
    };

    html! {
        @for banner in banners {
            (banner.clone().into_html())
        }

        form
            hx-post=(endpoints::POST_TRANSFER)
            hx-target="#transfer-form-container"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (wallet_select("from_wallet_id", "From Wallet", &form.from_wallet_id, "Select source wallet"))
            (wallet_select("to_wallet_id", "To Wallet", &form.to_wallet_id, "Select destination wallet"))

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Transfer Amount" }

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

                p class="text-xs text-gray-600 dark:text-gray-400 mt-1"
                {
                    "Amount to transfer (excluding fees)"
                }
            }

            div
            {
                label for="fee" class=(FORM_LABEL_STYLE) { "Transfer Fee" }

                div class="input-wrapper w-full"
                {
                    input
                        id="fee"
                        name="fee"
                        type="number"
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        value=(form.fee)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                p class="text-xs text-gray-600 dark:text-gray-400 mt-1"
                {
                    "Any fee charged for this transfer (optional)"
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Transfer Date" }

                input
                    id="date"
                    name="date"
                    type="date"
                    value=(form.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    name="description"
                    type="text"
                    placeholder="Optional description for this transfer"
                    value=(form.description)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Execute Transfer" }
        }
    }
}

/// Render the recent transfers panel.
///
/// The panel carries a stable element ID so endpoint responses can refresh
/// it with an out-of-band swap.
pub(super) fn recent_transfers_panel(transfers: &[RecentTransfer]) -> Markup {
    html! {
        section id="recent-transfers" class=(CARD_STYLE)
        {
            h3 class="text-lg font-semibold mb-3" { "Recent Transfers" }

            @if transfers.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No recent transfers" }
            } @else {
                ul class="space-y-3"
                {
                    @for transfer in transfers {
                        li class="text-sm"
                        {
                            div class="flex justify-between items-baseline"
                            {
                                span class="font-medium"
                                {
                                    @if transfer.description.is_empty() {
                                        "Wallet Transfer"
                                    } @else {
                                        (transfer.description)
                                    }
                                }

                                span { (format_currency(transfer.amount)) }
                            }

                            div class="text-gray-600 dark:text-gray-400"
                            {
                                span style=(format!("color: {};", transfer.from_color))
                                {
                                    (transfer.from_wallet_name)
                                }
                                " → "
                                span style=(format!("color: {};", transfer.to_color))
                                {
                                    (transfer.to_wallet_name)
                                }
                                " · " (transfer.date)

                                @if transfer.fee > 0.0 {
                                    " · fee " (format_currency(transfer.fee))
                                }
                            }
                        }
                    }
                }

                div class="mt-3"
                {
                    a
                        href=(endpoints::TRANSACTIONS_VIEW)
                        class=(LINK_STYLE)
                    {
                        "View all transactions"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod transfer_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;

    use crate::{
        UserContext,
        db::initialize,
        test_utils::{assert_valid_html, must_get_form, parse_html_document},
        wallet::{NewWallet, create_wallet},
    };

    use super::{TransferPageState, get_transfer_page};

    fn get_test_state() -> TransferPageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransferPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn test_user() -> UserContext {
        UserContext { user_id: 1 }
    }

    fn create_test_wallet(state: &TransferPageState, name: &str) {
        let connection = state.db_connection.lock().unwrap();
        create_wallet(
            &NewWallet {
                user_id: 1,
                wallet_type_id: 1,
                wallet_name: name.to_owned(),
                description: String::new(),
                initial_balance: 100.0,
                account_number: None,
                bank_name: None,
                card_last_four: None,
                credit_limit: 0.0,
                color_code: "#3498db".to_owned(),
                is_default: false,
            },
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn suggests_creating_wallets_when_fewer_than_two() {
        let state = get_test_state();
        create_test_wallet(&state, "Only One");

        let response = get_transfer_page(State(state), test_user()).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(html.html().contains("Need more wallets"));
    }

    #[tokio::test]
    async fn renders_form_with_two_wallets() {
        let state = get_test_state();
        create_test_wallet(&state, "First");
        create_test_wallet(&state, "Second");

        let response = get_transfer_page(State(state), test_user()).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        must_get_form(&html);

        let text = html.html();
        assert!(text.contains("First"));
        assert!(text.contains("Second"));
        assert!(text.contains("No recent transfers"));
    }
}
