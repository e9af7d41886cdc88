//! The wallets page: every wallet the user owns plus the new wallet form.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserContext, endpoints,
    endpoints::format_endpoint,
    html::{
        BUTTON_DELETE_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency,
    },
    navigation::NavBar,
    wallet::{
        WalletSummary, WalletType, create_endpoint::new_wallet_form_view, get_wallet_summaries,
        get_wallet_types,
    },
};

/// The state needed for the wallets page.
#[derive(Debug, Clone)]
pub struct WalletsPageState {
    /// The database connection for reading wallets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WalletsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the user's wallets and the form for adding another one.
pub async fn get_wallets_page(
    State(state): State<WalletsPageState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallets = get_wallet_summaries(user.user_id, &connection)?;
    let wallet_types = get_wallet_types(&connection)?;

    Ok(wallets_view(&wallets, &wallet_types).into_response())
}

fn wallets_view(wallets: &[WalletSummary], wallet_types: &[WalletType]) -> Markup {
    let nav_bar = NavBar::new(endpoints::WALLETS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg grid grid-cols-1 lg:grid-cols-3 gap-6"
            {
                section class="lg:col-span-2"
                {
                    h2 class="text-xl font-semibold mb-4" { "Your Wallets" }

                    @if wallets.is_empty() {
                        p class="text-gray-600 dark:text-gray-400"
                        {
                            "No wallets yet. Create your first wallet to start tracking your money."
                        }
                    } @else {
                        div class="grid grid-cols-1 sm:grid-cols-2 gap-4"
                        {
                            @for wallet in wallets {
                                (wallet_card(wallet))
                            }
                        }
                    }
                }

                section
                {
                    h2 class="text-xl font-semibold mb-4" { "New Wallet" }
                    (new_wallet_form_view(&Default::default(), wallet_types, ""))
                }
            }
        }
    };

    base("Wallets", &[], &content)
}

fn wallet_card(wallet: &WalletSummary) -> Markup {
    let detail_url = format_endpoint(endpoints::WALLET_DETAIL_VIEW, wallet.id);
    let toggle_url = format_endpoint(endpoints::TOGGLE_WALLET, wallet.id);
    let default_url = format_endpoint(endpoints::DEFAULT_WALLET, wallet.id);
    let delete_url = format_endpoint(endpoints::DELETE_WALLET, wallet.id);

    html! {
        div class=(CARD_STYLE) style=(format!("border-left: 4px solid {};", wallet.color_code))
        {
            div class="flex justify-between items-baseline"
            {
                h3 class="text-lg font-semibold truncate" title=(wallet.wallet_name)
                {
                    a href=(detail_url) class="hover:underline" { (wallet.wallet_name) }
                }

                @if wallet.is_default {
                    span class="text-xs font-semibold text-blue-700 dark:text-blue-300" { "Default" }
                }
            }

            p class="text-sm text-gray-600 dark:text-gray-400" { (wallet.type_name) }

            p class="text-2xl font-bold my-2" { (format_currency(wallet.balance)) }

            p class="text-xs text-gray-600 dark:text-gray-400 mb-3"
            {
                (wallet.transaction_count) " transactions, " (wallet.transfer_count) " transfers"
            }

            div class="flex flex-wrap gap-3 text-sm"
            {
                @if !wallet.is_default && wallet.is_active {
                    button
                        hx-post=(default_url)
                        hx-target-error="#alert-container"
                        class=(LINK_STYLE)
                    {
                        "Make default"
                    }
                }

                button
                    hx-post=(toggle_url)
                    hx-target-error="#alert-container"
                    class=(LINK_STYLE)
                {
                    @if wallet.is_active { "Deactivate" } @else { "Activate" }
                }

                button
                    hx-delete=(delete_url)
                    hx-confirm=(format!("Delete wallet \"{}\"?", wallet.wallet_name))
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}
