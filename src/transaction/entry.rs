//! The shared form, validation, and view for recording income and expenses.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    alert::Alert,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base, dollar_input_styles, format_currency,
    },
    navigation::NavBar,
    session::UserId,
    transaction::{
        NewTransaction, TransactionCategory, TransactionKind, get_visible_category,
    },
    wallet::{Wallet, get_wallet},
};

/// The form data for recording an income or expense transaction.
///
/// Fields arrive as strings so invalid input can be redisplayed verbatim
/// alongside the validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub wallet_id: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl EntryForm {
    /// Check the form and convert it into the typed transaction fields.
    ///
    /// All problems are collected so the user sees every issue at once;
    /// nothing is written when any check fails.
    pub fn validate(
        &self,
        kind: TransactionKind,
        user_id: UserId,
        today: Date,
        connection: &Connection,
    ) -> Result<NewTransaction, Vec<String>> {
        let mut errors = Vec::new();

        let amount = self.amount.trim().parse::<f64>().unwrap_or(0.0);
        if amount <= 0.0 {
            errors.push("Please enter a valid amount greater than 0.".to_owned());
        }

        let description = self.description.trim().to_owned();
        if description.is_empty() {
            errors.push("Please enter a description.".to_owned());
        }

        let wallet_id = self.wallet_id.parse::<i64>().unwrap_or(0);
        let wallet_is_valid = wallet_id > 0
            && matches!(
                get_wallet(wallet_id, user_id, connection),
                Ok(Wallet { is_active: true, .. })
            );
        if !wallet_is_valid {
            errors.push("Please select a valid wallet.".to_owned());
        }

        let category_id = self.category_id.parse::<i64>().unwrap_or(0);
        let category_is_valid = category_id > 0
            && get_visible_category(category_id, user_id, connection)
                .is_ok_and(|category| category.kind == kind);
        if !category_is_valid {
            errors.push("Please select a valid category.".to_owned());
        }

        let date_format = format_description!("[year]-[month]-[day]");
        match Date::parse(self.date.trim(), &date_format) {
            Ok(date) if date <= today => {
                if errors.is_empty() {
                    return Ok(NewTransaction {
                        user_id,
                        wallet_id,
                        category_id,
                        kind,
                        amount,
                        description,
                        date,
                    });
                }
            }
            Ok(_) => errors.push("The date cannot be in the future.".to_owned()),
            Err(_) => errors.push("Please enter a valid date.".to_owned()),
        }

        Err(errors)
    }
}

/// The data needed to render an entry page or form fragment.
pub struct EntryPageContext<'a> {
    /// Whether this page records income or expenses.
    pub kind: TransactionKind,
    /// The endpoint the form posts to.
    pub post_endpoint: &'a str,
    /// The endpoint of the page, for marking the navigation bar.
    pub view_endpoint: &'a str,
    /// The user's active wallets for the wallet select.
    pub wallets: &'a [Wallet],
    /// The visible categories matching `kind`.
    pub categories: &'a [TransactionCategory],
    /// The latest date the form accepts.
    pub max_date: Date,
}

/// Render the full entry page.
pub fn entry_page_view(context: &EntryPageContext, form: &EntryForm) -> Markup {
    let nav_bar = NavBar::new(context.view_endpoint).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-semibold mb-4"
            {
                "Record " (context.kind.label())
            }

            (entry_form_view(context, form, &[], ""))
        }
    };

    base(
        &format!("New {}", context.kind.label()),
        &[dollar_input_styles()],
        &content,
    )
}

/// Render the entry form fragment.
///
/// `banners` are shown above the form (success and budget warnings);
/// `error_message` is shown inside the form next to the submit button.
pub fn entry_form_view(
    context: &EntryPageContext,
    form: &EntryForm,
    banners: &[Alert],
    error_message: &str,
) -> Markup {
    html! {
        @for banner in banners {
            (banner.clone().into_html())
        }

        form
            hx-post=(context.post_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="wallet_id" class=(FORM_LABEL_STYLE) { "Wallet" }

                select
                    id="wallet_id"
                    name="wallet_id"
                    required
                    class=(FORM_SELECT_STYLE)
                {
                    option value="" { "Select a wallet" }

                    @for wallet in context.wallets {
                        @if form.wallet_id == wallet.id.to_string() {
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

                    @for category in context.categories {
                        @if form.category_id == category.id.to_string() {
                            option value=(category.id) selected { (category.name) }
                        } @else {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

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

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    name="description"
                    type="text"
                    placeholder="What was this for?"
                    value=(form.description)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    name="date"
                    type="date"
                    max=(context.max_date)
                    value=(form.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                "Record " (context.kind.label())
            }
        }
    }
}
