//! The list and table widgets on the dashboard.

use maud::{Markup, html};

use crate::{
    budget::BudgetStatus,
    dashboard::aggregation::CategoryTotal,
    endpoints,
    endpoints::format_endpoint,
    goal::{GoalSummary, SavingsGoal},
    html::{
        BADGE_EXPENSE_STYLE, BADGE_INCOME_STYLE, CARD_STYLE, format_currency, link,
    },
    transaction::{TransactionKind, TransactionRow},
    wallet::WalletSummary,
};

pub(super) fn wallets_panel(wallets: &[WalletSummary]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h3 class="text-lg font-semibold mb-3" { "Wallets" }

            @if wallets.is_empty() {
                p class="text-gray-600 dark:text-gray-400 mb-2" { "No wallets yet." }
                (link(endpoints::WALLETS_VIEW, "Create a wallet"))
            } @else {
                ul class="space-y-2"
                {
                    @for wallet in wallets {
                        li class="flex justify-between items-baseline text-sm"
                        {
                            span
                            {
                                span
                                    class="inline-block w-2.5 h-2.5 rounded-full mr-2"
                                    style=(format!("background-color: {};", wallet.color_code))
                                {}

                                a
                                    href=(format_endpoint(endpoints::WALLET_DETAIL_VIEW, wallet.id))
                                    class="hover:underline"
                                {
                                    (wallet.wallet_name)
                                }

                                @if wallet.is_default {
                                    span class="text-xs text-blue-700 dark:text-blue-300" { " (default)" }
                                }

                                @if !wallet.is_active {
                                    span class="text-xs text-gray-500" { " (inactive)" }
                                }
                            }

                            span class="font-medium" { (format_currency(wallet.balance)) }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn recent_transactions_panel(transactions: &[TransactionRow]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-3"
            {
                h3 class="text-lg font-semibold" { "Recent Transactions" }
                (link(endpoints::TRANSACTIONS_VIEW, "View all"))
            }

            @if transactions.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No transactions yet." }
            } @else {
                ul class="space-y-2"
                {
                    @for transaction in transactions {
                        li class="flex justify-between items-baseline text-sm"
                        {
                            span
                            {
                                (transaction.description)
                                span class="text-gray-600 dark:text-gray-400"
                                {
                                    " · " (transaction.category_name) " · " (transaction.date)
                                }
                            }

                            @match transaction.kind {
                                TransactionKind::Income => {
                                    span class=(BADGE_INCOME_STYLE)
                                    {
                                        "+" (format_currency(transaction.amount))
                                    }
                                }
                                TransactionKind::Expense => {
                                    span class=(BADGE_EXPENSE_STYLE)
                                    {
                                        "-" (format_currency(transaction.amount))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn top_categories_panel(categories: &[CategoryTotal]) -> Markup {
    let max_total = categories
        .iter()
        .map(|category| category.total)
        .fold(0.0_f64, f64::max);

    html! {
        section class=(CARD_STYLE)
        {
            h3 class="text-lg font-semibold mb-3" { "Top Spending This Month" }

            @if categories.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No expenses this month." }
            } @else {
                ul class="space-y-3"
                {
                    @for category in categories {
                        @let width = if max_total > 0.0 {
                            (category.total / max_total * 100.0).clamp(3.0, 100.0)
                        } else {
                            0.0
                        };

                        li
                        {
                            div class="flex justify-between items-baseline text-sm mb-1"
                            {
                                span { (category.name) }
                                span class="font-medium" { (format_currency(category.total)) }
                            }

                            div class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2"
                            {
                                div
                                    class="bg-red-500 dark:bg-red-600 h-2 rounded-full"
                                    style=(format!("width: {width:.1}%"))
                                {}
                            }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn budgets_panel(statuses: &[BudgetStatus]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-3"
            {
                h3 class="text-lg font-semibold" { "Budgets" }
                (link(endpoints::BUDGETS_VIEW, "Manage"))
            }

            @if statuses.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No budgets set for this month." }
            } @else {
                ul class="space-y-3"
                {
                    @for status in statuses {
                        @let width = status.usage_percentage.clamp(0.0, 100.0);
                        @let over_budget = status.usage_percentage > 100.0;

                        li
                        {
                            div class="flex justify-between items-baseline text-sm mb-1"
                            {
                                span { (status.category_name) }

                                @if over_budget {
                                    span class="font-medium text-red-600 dark:text-red-400"
                                    {
                                        (format_currency(status.spent_amount))
                                        " / "
                                        (format_currency(status.budget_amount))
                                    }
                                } @else {
                                    span class="font-medium"
                                    {
                                        (format_currency(status.spent_amount))
                                        " / "
                                        (format_currency(status.budget_amount))
                                    }
                                }
                            }

                            div class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2"
                            {
                                @if over_budget {
                                    div
                                        class="bg-red-500 dark:bg-red-600 h-2 rounded-full"
                                        style="width: 100%"
                                    {}
                                } @else {
                                    div
                                        class="bg-blue-600 dark:bg-blue-500 h-2 rounded-full"
                                        style=(format!("width: {width:.1}%"))
                                    {}
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn goals_panel(summary: &GoalSummary, goals: &[SavingsGoal]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-3"
            {
                h3 class="text-lg font-semibold" { "Savings Goals" }
                (link(endpoints::GOALS_VIEW, "Manage"))
            }

            @if summary.total_goals == 0 {
                p class="text-gray-600 dark:text-gray-400" { "No savings goals yet." }
            } @else {
                p class="text-sm text-gray-600 dark:text-gray-400 mb-3"
                {
                    (summary.completed_goals) " of " (summary.total_goals)
                    " goals reached · saved "
                    (format_currency(summary.total_saved))
                    " of "
                    (format_currency(summary.total_target))
                }

                ul class="space-y-3"
                {
                    @for goal in goals.iter().filter(|goal| !goal.is_completed) {
                        @let progress = if goal.target_amount > 0.0 {
                            (goal.current_amount / goal.target_amount * 100.0).clamp(0.0, 100.0)
                        } else {
                            0.0
                        };

                        li
                        {
                            div class="flex justify-between items-baseline text-sm mb-1"
                            {
                                span { (goal.name) }
                                span class="font-medium"
                                {
                                    (format_currency(goal.current_amount))
                                    " / "
                                    (format_currency(goal.target_amount))
                                }
                            }

                            div class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2"
                            {
                                @if progress > 0.0 {
                                    div
                                        class="bg-green-500 dark:bg-green-600 h-2 rounded-full"
                                        style=(format!("width: {progress:.1}%"))
                                    {}
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
