//! The stat cards shown at the top of the dashboard.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::{PeriodTotals, TodayActivity},
    html::{CARD_STYLE, format_currency},
};

/// The figures displayed across the stat card row.
pub(super) struct StatCards {
    /// Total balance across the user's active wallets.
    pub total_balance: f64,
    /// Income and expenses across the whole history.
    pub lifetime: PeriodTotals,
    /// Income and expenses for the current month.
    pub this_month: PeriodTotals,
    /// Activity recorded today.
    pub today: TodayActivity,
    /// Average daily spending over the last 30 days.
    pub average_daily_expense: f64,
}

pub(super) fn stat_cards_view(stats: &StatCards) -> Markup {
    html! {
        section class="w-full mx-auto mb-6"
        {
            div class="grid grid-cols-1 sm:grid-cols-2 xl:grid-cols-4 gap-4"
            {
                (stat_card(
                    "Total Balance",
                    &format_currency(stats.total_balance),
                    "Across active wallets",
                ))

                (stat_card(
                    "This Month",
                    &format_currency(stats.this_month.net()),
                    &format!(
                        "{} in, {} out",
                        format_currency(stats.this_month.income),
                        format_currency(stats.this_month.expense)
                    ),
                ))

                (stat_card(
                    "All Time Net",
                    &format_currency(stats.lifetime.net()),
                    &format!(
                        "{} in, {} out",
                        format_currency(stats.lifetime.income),
                        format_currency(stats.lifetime.expense)
                    ),
                ))

                (stat_card(
                    "Daily Spending",
                    &format_currency(stats.average_daily_expense),
                    &format!(
                        "30-day average, {} transactions today",
                        stats.today.transaction_count
                    ),
                ))
            }
        }
    }
}

fn stat_card(title: &str, value: &str, subtitle: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }

            p class="text-2xl font-bold my-1" { (value) }

            p class="text-xs text-gray-600 dark:text-gray-400" { (subtitle) }
        }
    }
}

#[cfg(test)]
mod stat_cards_tests {
    use crate::dashboard::aggregation::{PeriodTotals, TodayActivity};

    use super::{StatCards, stat_cards_view};

    #[test]
    fn renders_all_figures() {
        let stats = StatCards {
            total_balance: 1234.56,
            lifetime: PeriodTotals {
                income: 5000.0,
                expense: 3765.44,
            },
            this_month: PeriodTotals {
                income: 500.0,
                expense: 420.0,
            },
            today: TodayActivity {
                transaction_count: 3,
                income: 0.0,
                expense: 42.0,
            },
            average_daily_expense: 14.0,
        };

        let html = stat_cards_view(&stats).into_string();

        assert!(html.contains("$1,234.56"));
        assert!(html.contains("$80.00")); // this month's net
        assert!(html.contains("$1,234.56")); // all time net matches balance here
        assert!(html.contains("$14.00"));
        assert!(html.contains("3 transactions today"));
    }
}
