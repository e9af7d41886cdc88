//! Common functionality for paging lists of data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of numbered links to show in the pagination indicator.
    pub max_links: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_links: 5,
        }
    }
}

/// One element of the pagination indicator row.
#[derive(Debug, PartialEq, Eq)]
pub enum PageLink {
    /// A numbered link to a page; `current` marks the page being viewed.
    Number {
        /// The page this link navigates to.
        page: u64,
        /// Whether this is the page currently displayed.
        current: bool,
    },
    /// A gap between non-adjacent page numbers.
    Gap,
}

/// Build the row of page links for `curr_page` out of `page_count` pages.
///
/// At most `max_links` numbered links are shown, centred on the current page
/// where possible, with the first and last page always reachable through a
/// gap marker.
pub fn page_links(curr_page: u64, page_count: u64, max_links: u64) -> Vec<PageLink> {
    let number = |page| PageLink::Number {
        page,
        current: page == curr_page,
    };

    if page_count <= max_links {
        return (1..=page_count).map(number).collect();
    }

    let half = max_links / 2;
    let (window_start, window_end) = if curr_page <= half {
        (1, max_links)
    } else if curr_page > page_count - half {
        (page_count - max_links + 1, page_count)
    } else {
        (curr_page - half, curr_page + half)
    };

    let mut links = Vec::new();

    if window_start > 1 {
        links.push(number(1));
        if window_start > 2 {
            links.push(PageLink::Gap);
        }
    }

    links.extend((window_start..=window_end).map(number));

    if window_end < page_count {
        if window_end < page_count - 1 {
            links.push(PageLink::Gap);
        }
        links.push(number(page_count));
    }

    links
}

/// The number of pages needed to display `row_count` rows.
pub fn page_count(row_count: u64, page_size: u64) -> u64 {
    row_count.div_ceil(page_size).max(1)
}

#[cfg(test)]
mod tests {
    use super::{PageLink, page_count, page_links};

    fn page(page: u64) -> PageLink {
        PageLink::Number {
            page,
            current: false,
        }
    }

    fn current(page: u64) -> PageLink {
        PageLink::Number {
            page,
            current: true,
        }
    }

    #[test]
    fn shows_all_pages_when_few() {
        let got = page_links(1, 4, 5);

        assert_eq!(got, [current(1), page(2), page(3), page(4)]);
    }

    #[test]
    fn window_at_start_adds_trailing_gap() {
        let got = page_links(1, 10, 5);

        assert_eq!(
            got,
            [
                current(1),
                page(2),
                page(3),
                page(4),
                page(5),
                PageLink::Gap,
                page(10),
            ]
        );
    }

    #[test]
    fn window_at_end_adds_leading_gap() {
        let got = page_links(10, 10, 5);

        assert_eq!(
            got,
            [
                page(1),
                PageLink::Gap,
                page(6),
                page(7),
                page(8),
                page(9),
                current(10),
            ]
        );
    }

    #[test]
    fn window_in_middle_adds_both_gaps() {
        let got = page_links(5, 10, 5);

        assert_eq!(
            got,
            [
                page(1),
                PageLink::Gap,
                page(3),
                page(4),
                current(5),
                page(6),
                page(7),
                PageLink::Gap,
                page(10),
            ]
        );
    }

    #[test]
    fn adjacent_window_omits_gap() {
        // The window ends at page 9, directly before the last page, so no
        // gap marker should separate them.
        let got = page_links(7, 10, 5);

        assert_eq!(
            got,
            [
                page(1),
                PageLink::Gap,
                page(5),
                page(6),
                current(7),
                page(8),
                page(9),
                page(10),
            ]
        );
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 20), 1);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(41, 20), 3);
    }
}
