use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }
        let shown_until = (current_offset + rows.len() as i64).min(total_rows);

        let next_offset = (shown_until < total_rows).then_some(current_offset + page_size);
        let prev_offset = (current_offset > 0).then(|| (current_offset - page_size).max(0));

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            message: Some(format!(
                "{} - {} / {}",
                current_offset + 1,
                shown_until,
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: None,
            prev_offset: None,
            message: Some(String::from("No results")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let page = PageContext::from_rows(vec![1, 2], 6, 2, 2);
        assert_eq!(page.next_offset, Some(4));
        assert_eq!(page.prev_offset, Some(0));
        assert_eq!(page.message.as_deref(), Some("3 - 4 / 6"));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PageContext::from_rows(vec![5], 5, 2, 4);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(2));
    }

    #[test]
    fn empty_page() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 10, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.message.as_deref(), Some("No results"));
    }
}
