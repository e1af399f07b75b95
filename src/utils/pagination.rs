pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Normalised pagination window (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// Declares a `{data, page, per_page, total}` list response for one record type.
macro_rules! list_response {
    ($name:ident, $item:ty) => {
        #[derive(serde::Serialize, utoipa::ToSchema)]
        pub struct $name {
            pub data: Vec<$item>,
            #[schema(example = 1)]
            pub page: u32,
            #[schema(example = 20)]
            pub per_page: u32,
            #[schema(example = 1)]
            pub total: i64,
        }

        impl $name {
            pub fn new(data: Vec<$item>, page: $crate::utils::pagination::Page, total: i64) -> Self {
                Self {
                    data,
                    page: page.page,
                    per_page: page.per_page,
                    total,
                }
            }
        }
    };
}

pub(crate) use list_response;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(Page::new(None, None), Page { page: 1, per_page: 20 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, per_page: 1 });
        assert_eq!(Page::new(Some(3), Some(500)).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn offset_from_page() {
        let page = Page::new(Some(3), Some(25));
        assert_eq!(page.limit(), 25);
        assert_eq!(page.offset(), 50);
        assert_eq!(Page::new(None, None).offset(), 0);
    }
}
