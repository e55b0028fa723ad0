/// Derived paging values for the loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PageWindow {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            total,
        }
    }

    /// Never below 1 so an empty result still reads "page 1 of 1"
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn first_shown(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            u64::from(self.page - 1) * u64::from(self.page_size) + 1
        }
    }

    pub fn last_shown(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.page_size)).min(self.total)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages())
    }

    pub fn summary(&self) -> String {
        if self.total == 0 {
            "Showing 0 of 0".to_string()
        } else {
            format!(
                "Showing {} to {} of {}",
                self.first_shown(),
                self.last_shown(),
                self.total
            )
        }
    }
}
