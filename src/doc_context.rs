#[derive(Debug, Clone)]
pub struct DocContext {
    pub page_number: usize,
    pub total_pages: usize,
    pub page_name: String,
}

impl DocContext {
    pub fn new(page_number: usize, total_pages: usize, page_name: impl Into<String>) -> Self {
        Self {
            page_number,
            total_pages,
            page_name: page_name.into(),
        }
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.total_pages)
    }
}
