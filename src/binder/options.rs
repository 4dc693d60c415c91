use crate::{
    selector::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS},
    window::PopupOptions,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub popup_width: u32,
    pub popup_height: u32,
    pub page_size: usize,
    pub focus_on_open: bool,
    pub title: String,
}

impl Default for PickerOptions {
    fn default() -> Self {
        let popup = PopupOptions::default();
        Self {
            popup_width: popup.width,
            popup_height: popup.height,
            page_size: DEFAULT_PAGE_SIZE,
            focus_on_open: popup.wants_focus,
            title: popup.title,
        }
    }
}

impl PickerOptions {
    pub fn with_popup_size(mut self, width: u32, height: u32) -> Self {
        self.popup_width = width;
        self.popup_height = height;
        self
    }

    /// Sizes outside of the offered page sizes fall back to the default.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if PAGE_SIZE_OPTIONS.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        self
    }

    pub fn with_focus_on_open(mut self, focus: bool) -> Self {
        self.focus_on_open = focus;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub(crate) fn popup_options(&self) -> PopupOptions {
        PopupOptions {
            width: self.popup_width,
            height: self.popup_height,
            wants_focus: self.focus_on_open,
            title: self.title.clone(),
        }
    }
}
