use std::time::Duration;

use crate::binder::PickerOptions;

#[derive(Debug, Clone)]
pub struct UiOptions {
    pub tick_rate: Duration,
    /// Popup size in terminal cells.
    pub popup_width: u16,
    pub popup_height: u16,
    pub page_size: usize,
    pub show_help: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            popup_width: 76,
            popup_height: 20,
            page_size: 10,
            show_help: true,
        }
    }
}

impl UiOptions {
    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_popup_size(mut self, width: u16, height: u16) -> Self {
        self.popup_width = width;
        self.popup_height = height;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    pub(crate) fn picker_options(&self) -> PickerOptions {
        PickerOptions::default()
            .with_popup_size(u32::from(self.popup_width), u32::from(self.popup_height))
            .with_page_size(self.page_size)
    }
}
