#[derive(Debug, Clone)]
pub struct StatusLine {
    message: String,
}

pub const READY_STATUS: &str = "Ready. Press c to choose an entry, q to quit.";

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raw(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn ready(&mut self) {
        self.message = READY_STATUS.to_string();
    }

    pub fn selecting(&mut self) {
        self.message = "Selecting. Tab switches focus, Esc closes the popup.".to_string();
    }

    pub fn value_updated(&mut self, uid: Option<&str>) {
        self.message = match uid {
            Some(uid) => format!("Reference set to {uid}"),
            None => "Reference removed".to_string(),
        };
    }

    /// A populated reference is replaced by removing it and choosing again.
    pub fn remove_first(&mut self) {
        self.message = "Press r to remove the current reference first".to_string();
    }

    pub fn read_only(&mut self) {
        self.message = "This field is read-only".to_string();
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
