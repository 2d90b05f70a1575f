/// Options controlling how a delimited-text upload is decoded.
#[derive(Debug, Clone, Default)]
pub struct TextReadOptions {
    /// Force a delimiter instead of sniffing one from the content.
    pub delimiter: Option<u8>,
}

impl TextReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}
