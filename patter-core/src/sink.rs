//! Output sink consumed by the runner

/// Where rendered output goes.
///
/// `report_error` receives runtime evaluation failures; the message is only
/// valid for the duration of the call.
pub trait Sink {
    fn append_char(&mut self, c: char);
    fn append_text(&mut self, text: &str);
    fn clear(&mut self);
    fn report_error(&mut self, message: &str);
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn append_char(&mut self, c: char) {
        (**self).append_char(c);
    }

    fn append_text(&mut self, text: &str) {
        (**self).append_text(text);
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn report_error(&mut self, message: &str) {
        (**self).report_error(message);
    }
}

/// Sink that keeps everything in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSink {
    /// Text since the last clear
    pub text: String,
    /// Every character and text chunk ever appended, clears included
    pub transcript: String,
    pub clears: usize,
    pub errors: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for BufferSink {
    fn append_char(&mut self, c: char) {
        self.text.push(c);
        self.transcript.push(c);
    }

    fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.transcript.push_str(text);
    }

    fn clear(&mut self) {
        self.text.clear();
        self.clears += 1;
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
