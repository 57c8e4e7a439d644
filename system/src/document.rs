/// The shared text buffer of a session.
///
/// Lengths and offsets count `char`s. The buffer is replaced wholesale on every remote
/// update; the newest received content wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    content: String,
    len: usize,
    last_saved_content: String,
    ever_saved: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replaces the content and returns the previous one.
    pub fn replace(&mut self, content: impl Into<String>) -> String {
        let content = content.into();
        self.len = content.chars().count();
        std::mem::replace(&mut self.content, content)
    }

    /// Loads the content the relay holds for the session. It is already stored, so it
    /// becomes the saved snapshot as well.
    pub fn load(&mut self, content: impl Into<String>) {
        self.replace(content);
        self.last_saved_content = self.content.clone();
    }

    pub fn is_dirty(&self) -> bool {
        self.content != self.last_saved_content
    }

    pub fn last_saved_content(&self) -> &str {
        &self.last_saved_content
    }

    pub fn mark_saved(&mut self, content: &str) {
        self.last_saved_content = content.to_owned();
        self.ever_saved = true;
    }

    /// Whether a save issued by this client has succeeded.
    pub fn ever_saved(&self) -> bool {
        self.ever_saved
    }
}
