//! Interactive object selection.

use crate::document::{HostDocument, ObjectId};
use crate::interchange::Format;

/// How the host picker is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct PickOptions {
    pub prompt: String,
    /// Initial state of the output format toggle.
    pub format: Format,
    /// Picking a group member picks the whole group.
    pub group_select: bool,
    /// Allow picking faces or edges of a larger object.
    pub subobject_select: bool,
    pub minimum: usize,
    /// `None` means no upper limit.
    pub maximum: Option<usize>,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            prompt: "Select objects to export".to_string(),
            format: Format::Xml,
            group_select: true,
            subobject_select: false,
            minimum: 1,
            maximum: None,
        }
    }
}

impl PickOptions {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Whether `count` picked objects satisfies the limits.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.minimum && self.maximum.is_none_or(|max| count <= max)
    }
}

/// What the user did with the picker.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// Objects in pick order, plus the final state of the format toggle.
    Picked { objects: Vec<ObjectId>, format: Format },
    Cancelled,
}

/// The host's object picker.
pub trait ObjectPicker {
    fn pick(&mut self, doc: &dyn HostDocument, options: &PickOptions) -> PickOutcome;
}
