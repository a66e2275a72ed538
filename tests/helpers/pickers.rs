//! Scripted object pickers.

use nnurbs::document::{HostDocument, ObjectId};
use nnurbs::interchange::Format;
use nnurbs::plugin::{ObjectPicker, PickOptions, PickOutcome};

/// Returns a fixed outcome and records the options it was shown.
pub struct ScriptedPicker {
    outcome: PickOutcome,
    pub seen: Vec<PickOptions>,
}

impl ScriptedPicker {
    pub fn picking(objects: Vec<ObjectId>, format: Format) -> Self {
        Self {
            outcome: PickOutcome::Picked { objects, format },
            seen: Vec::new(),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            outcome: PickOutcome::Cancelled,
            seen: Vec::new(),
        }
    }
}

impl ObjectPicker for ScriptedPicker {
    fn pick(&mut self, _doc: &dyn HostDocument, options: &PickOptions) -> PickOutcome {
        self.seen.push(options.clone());
        self.outcome.clone()
    }
}
