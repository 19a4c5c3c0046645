use std::path::PathBuf;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::{EventLog, EventPayload};
use crate::images::{encode_image, load_image_files, ImageRecord, ImageSource};
use crate::render::render_prompt;

const OPTIONS_HEADER: &str = "Selected options:";
const DETAILS_HEADER: &str = "Details:";

/// The sole output of the dialog: an immutable snapshot built once at
/// submission time and handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub interactive_feedback: String,
    pub images: Vec<String>,
}

/// Combine free text, selected preset options and captured images into the
/// final result. Selected options render as a fixed-format block ahead of
/// the free text; image payloads keep collection order.
pub fn assemble(
    feedback_text: &str,
    selected_options: &[String],
    records: &[ImageRecord],
) -> FeedbackResult {
    let feedback_text = feedback_text.trim();
    let interactive_feedback = if selected_options.is_empty() {
        feedback_text.to_string()
    } else {
        let mut block = String::from(OPTIONS_HEADER);
        for label in selected_options {
            block.push('\n');
            block.push_str("✓ ");
            block.push_str(label);
        }
        if feedback_text.is_empty() {
            block
        } else {
            format!("{block}\n\n{DETAILS_HEADER}\n{feedback_text}")
        }
    };

    FeedbackResult {
        interactive_feedback,
        images: records.iter().map(|record| record.data.clone()).collect(),
    }
}

#[derive(Debug, Clone)]
struct PresetOption {
    label: String,
    checked: bool,
}

/// Mutable state behind one open feedback dialog.
///
/// All mutation happens on the single UI event-handling thread in response
/// to sequential user actions, so the image collection needs no locking.
/// The preview strip shown by the UI collaborator is index-aligned with
/// `records`; removal is positional to keep the two in lock-step.
#[derive(Debug, Clone)]
pub struct FeedbackSession {
    prompt_html: String,
    options: Vec<PresetOption>,
    records: Vec<ImageRecord>,
    events: EventLog,
}

impl FeedbackSession {
    pub fn new(prompt: &str, predefined_options: &[String], events: EventLog) -> Self {
        Self {
            prompt_html: render_prompt(prompt),
            options: predefined_options
                .iter()
                .map(|label| PresetOption {
                    label: label.clone(),
                    checked: false,
                })
                .collect(),
            records: Vec::new(),
            events,
        }
    }

    /// Prompt markup for the read-only viewer, rendered once at construction.
    pub fn prompt_html(&self) -> &str {
        &self.prompt_html
    }

    pub fn option_labels(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|option| option.label.clone())
            .collect()
    }

    /// Labels currently checked, in declared (not selection) order.
    pub fn selected_labels(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|option| option.checked)
            .map(|option| option.label.clone())
            .collect()
    }

    pub fn set_option(&mut self, index: usize, checked: bool) -> bool {
        match self.options.get_mut(index) {
            Some(option) => {
                option.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn set_option_by_label(&mut self, label: &str, checked: bool) -> bool {
        match self
            .options
            .iter_mut()
            .find(|option| option.label == label)
        {
            Some(option) => {
                option.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Handle a clipboard paste. Returns the appended record so the UI can
    /// add the matching preview, or `None` when encoding failed and the
    /// paste was dropped.
    pub fn add_pasted_image(&mut self, bitmap: &DynamicImage) -> Option<&ImageRecord> {
        match encode_image(bitmap, &ImageSource::Pasted) {
            Some(record) => {
                let mut payload = EventPayload::new();
                payload.insert(
                    "filename".to_string(),
                    Value::String(record.filename.clone()),
                );
                self.events.emit("image_added", payload).ok();
                self.records.push(record);
                self.records.last()
            }
            None => {
                let mut payload = EventPayload::new();
                payload.insert(
                    "reason".to_string(),
                    Value::String("png encode failed".to_string()),
                );
                self.events.emit("image_rejected", payload).ok();
                None
            }
        }
    }

    /// Handle a file-picker batch. Unreadable files are logged and skipped;
    /// the rest append in path order. Returns how many records were added.
    pub fn add_image_files(&mut self, paths: &[PathBuf]) -> usize {
        let loaded = load_image_files(paths, &self.events);
        let added = loaded.len();
        self.records.extend(loaded);
        added
    }

    /// Remove the record backing the preview at `index`. Positional, so the
    /// caller must pass the preview's index, not search by identity.
    pub fn remove_image(&mut self, index: usize) -> bool {
        if index >= self.records.len() {
            return false;
        }
        let record = self.records.remove(index);
        let mut payload = EventPayload::new();
        payload.insert(
            "filename".to_string(),
            Value::String(record.filename),
        );
        payload.insert("index".to_string(), Value::Number(index.into()));
        self.events.emit("image_removed", payload).ok();
        true
    }

    /// Collapse the current state into the immutable result. The session can
    /// be discarded afterwards.
    pub fn submit(&self, free_text: &str) -> FeedbackResult {
        let result = assemble(free_text, &self.selected_labels(), &self.records);
        let mut payload = EventPayload::new();
        payload.insert(
            "image_count".to_string(),
            Value::Number(result.images.len().into()),
        );
        payload.insert(
            "option_count".to_string(),
            Value::Number(self.selected_labels().len().into()),
        );
        self.events.emit("submitted", payload).ok();
        result
    }
}
