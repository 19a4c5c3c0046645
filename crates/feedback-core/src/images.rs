use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Local;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::events::{EventLog, EventPayload};

/// Transport format for captured bitmaps. Everything is re-encoded to PNG
/// regardless of the source format.
const TRANSPORT_EXTENSION: &str = "png";

/// One captured image, ready for transport in the submission payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub data: String,
    pub filename: String,
    pub extension: String,
}

/// Where a bitmap came from, which decides how its filename is generated:
/// pasted images get a collision-resistant generated name, file-loaded
/// images keep the original base name.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Pasted,
    File(PathBuf),
}

impl ImageSource {
    fn filename(&self) -> String {
        match self {
            ImageSource::Pasted => {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                let unique = Uuid::new_v4().simple().to_string();
                format!("pasted_{timestamp}_{}.{TRANSPORT_EXTENSION}", &unique[..8])
            }
            ImageSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("image.{TRANSPORT_EXTENSION}")),
        }
    }
}

/// Serialize a bitmap to PNG in memory and base64-encode the bytes.
///
/// Returns `None` on encoding failure; the caller logs the drop and moves
/// on, so one bad image never aborts a batch.
pub fn encode_image(image: &DynamicImage, source: &ImageSource) -> Option<ImageRecord> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .ok()?;

    Some(ImageRecord {
        data: BASE64.encode(&bytes),
        filename: source.filename(),
        extension: TRANSPORT_EXTENSION.to_string(),
    })
}

/// Decode and encode a batch of image files in path order.
///
/// A path that fails to decode (or re-encode) is logged and skipped;
/// the surviving records keep their relative order.
pub fn load_image_files(paths: &[PathBuf], log: &EventLog) -> Vec<ImageRecord> {
    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        match image::open(path) {
            Ok(bitmap) => match encode_image(&bitmap, &ImageSource::File(path.clone())) {
                Some(record) => {
                    let mut payload = EventPayload::new();
                    payload.insert(
                        "filename".to_string(),
                        Value::String(record.filename.clone()),
                    );
                    log.emit("image_loaded", payload).ok();
                    records.push(record);
                }
                None => log_rejected(log, path, "png encode failed"),
            },
            Err(err) => log_rejected(log, path, &err.to_string()),
        }
    }
    records
}

fn log_rejected(log: &EventLog, path: &Path, reason: &str) {
    let mut payload = EventPayload::new();
    payload.insert(
        "path".to_string(),
        Value::String(path.display().to_string()),
    );
    payload.insert("reason".to_string(), Value::String(reason.to_string()));
    log.emit("image_rejected", payload).ok();
}
