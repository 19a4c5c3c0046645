pub mod events;
pub mod images;
pub mod render;
pub mod session;
pub mod text;

pub use events::EventLog;
pub use images::{encode_image, load_image_files, ImageRecord, ImageSource};
pub use render::{markdown_to_html, render_prompt, text_to_html};
pub use session::{assemble, FeedbackResult, FeedbackSession};
pub use text::{is_markdown, normalize};
