pub mod fixtures;

use folio::{Document, Page, PipelineError};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Deserialize a JSON document
pub fn load_document(json: &Value) -> Result<Document, PipelineError> {
    let _ = env_logger::builder().is_test(true).try_init();
    Ok(serde_json::from_value(json.clone())?)
}

/// Paginate a JSON document in one go
pub fn paginate_json(json: &Value) -> Result<Vec<Page>, PipelineError> {
    load_document(json)?.paginate()
}

/// Markup of the first column on a page
pub fn first_column(page: &Page) -> &str {
    page.columns.first().map(|c| c.markup.as_str()).unwrap_or("")
}
