use serde_json::{Value, json};

pub const LINE_HEIGHT: f32 = 20.0;
pub const COLUMN_WIDTH: f32 = 300.0;

/// A paragraph with inline metrics
pub fn paragraph(text: &str, height: f32) -> Value {
    json!({
        "type": "Element",
        "tag": "p",
        "metrics": { "outerH": height, "lineHeight": LINE_HEIGHT },
        "children": [{ "type": "Text", "content": text }]
    })
}

/// `count` numbered paragraphs of equal height
pub fn paragraphs(count: usize, height: f32) -> Vec<Value> {
    (0..count).map(|i| paragraph(&format!("p{}", i), height)).collect()
}

/// The article root, measured at the standard column width
pub fn article(children: Vec<Value>) -> Value {
    json!({
        "tag": "article",
        "metrics": { "outerW": COLUMN_WIDTH, "outerH": 10000.0, "lineHeight": LINE_HEIGHT },
        "children": children
    })
}

pub fn column(height: f32) -> Value {
    json!({ "kind": "column", "height": height, "width": COLUMN_WIDTH })
}

pub fn container(height: f32, sizes: &str, fixed: bool) -> Value {
    json!({ "kind": "container", "height": height, "sizes": sizes, "fixed": fixed })
}

/// A grid sized exactly for its items
pub fn grid(name: &str, classes: &[&str], height: f32, items: Vec<Value>) -> Value {
    json!({
        "name": name,
        "classes": classes,
        "size": {
            "outerW": COLUMN_WIDTH * items.len().max(1) as f32,
            "outerH": height,
            "lineHeight": LINE_HEIGHT
        },
        "items": items
    })
}

/// A fixed single-column grid
pub fn single_column_grid(height: f32) -> Value {
    grid("single", &["fixed"], height, vec![column(height)])
}

pub fn document(content: Value, grids: Vec<Value>, width: f32, height: f32) -> Value {
    json!({
        "content": content,
        "grids": grids,
        "viewport": { "width": width, "height": height }
    })
}

/// A figure with one cloaked image payload per size name
pub fn image_figure(classes: &[&str], sizes: &str, src: &str) -> Value {
    json!({
        "type": "Figure",
        "classes": classes,
        "payloads": [
            { "sizes": sizes, "content": { "markup": image(src) } }
        ]
    })
}

/// A figure with an image payload and an in-flow fallback paragraph
pub fn figure_with_fallback(classes: &[&str], sizes: &str, src: &str, fallback: &str) -> Value {
    json!({
        "type": "Figure",
        "classes": classes,
        "payloads": [
            { "sizes": sizes, "content": { "markup": image(src) } },
            { "sizes": "fallback", "content": { "element": {
                "tag": "p",
                "metrics": { "outerH": 40.0, "lineHeight": LINE_HEIGHT },
                "children": [{ "type": "Text", "content": fallback }]
            } } }
        ]
    })
}

pub fn image(src: &str) -> String {
    format!("<img data-src=\"{}\">", src)
}
