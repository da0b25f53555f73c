#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

/// Best-effort readable text for a thrown JS value.
#[cfg(target_arch = "wasm32")]
pub fn js_error_text(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    let field = |name: &str| {
        js_sys::Reflect::get(value, &name.into())
            .ok()
            .and_then(|v| v.as_string())
            .filter(|v| !v.trim().is_empty())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => format!("{name}: {message}"),
        (None, Some(message)) => message,
        (Some(name), None) => name,
        (None, None) => "Unknown browser error".to_string(),
    }
}

/// The `name` of a thrown DOMException, if any.
#[cfg(target_arch = "wasm32")]
pub fn js_error_name(value: &JsValue) -> Option<String> {
    js_sys::Reflect::get(value, &"name".into())
        .ok()
        .and_then(|v| v.as_string())
}

/// Formats seconds as `m:ss`.
pub fn format_position(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
