use std::cell::RefCell;
use wasm_bindgen::prelude::*;

pub mod build;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod error;
pub mod keymap;
pub mod navigation;
pub mod parse;
pub mod platform;
pub mod progress;
pub mod rank;
pub mod search;
pub mod sections;
pub mod types;
pub mod viewer;

use crate::catalog::Catalog;
use crate::config::ViewerConfig;
use crate::platform::console_warn;
use crate::progress::BrowserStorage;
use crate::viewer::Viewer;

// One viewer per page, created lazily from JS
thread_local! {
    static VIEWER: RefCell<Option<Viewer<BrowserStorage>>> = const { RefCell::new(None) };
}

fn with_viewer<T>(f: impl FnOnce(&mut Viewer<BrowserStorage>) -> T) -> Result<T, JsError> {
    VIEWER.with(|viewer| match viewer.borrow_mut().as_mut() {
        Some(v) => Ok(f(v)),
        None => Err(JsError::new(
            "Viewer not initialized. Call init_viewer(catalog_json, config_json) first.",
        )),
    })
}

/// Initialize the viewer with the topic catalog and settings from JavaScript
/// catalog_json: JSON array of topics, each with its ordered documents
/// config_json: JSON object of ViewerConfig fields; "{}" for defaults
#[wasm_bindgen]
pub fn init_viewer(catalog_json: &str, config_json: &str) -> Result<(), JsError> {
    let catalog = Catalog::from_json(catalog_json)
        .map_err(|e| JsError::new(&format!("Failed to parse catalog: {}", e)))?;

    let config = ViewerConfig::from_json(config_json)
        .map_err(|e| JsError::new(&format!("Failed to parse config: {}", e)))?;

    let storage = BrowserStorage::open();
    VIEWER.with(|viewer| {
        *viewer.borrow_mut() = Some(Viewer::new(catalog, config, storage));
    });

    Ok(())
}

/// Check if the viewer has been initialized
#[wasm_bindgen]
pub fn is_viewer_ready() -> bool {
    VIEWER.with(|viewer| viewer.borrow().is_some())
}

/// Hand over fetched markdown; returns the document's sections as JSON
#[wasm_bindgen]
pub fn load_document(document_id: &str, text: String) -> Result<String, JsError> {
    with_viewer(|v| {
        v.load_document(document_id, text)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok::<_, JsError>(sections_json(v, document_id))
    })?
}

/// Report a failed fetch so the document shows as unavailable
#[wasm_bindgen]
pub fn document_failed(document_id: &str, message: &str) -> Result<(), JsError> {
    with_viewer(|v| {
        v.document_failed(document_id, message)
            .map_err(|e| JsError::new(&e.to_string()))
    })?
}

/// "pending", "loaded" or "failed"
#[wasm_bindgen]
pub fn document_status(document_id: &str) -> Result<String, JsError> {
    with_viewer(|v| v.document_status(document_id).as_str().to_string())
}

/// Rebuild search from whatever has loaded so far
#[wasm_bindgen]
pub fn rebuild_search_index() -> Result<(), JsError> {
    with_viewer(|v| v.rebuild_search())
}

/// Search all loaded documents and return JSON results
#[wasm_bindgen]
pub fn search(query: &str, n: usize) -> Result<String, JsError> {
    with_viewer(|v| {
        let results = v.search(query, n);
        serde_json::to_string(&results).unwrap_or_else(|_| "[]".to_string())
    })
}

fn sections_json(v: &Viewer<BrowserStorage>, document_id: &str) -> String {
    let sections = v.sections(document_id).unwrap_or_default();
    serde_json::to_string(sections).unwrap_or_else(|_| "[]".to_string())
}

/// Sections of a loaded document as JSON; "[]" while pending
#[wasm_bindgen]
pub fn document_sections(document_id: &str) -> Result<String, JsError> {
    with_viewer(|v| sections_json(v, document_id))
}

/// Flip a section's done state and return the new state
/// Unknown sections are left untouched and report their current state
#[wasm_bindgen]
pub fn toggle_section(document_id: &str, section_id: &str) -> Result<bool, JsError> {
    with_viewer(|v| match v.toggle_section(document_id, section_id) {
        Ok(done) => done,
        Err(e) => {
            console_warn(format!("Toggle ignored: {e}"));
            v.is_section_done(document_id, section_id)
        }
    })
}

#[wasm_bindgen]
pub fn is_section_done(document_id: &str, section_id: &str) -> Result<bool, JsError> {
    with_viewer(|v| v.is_section_done(document_id, section_id))
}

#[wasm_bindgen]
pub fn document_progress(document_id: &str) -> Result<f64, JsError> {
    with_viewer(|v| v.document_progress(document_id))
}

#[wasm_bindgen]
pub fn topic_progress(topic_id: &str) -> Result<f64, JsError> {
    with_viewer(|v| v.topic_progress(topic_id))
}

#[wasm_bindgen]
pub fn reset_document_progress(document_id: &str) -> Result<(), JsError> {
    with_viewer(|v| v.reset_document_progress(document_id))
}

/// Open a loaded document at its first section; false if it isn't loaded
#[wasm_bindgen]
pub fn open_document(document_id: &str) -> Result<bool, JsError> {
    with_viewer(|v| v.open_document(document_id).is_ok())
}

/// Scroll position as a fraction of the document; returns the visible section
#[wasm_bindgen]
pub fn on_scroll(offset_ratio: f64) -> Result<Option<String>, JsError> {
    with_viewer(|v| v.on_scroll(offset_ratio).map(str::to_string))
}

/// Jump to a section (from search or the TOC); false leaves state unchanged
#[wasm_bindgen]
pub fn jump_to_section(document_id: &str, section_id: &str) -> Result<bool, JsError> {
    with_viewer(|v| v.jump_to_section(document_id, section_id).is_ok())
}

#[wasm_bindgen]
pub fn next_section() -> Result<Option<String>, JsError> {
    with_viewer(|v| v.next_section().map(str::to_string))
}

#[wasm_bindgen]
pub fn prev_section() -> Result<Option<String>, JsError> {
    with_viewer(|v| v.prev_section().map(str::to_string))
}

/// Apply a keyboard shortcut; returns the command name, if the key is bound
#[wasm_bindgen]
pub fn handle_key(key: &str) -> Result<Option<String>, JsError> {
    with_viewer(|v| v.handle_key(key).map(|c| c.as_str().to_string()))
}

/// Current navigation state as JSON
#[wasm_bindgen]
pub fn navigation_state() -> Result<String, JsError> {
    with_viewer(|v| serde_json::to_string(&v.navigation()).unwrap_or_else(|_| "{}".to_string()))
}
