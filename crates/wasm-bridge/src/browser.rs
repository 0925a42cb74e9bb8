//! Browser implementations of the manager's collaborators: file downloads,
//! blocking dialogs, page reload and reading picked files.

use sr2map_data::{ExportedFile, FileSink, Prompter, Reloader};
use sr2map_shared::{UserDataError, UserDataResult};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

fn window() -> UserDataResult<web_sys::Window> {
    web_sys::window().ok_or_else(|| UserDataError::Browser {
        message: "No window object".to_string(),
    })
}

/// Saves exports through a temporary `<a download>` link
pub struct BrowserDownload;

impl FileSink for BrowserDownload {
    fn save(&self, file: &ExportedFile) -> UserDataResult<()> {
        let document = window()?.document().ok_or_else(|| UserDataError::Browser {
            message: "No document".to_string(),
        })?;

        let parts = js_sys::Array::of1(&JsValue::from_str(&file.contents));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type("application/json");
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;

        let anchor: web_sys::HtmlAnchorElement = document
            .create_element("a")?
            .dyn_into()
            .map_err(|_| UserDataError::Browser {
                message: "Created element is not an anchor".to_string(),
            })?;
        anchor.set_href(&url);
        anchor.set_download(&file.filename);

        let body = document.body().ok_or_else(|| UserDataError::Browser {
            message: "No document body".to_string(),
        })?;
        body.append_child(&anchor)?;
        anchor.click();
        anchor.remove();
        web_sys::Url::revoke_object_url(&url)?;

        log::info!("Downloaded {} ({} bytes)", file.filename, file.contents.len());
        Ok(())
    }
}

/// `window.confirm` / `window.alert`
pub struct BrowserDialogs;

impl Prompter for BrowserDialogs {
    fn confirm(&self, message: &str) -> bool {
        match window().map(|w| w.confirm_with_message(message)) {
            Ok(Ok(answer)) => answer,
            _ => {
                log::warn!("Confirmation dialog unavailable, treating as declined");
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        if let Ok(w) = window() {
            if w.alert_with_message(message).is_err() {
                log::warn!("Alert dialog unavailable: {message}");
            }
        }
    }
}

/// Reloads the page so all state is re-derived from storage
pub struct PageReload;

impl Reloader for PageReload {
    fn reload(&self) {
        let result = window().and_then(|w| w.location().reload().map_err(UserDataError::from));
        if let Err(e) = result {
            log::error!("Page reload failed: {e}");
        }
    }
}

/// Read a picked file as UTF-8 text
pub async fn read_file_text(file: &web_sys::File) -> UserDataResult<String> {
    let text = JsFuture::from(file.text()).await?;
    text.as_string().ok_or_else(|| UserDataError::Browser {
        message: format!("{} did not read as text", file.name()),
    })
}
