// Client-side download of the session file
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::error::{AppError, js_message};
use crate::session::{SessionExport, export_file_name};

pub fn download_session(export: &SessionExport) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(export)?;
    let name = export_file_name(&export.participant_id);
    download_text(&name, &json, "application/json")?;
    log::info!("exported {} ({} missions)", name, export.missions.len());
    Ok(())
}

fn download_text(file_name: &str, contents: &str, mime: &str) -> Result<(), AppError> {
    let err = |e: JsValue| AppError::Export(js_message(&e));
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| AppError::Export("no document".into()))?;

    let parts = js_sys::Array::of1(&JsValue::from_str(contents));
    let opts = BlobPropertyBag::new();
    opts.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &opts).map_err(err)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(err)?;

    let anchor = document
        .create_element("a")
        .map_err(err)?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| AppError::Export("anchor element".into()))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url).map_err(err)
}
