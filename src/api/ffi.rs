//! C-compatible API for embedding the pipelines in a foreign UI shell.
//!
//! Every call loads configuration and artefacts afresh. The first call also
//! installs the JSON log subscriber at the configured level. Returned strings are
//! JSON and owned by Rust: release them with `medpredict_free_str`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde_json::json;

use crate::artifacts::repo_fs::FsArtifactStore;
use crate::common::config::AppCfg;
use crate::common::log;
use crate::common::error::{PredictError, PredictResult};
use crate::inference::domain::{Flow, FlowRequest, Prediction};
use crate::inference::service::Predictor;

/// ABI version to coordinate with the embedding shell.
#[no_mangle]
pub extern "C" fn medpredict_api_version() -> u32 {
    1
}

/// Run a tabular flow (`"heart"` or `"diabetes"`) on a JSON field mapping.
///
/// # Safety
/// `flow` and `input_json` must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn medpredict_predict_tabular(
    flow: *const c_char,
    input_json: *const c_char,
) -> *const c_char {
    let outcome = (|| -> PredictResult<Prediction> {
        let flow: Flow = read_str(flow, "flow")?.parse()?;
        let input = read_str(input_json, "input")?;
        let request = FlowRequest::from_json(flow, &input)?;
        predictor()?.predict(&request)
    })();
    respond(outcome)
}

/// Run the COVID flow on an uploaded image buffer.
///
/// # Safety
/// `data` must be null or point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn medpredict_predict_image(data: *const u8, len: usize) -> *const c_char {
    let outcome = if data.is_null() {
        Err(PredictError::invalid("image buffer is null"))
    } else {
        let bytes = std::slice::from_raw_parts(data, len);
        predictor().and_then(|p| p.predict_covid(bytes))
    };
    respond(outcome)
}

/// Free strings allocated by Rust.
///
/// # Safety
/// `ptr` must be null or a pointer previously returned by this library.
#[no_mangle]
pub unsafe extern "C" fn medpredict_free_str(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(CString::from_raw(ptr as *mut c_char));
}

fn predictor() -> PredictResult<Predictor<FsArtifactStore>> {
    let cfg = AppCfg::load()?;
    log::init(&cfg.log_level);
    Ok(Predictor::new(FsArtifactStore::new(&cfg), cfg.resize_filter))
}

unsafe fn read_str(ptr: *const c_char, what: &str) -> PredictResult<String> {
    if ptr.is_null() {
        return Err(PredictError::invalid(format!("{what} is null")));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|_| PredictError::invalid(format!("{what} is not valid UTF-8")))
}

/// JSON body handed back across the boundary.
pub fn response_json(outcome: &PredictResult<Prediction>) -> String {
    let body = match outcome {
        Ok(prediction) => json!({ "ok": true, "prediction": prediction }),
        Err(err) => json!({ "ok": false, "code": err.code() as u32, "error": err.to_string() }),
    };
    body.to_string()
}

fn respond(outcome: PredictResult<Prediction>) -> *const c_char {
    string_to_raw(response_json(&outcome))
}

fn string_to_raw(s: String) -> *const c_char {
    match CString::new(s) {
        Ok(cstring) => cstring.into_raw() as *const c_char,
        Err(_) => fallback_json_raw(),
    }
}

fn fallback_json_raw() -> *const c_char {
    // Literal contains no interior NUL.
    CString::new("{\"ok\":false}")
        .map(|c| c.into_raw() as *const c_char)
        .unwrap_or(std::ptr::null())
}
