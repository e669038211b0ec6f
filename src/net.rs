use js_sys::{Array, Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, Blob, Headers, ReadableStreamDefaultReader, RequestCache, RequestInit, Response};

use showcase_core::{parse_content_length, parse_content_range_total};

pub(crate) fn js_err(error: JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return value;
        }
    }
    "js error".to_string()
}

async fn fetch(url: &str, init: &RequestInit) -> Result<Response, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
    let response = JsFuture::from(window.fetch_with_str_and_init(url, init)).await?;
    response.dyn_into::<Response>()
}

/// GET that bypasses the HTTP cache, returning the body text.
pub(crate) async fn fetch_text_no_store(url: &str) -> Result<String, JsValue> {
    let init = RequestInit::new();
    init.set_cache(RequestCache::NoStore);
    let response = fetch(url, &init).await?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("http {}", response.status())));
    }
    let text = JsFuture::from(response.text()?).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}

/// Downloads `url` chunk by chunk, reporting `(received, content_length)`
/// after each chunk. `Ok(None)` means the response cannot be streamed and the
/// caller should fall back to a direct load.
pub(crate) async fn stream_with_progress<F>(
    url: &str,
    signal: &AbortSignal,
    mut on_chunk: F,
) -> Result<Option<Blob>, JsValue>
where
    F: FnMut(u64, Option<u64>),
{
    let init = RequestInit::new();
    init.set_signal(Some(signal));
    let response = fetch(url, &init).await?;
    let Some(body) = response.body().filter(|_| response.ok()) else {
        return Ok(None);
    };
    let content_length = response
        .headers()
        .get("Content-Length")?
        .as_deref()
        .and_then(parse_content_length);
    let reader = body.get_reader().dyn_into::<ReadableStreamDefaultReader>()?;
    let chunks = Array::new();
    let mut received = 0_u64;
    loop {
        let step = JsFuture::from(reader.read()).await?;
        let done = Reflect::get(&step, &JsValue::from_str("done"))?
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }
        let chunk = Uint8Array::new(&Reflect::get(&step, &JsValue::from_str("value"))?);
        received += u64::from(chunk.byte_length());
        chunks.push(&chunk);
        on_chunk(received, content_length);
    }
    Blob::new_with_u8_array_sequence(&chunks).map(Some)
}

/// Byte size from a HEAD request, then a one-byte range probe.
pub(crate) async fn fetch_file_size(url: &str) -> Option<u64> {
    if let Ok(size) = head_content_length(url).await {
        if size.is_some() {
            return size;
        }
    }
    range_probe_total(url).await.ok().flatten()
}

async fn head_content_length(url: &str) -> Result<Option<u64>, JsValue> {
    let init = RequestInit::new();
    init.set_method("HEAD");
    init.set_cache(RequestCache::NoStore);
    let response = fetch(url, &init).await?;
    Ok(response
        .headers()
        .get("Content-Length")?
        .as_deref()
        .and_then(parse_content_length))
}

async fn range_probe_total(url: &str) -> Result<Option<u64>, JsValue> {
    let headers = Headers::new()?;
    headers.set("Range", "bytes=0-0")?;
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_cache(RequestCache::NoStore);
    init.set_headers(&headers);
    let response = fetch(url, &init).await?;
    Ok(response
        .headers()
        .get("Content-Range")?
        .as_deref()
        .and_then(parse_content_range_total))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn error_messages_are_readable() {
        assert_eq!(js_err(JsValue::from_str("offline")), "offline");
        let error = js_sys::Error::new("aborted");
        assert_eq!(js_err(error.into()), "aborted");
        assert_eq!(js_err(JsValue::from_f64(3.0)), "3");
    }
}
