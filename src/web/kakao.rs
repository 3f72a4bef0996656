//! Kakao JavaScript SDK binding. The SDK is loaded by the page with a plain
//! `<script>` tag; when it is missing every call fails and sharing reports
//! itself unavailable.

use js_sys::{Function, Promise, Reflect};
use serde_json::json;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{GameError, GameResult};
use crate::share::{SharePayload, ShareSdk};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Kakao, js_name = init, catch)]
    fn kakao_init(app_key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = Kakao, js_name = isInitialized, catch)]
    fn kakao_is_initialized() -> Result<bool, JsValue>;

    #[wasm_bindgen(js_namespace = ["Kakao", "Link"], js_name = sendDefault, catch)]
    fn kakao_send_default(settings: &JsValue) -> Result<(), JsValue>;
}

#[derive(Debug, Default)]
pub struct KakaoSdk;

impl ShareSdk for KakaoSdk {
    fn init(&mut self, app_key: &str) -> GameResult<()> {
        kakao_init(app_key).map_err(|e| {
            warn!(error = ?e, "Kakao SDK init failed");
            GameError::ShareUnavailable
        })
    }

    fn is_initialized(&self) -> bool {
        kakao_is_initialized().unwrap_or(false)
    }

    async fn send_link(&self, payload: &SharePayload) -> GameResult<()> {
        let settings = feed_settings(payload)?;
        // Kakao reports through `success`/`fail` callbacks; point them at a promise.
        let promise = Promise::new(&mut |resolve: Function, reject: Function| {
            let wired = Reflect::set(&settings, &"success".into(), &resolve)
                .and_then(|_| Reflect::set(&settings, &"fail".into(), &reject));
            let sent = wired.and_then(|_| kakao_send_default(&settings));
            if let Err(err) = sent {
                let _ = reject.call1(&JsValue::NULL, &err);
            }
        });
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| GameError::ShareFailed(format!("{e:?}")))
    }
}

fn feed_settings(payload: &SharePayload) -> GameResult<JsValue> {
    let link = json!({ "mobileWebUrl": payload.link, "webUrl": payload.link });
    let settings = json!({
        "objectType": "feed",
        "content": {
            "title": payload.title,
            "description": payload.description,
            "imageUrl": payload.image_url,
            "link": link,
        },
        "buttons": [{ "title": payload.button_title, "link": link }],
    });
    js_sys::JSON::parse(&settings.to_string()).map_err(|e| GameError::ShareFailed(format!("{e:?}")))
}
