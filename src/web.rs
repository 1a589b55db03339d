//! Browser bindings
//!
//! [`WebVault`] exposes every vault action to the page and runs the two frame
//! loops on `requestAnimationFrame`. Each loop holds its `FrameHandle` and
//! stops rescheduling itself as soon as the vault cancels it.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};
use web_sys::{Blob, BlobPropertyBag, File, HtmlAnchorElement, Url};

use crate::backup::BackupArtifact;
use crate::countdown::format_cooldown;
use crate::image::ImageData;
use crate::platform::FrameHandle;
use crate::settings::VaultSettings;
use crate::vault::{DurationInput, Vault, VaultAction, VaultMode, VaultNotice, VaultStatus};
use crate::wheel::WheelPhase;

type Shared = Rc<RefCell<Vault>>;

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Vault handle for the page
#[wasm_bindgen]
pub struct WebVault {
    inner: Shared,
    countdown_loop: Rc<RefCell<Option<FrameHandle>>>,
    wheel_loop: Rc<RefCell<Option<FrameHandle>>>,
    listener: Rc<RefCell<Option<js_sys::Function>>>,
}

impl Default for WebVault {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WebVault {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebVault {
        let settings = VaultSettings::load();
        WebVault {
            inner: Rc::new(RefCell::new(Vault::new(settings))),
            countdown_loop: Rc::new(RefCell::new(None)),
            wheel_loop: Rc::new(RefCell::new(None)),
            listener: Rc::new(RefCell::new(None)),
        }
    }

    /// Called with the JSON view after every change
    pub fn set_listener(&self, listener: js_sys::Function) {
        *self.listener.borrow_mut() = Some(listener);
    }

    pub fn select_mode(&self, restore: bool) -> Result<(), JsValue> {
        let mode = if restore {
            VaultMode::Restore
        } else {
            VaultMode::New
        };
        self.dispatch(VaultAction::SelectMode(mode))
    }

    /// Upload an image already encoded as a data URL
    pub fn upload(&self, file_name: String, data_url: String) -> Result<(), JsValue> {
        let limit = self.inner.borrow().settings().max_image_bytes;
        // base64 inflates by 4/3, plus room for the data URL header
        if data_url.len() > limit.saturating_mul(4) / 3 + 64 {
            return Err(to_js(crate::VaultError::ImageTooLarge {
                size: data_url.len(),
                limit,
            }));
        }
        self.dispatch(VaultAction::UploadImage {
            file_name,
            image: ImageData::from_encoded(data_url),
        })
    }

    /// Read a `File` from an input and upload it
    pub fn upload_file(&self, file: File) -> js_sys::Promise {
        let this = self.share();
        future_to_promise(async move {
            let buffer = JsFuture::from(file.array_buffer()).await?;
            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
            let limit = this.inner.borrow().settings().max_image_bytes;
            let image = ImageData::from_bytes(&bytes, &file.type_(), limit).map_err(to_js)?;
            this.dispatch(VaultAction::UploadImage {
                file_name: file.name(),
                image,
            })?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Import backup text
    pub fn restore(&self, text: String) -> Result<(), JsValue> {
        self.dispatch(VaultAction::RestoreBackup {
            bytes: text.into_bytes(),
        })
    }

    /// Read a backup `File` and import it
    pub fn restore_file(&self, file: File) -> js_sys::Promise {
        let this = self.share();
        future_to_promise(async move {
            let text = JsFuture::from(file.text()).await?;
            let text = text.as_string().unwrap_or_default();
            this.restore(text)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn set_duration(&self, hours: u32, minutes: u32, seconds: u32) -> Result<(), JsValue> {
        self.dispatch(VaultAction::SetDuration(DurationInput::new(
            hours as u64,
            minutes as u64,
            seconds as u64,
        )))
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::Start)
    }

    pub fn proceed_without_backup(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::ProceedWithoutBackup)
    }

    pub fn dismiss_backup_warning(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::DismissBackupWarning)
    }

    pub fn export_backup(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::ExportBackup)
    }

    pub fn export_mid_run(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::ExportMidRun)
    }

    pub fn abort(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::Abort)
    }

    pub fn open_wheel(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::OpenWheel)
    }

    pub fn spin(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::SpinWheel)
    }

    pub fn close_wheel(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::CloseWheel)
    }

    pub fn reset(&self) -> Result<(), JsValue> {
        self.dispatch(VaultAction::Reset)
    }

    /// Current settings as JSON
    pub fn settings(&self) -> String {
        serde_json::to_string(self.inner.borrow().settings()).unwrap_or_default()
    }

    /// Replace the settings from JSON (missing fields take defaults) and
    /// persist them to LocalStorage
    pub fn set_settings(&self, json: String) -> Result<(), JsValue> {
        let settings: VaultSettings = serde_json::from_str(&json).map_err(to_js)?;
        settings.save();
        self.inner.borrow_mut().set_settings(settings);
        self.notify();
        Ok(())
    }

    /// JSON snapshot of everything the page renders
    pub fn view(&self) -> String {
        view_json(&self.inner.borrow())
    }
}

impl WebVault {
    fn share(&self) -> WebVault {
        WebVault {
            inner: self.inner.clone(),
            countdown_loop: self.countdown_loop.clone(),
            wheel_loop: self.wheel_loop.clone(),
            listener: self.listener.clone(),
        }
    }

    fn dispatch(&self, action: VaultAction) -> Result<(), JsValue> {
        let notices = self.inner.borrow_mut().dispatch(action).map_err(to_js)?;
        self.handle_notices(&notices);
        self.ensure_loops();
        self.notify();
        Ok(())
    }

    fn handle_notices(&self, notices: &[VaultNotice]) {
        for notice in notices {
            if let VaultNotice::BackupReady(artifact) = notice {
                if let Err(e) = download(artifact) {
                    log::error!("Download of {} failed: {:?}", artifact.file_name, e);
                }
            }
        }
    }

    fn notify(&self) {
        if let Some(listener) = self.listener.borrow().as_ref() {
            let view = JsValue::from_str(&self.view());
            let _ = listener.call1(&JsValue::NULL, &view);
        }
    }

    /// Schedule a rAF loop for any handle the vault started since last time
    fn ensure_loops(&self) {
        let (countdown, wheel) = {
            let vault = self.inner.borrow();
            (vault.countdown_handle(), vault.wheel_handle())
        };

        if let Some(handle) = countdown {
            if replace_if_new(&self.countdown_loop, &handle) {
                run_loop(self.share(), handle, Vault::countdown_frame);
            }
        }
        if let Some(handle) = wheel {
            if replace_if_new(&self.wheel_loop, &handle) {
                run_loop(self.share(), handle, Vault::wheel_frame);
            }
        }
    }
}

fn replace_if_new(slot: &RefCell<Option<FrameHandle>>, handle: &FrameHandle) -> bool {
    let mut slot = slot.borrow_mut();
    if slot.as_ref().is_some_and(|h| h.same_loop(handle)) {
        return false;
    }
    *slot = Some(handle.clone());
    true
}

fn run_loop(web: WebVault, handle: FrameHandle, step: fn(&mut Vault) -> Vec<VaultNotice>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |_time: f64| {
        if !handle.is_active() {
            return;
        }
        let notices = step(&mut web.inner.borrow_mut());
        web.handle_notices(&notices);
        web.ensure_loops();
        if !notices.is_empty() || handle.is_active() {
            web.notify();
        }
        if handle.is_active() {
            run_loop(web, handle, step);
        }
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Offer an artifact as a file download
fn download(artifact: &BackupArtifact) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| to_js("no window"))?;
    let document = window.document().ok_or_else(|| to_js("no document"))?;
    let body = document.body().ok_or_else(|| to_js("no body"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(artifact.bytes.as_slice()));
    let options = BlobPropertyBag::new();
    options.set_type(artifact.mime());
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let link: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    link.set_href(&url);
    link.set_download(&artifact.file_name);
    body.append_child(&link)?;
    link.click();
    body.remove_child(&link)?;
    Url::revoke_object_url(&url)?;

    log::info!("Downloaded {}", artifact.file_name);
    Ok(())
}

fn view_json(vault: &Vault) -> String {
    let session = vault.session();
    let now = vault.now_ms();
    let game = &session.game;
    let wheel = session.wheel.as_ref().map(|w| {
        let phase = match w.phase {
            WheelPhase::Idle => "idle",
            WheelPhase::Spinning(_) => "spinning",
            WheelPhase::Landed { .. } => "landed",
        };
        serde_json::json!({
            "rotation": w.rotation,
            "phase": phase,
            "landed": w.landed_sector().map(|s| serde_json::json!({
                "label": s.label,
                "delta_ms": s.delta_ms,
            })),
        })
    });
    let time_left_ms = if session.status == VaultStatus::Running {
        session.time_left_ms
    } else {
        session.duration_seconds().saturating_mul(1000)
    };

    serde_json::json!({
        "status": session.status.as_str(),
        "mode": session.mode,
        "file_name": session.file_name,
        "image": (session.status == VaultStatus::Revealed)
            .then(|| session.image.as_ref().map(|i| i.as_str()))
            .flatten(),
        "duration": session.duration,
        "time_left_ms": time_left_ms,
        "time_left": vault.settings().format_remaining(time_left_ms),
        "time_locked": session.time_locked,
        "has_downloaded_backup": session.has_downloaded_backup,
        "backup_warning": session.backup_warning,
        "abort_armed": session.is_abort_armed(now),
        "game": {
            "attempts": game.attempts_remaining,
            "cooldown": game.is_cooling_down()
                .then(|| format_cooldown(game.cooldown_remaining_ms(now))),
            "seed_tag": game.seed_tag(),
            "can_open": session.can_open_wheel(),
        },
        "wheel": wheel,
    })
    .to_string()
}
