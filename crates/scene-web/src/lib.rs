#![cfg(target_arch = "wasm32")]
//! Browser front-end: reads the exported scene document from the page,
//! builds the session, mirrors it into three.js and wires the settings panel.

mod dom;
mod frame;
mod host;
mod mirror;
mod three;

use host::{Stage, WebHost};
use instant::Instant;
use scene_core::constants::{ids, SCENE_DATA_ELEMENT};
use scene_core::{Host, SceneData, SceneError, Session};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("scene-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let started = Instant::now();
    let window = web::window().ok_or_else(|| SceneError::MissingRenderContext("window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| SceneError::MissingRenderContext("document".into()))?;

    let text = document
        .get_element_by_id(SCENE_DATA_ELEMENT)
        .and_then(|el| el.text_content())
        .ok_or_else(|| SceneError::MissingElement(SCENE_DATA_ELEMENT.into()))?;
    let data = SceneData::from_json(&text)?;

    let container: web::HtmlElement =
        dom::element(&document, &data.config.element_id(ids::CANVAS_CONTAINER))?;
    let session = Rc::new(RefCell::new(Session::from_data(&data)));
    let stage = Stage::new(container, &session.borrow())?;
    let host = Rc::new(RefCell::new(WebHost::new(window.clone(), document, stage)));

    scene_core::bind(&session, &host)?;
    let aspect = host.borrow().viewport_aspect();
    session.borrow_mut().resize(aspect);
    wire_resize(&window, session.clone(), host.clone());

    frame::start_loop(Rc::new(RefCell::new(frame::FrameContext::new(
        session, host,
    ))));
    log::info!("[init] ready in {:?}", started.elapsed());
    Ok(())
}

/// Refit renderer sizes and the active projection when the window resizes.
fn wire_resize(
    window: &web::Window,
    session: scene_core::Shared<Session>,
    host: scene_core::Shared<WebHost>,
) {
    let closure = Closure::wrap(Box::new(move || {
        let aspect = {
            let h = host.borrow();
            h.stage.resize();
            h.viewport_aspect()
        };
        session.borrow_mut().resize(aspect);
    }) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        .ok();
    closure.forget();
}
