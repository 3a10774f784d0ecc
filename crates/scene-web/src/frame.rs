use crate::host::WebHost;
use scene_core::{Session, Shared};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub session: Shared<Session>,
    pub host: Shared<WebHost>,
}

impl FrameContext {
    pub fn new(session: Shared<Session>, host: Shared<WebHost>) -> Self {
        Self { session, host }
    }

    pub fn frame(&mut self) {
        let mut session = self.session.borrow_mut();
        session.frame();
        let mut host = self.host.borrow_mut();
        host.stage.draw(&mut session);
        host.collect_retired();
    }
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx.borrow_mut().frame();
        request_frame(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}
