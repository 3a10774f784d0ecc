use scene_core::SceneError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Element `id` as `T`; absent or mistyped elements are a page configuration
/// error.
pub fn element<T: JsCast>(document: &web::Document, id: &str) -> Result<T, SceneError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| SceneError::MissingElement(id.to_string()))
}

pub fn create<T: JsCast>(document: &web::Document, tag: &str) -> anyhow::Result<T> {
    document
        .create_element(tag)
        .map_err(js_error)?
        .dyn_into::<T>()
        .map_err(|_| anyhow::anyhow!("<{tag}> has an unexpected type"))
}

/// `display:none` toggling, leaving other inline styles alone.
pub fn set_shown(el: &web::HtmlElement, shown: bool) {
    let style = el.style();
    if shown {
        _ = style.remove_property("display");
    } else {
        _ = style.set_property("display", "none");
    }
}

/// Checkbox followed by a caption line, the layout of the settings lists.
pub fn append_checkbox(
    document: &web::Document,
    container: &web::Element,
    id: &str,
    name: &str,
    caption: &str,
    checked: bool,
) -> anyhow::Result<()> {
    let checkbox: web::HtmlInputElement = create(document, "input")?;
    checkbox.set_type("checkbox");
    checkbox.set_id(id);
    checkbox.set_name(name);
    checkbox.set_checked(checked);
    let caption_node: web::HtmlElement = create(document, "span")?;
    caption_node.set_text_content(Some(caption));
    caption_node.append_child(&create::<web::Element>(document, "br")?).map_err(js_error)?;
    container.append_child(&checkbox).map_err(js_error)?;
    container.append_child(&caption_node).map_err(js_error)?;
    Ok(())
}

/// Whether a key event started inside a text field.
pub fn in_text_input(event: &web::Event) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<web::Element>().ok())
        .map(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA"))
        .unwrap_or(false)
}

pub fn js_error(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}
