//! SVG screenshots of the current view.

use crate::camera::Camera;
use crate::display::DisplayState;
use crate::error::Result;
use crate::host::{Delivery, Host, VectorRenderer};
use crate::scene::{ObjectKind, SceneGraph};
use smallvec::SmallVec;

/// Render `scene` through `renderer` with every visible label kind hidden.
/// Label visibility is restored afterwards, also when rendering fails.
pub fn render_without_labels(
    scene: &mut SceneGraph,
    display: &DisplayState,
    camera: &Camera,
    renderer: &mut impl VectorRenderer,
) -> Result<String> {
    let hidden: SmallVec<[ObjectKind; 2]> = ObjectKind::ALL
        .into_iter()
        .filter(|k| k.is_label() && display.is_kind_visible(*k))
        .collect();
    set_kinds_visible(scene, &hidden, false);
    let markup = renderer.render_svg(scene, camera);
    set_kinds_visible(scene, &hidden, true);
    markup
}

fn set_kinds_visible(scene: &mut SceneGraph, kinds: &[ObjectKind], visible: bool) {
    for kind in kinds {
        for name in kind.object_names() {
            scene.set_visibility(visible, name);
        }
    }
}

pub fn delivery(open_in_tab: bool, file_name: &str) -> Delivery {
    if open_in_tab {
        Delivery::NewTab
    } else {
        Delivery::Download {
            file_name: file_name.to_string(),
        }
    }
}

/// Render the view and hand the markup to the host. `tab_toggle` is the
/// checkbox choosing between a new tab and a file download.
pub fn take_screenshot(
    host: &mut impl Host,
    scene: &mut SceneGraph,
    display: &DisplayState,
    camera: &Camera,
    tab_toggle: &str,
    file_name: &str,
) -> Result<()> {
    let open_in_tab = host.is_checked(tab_toggle)?;
    let markup = render_without_labels(scene, display, camera, &mut *host)?;
    log::info!("[svg] {} bytes", markup.len());
    host.deliver_svg(&markup, &delivery(open_in_tab, file_name))
}
