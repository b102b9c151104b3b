//! Default placement of the keyboard and menu panels in front of the head.

use presence_shared::frame::Transform;
use presence_shared::vec3::{add, vec3, yaw_only, Vec3};

use crate::keyboard::{KEYBOARD_HEIGHT, KEYBOARD_WIDTH};
use crate::links::GRID_ROWS;
use crate::surface::{Surface, SurfaceKind};
use crate::url_bar::{URL_BAR_HEIGHT, URL_BAR_WIDTH};

pub const KEYBOARD_WORLD_WIDTH: f32 = 1.0;
pub const KEYBOARD_WORLD_HEIGHT: f32 = KEYBOARD_WORLD_WIDTH * KEYBOARD_HEIGHT / KEYBOARD_WIDTH;
pub const URL_BAR_WORLD_WIDTH: f32 = 3.0;
pub const URL_BAR_WORLD_HEIGHT: f32 = URL_BAR_WORLD_WIDTH * URL_BAR_HEIGHT / URL_BAR_WIDTH;
/// Grid rows are as tall as the address bar.
pub const GRID_ROW_WORLD_HEIGHT: f32 = URL_BAR_WORLD_HEIGHT;

const KEYBOARD_OFFSET: Vec3 = Vec3 {
    x: 0.0,
    y: -0.5,
    z: -1.0,
};
const MENU_OFFSET: Vec3 = Vec3 {
    x: 0.0,
    y: 0.5,
    z: -2.0,
};

/// What the UI layers look like this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerState {
    pub visible: bool,
    /// Vertical scale of the keyboard and menu panels
    pub scale: f32,
    /// Grid rows that have a link behind them
    pub link_rows: usize,
}

/// Supplies the ordered candidate surfaces for the resolver.
pub trait SurfaceProvider {
    /// The menu is about to open; panels may move in front of `head`.
    fn place(&mut self, _head: &Transform) {}

    /// Keyboard first, then address bar, then grid rows top to bottom.
    fn candidates(&self, layers: &LayerState) -> Vec<Surface>;
}

/// Keyboard below and in front of the head, address bar and link grid
/// further out above it. Both face the head's heading.
#[derive(Debug, Clone, Default)]
pub struct PanelLayout {
    keyboard: Transform,
    menu: Transform,
}

impl PanelLayout {
    pub fn keyboard_anchor(&self) -> Transform {
        self.keyboard
    }

    pub fn menu_anchor(&self) -> Transform {
        self.menu
    }
}

impl SurfaceProvider for PanelLayout {
    fn place(&mut self, head: &Transform) {
        let heading = yaw_only(head.orientation);
        self.keyboard = Transform {
            position: add(head.position, heading.rotate(KEYBOARD_OFFSET)),
            orientation: heading,
        };
        self.menu = Transform {
            position: add(head.position, heading.rotate(MENU_OFFSET)),
            orientation: heading,
        };
    }

    fn candidates(&self, layers: &LayerState) -> Vec<Surface> {
        if !layers.visible {
            return Vec::new();
        }
        let s = layers.scale;
        let mut out = Vec::with_capacity(2 + GRID_ROWS);

        let kh = KEYBOARD_WORLD_HEIGHT * s;
        out.push(panel(
            SurfaceKind::Keyboard,
            &self.keyboard,
            KEYBOARD_WORLD_WIDTH,
            kh / 2.0,
            kh,
        ));

        let uh = URL_BAR_WORLD_HEIGHT * s;
        out.push(panel(
            SurfaceKind::AddressBar,
            &self.menu,
            URL_BAR_WORLD_WIDTH,
            uh / 2.0,
            uh,
        ));

        let rh = GRID_ROW_WORLD_HEIGHT * s;
        for row in 0..layers.link_rows.min(GRID_ROWS) {
            let top = -uh / 2.0 - row as f32 * rh;
            out.push(panel(
                SurfaceKind::GridRow(row),
                &self.menu,
                URL_BAR_WORLD_WIDTH,
                top,
                rh,
            ));
        }
        out
    }
}

/// Panel of `width` x `height` whose top edge sits `top` above the anchor.
fn panel(kind: SurfaceKind, anchor: &Transform, width: f32, top: f32, height: f32) -> Surface {
    let corner = |x: f32, y: f32| add(anchor.position, anchor.orientation.rotate(vec3(x, y, 0.0)));
    Surface::from_corners(
        kind,
        corner(-width / 2.0, top),
        corner(width / 2.0, top),
        corner(-width / 2.0, top - height),
    )
}
