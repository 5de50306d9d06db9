//! List DragDrop Gesture Tracker
//!
//! Tracks one press-drag-release gesture over a flat list.
//! Uses a movement threshold to distinguish click from drag.
//! Knows nothing about rendering or persistence: the host feeds it pointer
//! events and receives a `DropPayload` when a drop lands on another item.

use serde::{Deserialize, Serialize};

/// Pointer coordinates in client pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`
    pub fn offset_from(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Element a pointer-leave event originated from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveTarget<K> {
    /// A tracked drop zone (one list item)
    Zone(K),
    /// Some descendant element inside a zone
    Inner,
}

/// Result of a successful drop, handed to the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload<K> {
    pub dragged: K,
    pub target: K,
    /// Pointer position when the drop happened
    pub pointer: Point,
    /// Pointer offset inside the grasped element at grasp time
    pub grab_offset: Point,
}

impl<K> DropPayload<K> {
    /// Where the dropped element's top-left corner visually was at drop time
    pub fn drop_origin(&self) -> Point {
        self.pointer.offset_from(self.grab_offset)
    }
}

#[derive(Clone, Copy, Debug)]
struct Grasp<K> {
    id: K,
    offset: Point,
}

#[derive(Clone, Copy, Debug)]
struct Press<K> {
    id: K,
    start: Point,
    offset: Point,
}

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// Gesture state for a single list
///
/// `idle -> grasped -> (hovering)* -> dropped | released`. All state is
/// discarded when the gesture ends, whatever the outcome.
#[derive(Clone, Debug)]
pub struct DragTracker<K> {
    press: Option<Press<K>>,
    grasp: Option<Grasp<K>>,
    hovered: Option<K>,
}

impl<K> Default for DragTracker<K> {
    fn default() -> Self {
        Self {
            press: None,
            grasp: None,
            hovered: None,
        }
    }
}

impl<K: Copy + PartialEq + std::fmt::Debug> DragTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending drag (button down, not moved yet)
    pub fn press(&mut self, id: K, pointer: Point, element_origin: Point) {
        if self.grasp.is_some() {
            return;
        }
        self.press = Some(Press {
            id,
            start: pointer,
            offset: pointer.offset_from(element_origin),
        });
    }

    /// Promote a pending press to a grasp once the pointer moved far enough.
    /// Returns true when this call started the drag.
    pub fn motion(&mut self, pointer: Point) -> bool {
        if self.grasp.is_some() {
            return false;
        }
        let Some(press) = self.press else {
            return false;
        };
        let dx = (pointer.x - press.start.x).abs();
        let dy = (pointer.y - press.start.y).abs();
        if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
            self.press = None;
            self.grasp = Some(Grasp {
                id: press.id,
                offset: press.offset,
            });
            tracing::trace!(id = ?press.id, "drag started after threshold");
            return true;
        }
        false
    }

    /// Start a drag immediately. No-op if something is already grasped.
    pub fn grasp(&mut self, id: K, pointer: Point, element_origin: Point) {
        if self.grasp.is_some() {
            return;
        }
        self.press = None;
        self.grasp = Some(Grasp {
            id,
            offset: pointer.offset_from(element_origin),
        });
        tracing::trace!(?id, "grasped");
    }

    /// Pointer entered an item while dragging
    pub fn hover(&mut self, id: K) {
        match self.grasp {
            Some(g) if g.id != id => self.hovered = Some(id),
            _ => {}
        }
    }

    /// Pointer left an element while dragging.
    ///
    /// Only leaving the currently hovered zone clears the hover; leave events
    /// bubbling up from child elements, or a late leave from a zone that was
    /// already replaced by a newer enter, are ignored.
    pub fn leave(&mut self, target: LeaveTarget<K>) {
        if let LeaveTarget::Zone(id) = target {
            if self.hovered == Some(id) {
                self.hovered = None;
            }
        }
    }

    /// Drop onto `target`. Succeeds only while grasping a different item;
    /// on success the gesture state is cleared and the payload returned.
    pub fn drop_on(&mut self, target: K, pointer: Point) -> Option<DropPayload<K>> {
        let grasp = self.grasp?;
        if grasp.id == target {
            return None;
        }
        self.clear();
        Some(DropPayload {
            dragged: grasp.id,
            target,
            pointer,
            grab_offset: grasp.offset,
        })
    }

    /// End of the drag, with or without a drop. Always safe to call.
    pub fn release(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.press = None;
        self.grasp = None;
        self.hovered = None;
    }

    pub fn grasped(&self) -> Option<K> {
        self.grasp.map(|g| g.id)
    }

    pub fn hovered(&self) -> Option<K> {
        self.hovered
    }

    pub fn grab_offset(&self) -> Option<Point> {
        self.grasp.map(|g| g.offset)
    }

    pub fn is_dragging(&self) -> bool {
        self.grasp.is_some()
    }

    pub fn is_grasped(&self, id: K) -> bool {
        self.grasped() == Some(id)
    }

    pub fn is_hovered(&self, id: K) -> bool {
        self.hovered == Some(id)
    }
}
