// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The events every registry knows about: native input events and the
//! scheduler's own synthetic events.

use super::keyboard::{Keys, ModifierKeys};
use super::kind::EventKind;
use super::mouse::MouseButton;
use super::schema::EventSchema;
use super::typed::TypedEvent;

crate::typed_event! {
    /// A key was pressed.
    pub struct KeyDown [EventKind::KEY_DOWN] {
        /// The key.
        key: Keys => "key",
        /// The modifiers held at the time.
        modifiers: ModifierKeys => "mod",
        /// The character the key produced, if any.
        unicode: String => "unicode",
    }
}

crate::typed_event! {
    /// A key was released.
    pub struct KeyUp [EventKind::KEY_UP] {
        /// The key.
        key: Keys => "key",
        /// The modifiers held at the time.
        modifiers: ModifierKeys => "mod",
        /// The character the key produced, if any.
        unicode: String => "unicode",
    }
}

crate::typed_event! {
    /// A mouse button was pressed.
    pub struct MouseButtonDown [EventKind::MOUSE_BUTTON_DOWN] {
        /// Pointer position in window pixels.
        pos: (i64, i64) => "pos",
        /// The button.
        button: MouseButton => "button",
        /// Whether the event came from a touch device.
        touch: bool => "touch",
    }
}

crate::typed_event! {
    /// A mouse button was released.
    pub struct MouseButtonUp [EventKind::MOUSE_BUTTON_UP] {
        /// Pointer position in window pixels.
        pos: (i64, i64) => "pos",
        /// The button.
        button: MouseButton => "button",
        /// Whether the event came from a touch device.
        touch: bool => "touch",
    }
}

crate::typed_event! {
    /// The mouse wheel was scrolled.
    pub struct MouseWheelScroll [EventKind::MOUSE_WHEEL] {
        /// Whether the platform inverts the scroll direction.
        flipped: bool => "flipped",
        /// Horizontal steps.
        x: i64 => "x",
        /// Vertical steps.
        y: i64 => "y",
        /// Whether the event came from a touch device.
        touch: bool => "touch",
        /// Horizontal scroll amount with sub-step precision.
        precise_x: f64 => "precise_x",
        /// Vertical scroll amount with sub-step precision.
        precise_y: f64 => "precise_y",
    }
}

crate::typed_event! {
    /// The pointer moved.
    pub struct MouseMove [EventKind::MOUSE_MOTION] {
        /// Pointer position in window pixels.
        pos: (i64, i64) => "pos",
        /// Movement since the previous motion event.
        rel: (i64, i64) => "rel",
        /// Left, middle and right button state.
        buttons: (i64, i64, i64) => "buttons",
        /// Whether the event came from a touch device.
        touch: bool => "touch",
    }
}

crate::typed_event! {
    /// Text was entered.
    pub struct TextInput [EventKind::TEXT_INPUT] {
        /// The entered text.
        text: String => "text",
    }
}

crate::typed_event! {
    /// The user asked the application to quit.
    pub struct Quit [EventKind::QUIT] {}
}

crate::typed_event! {
    /// The window was resized.
    pub struct VideoResize [EventKind::VIDEO_RESIZE] {
        /// The new size.
        size: (i64, i64) => "size",
        /// The new width.
        w: i64 => "w",
        /// The new height.
        h: i64 => "h",
    }
}

crate::typed_event! {
    /// Synthetic: run the parked callback with this id.
    pub struct ExecuteCallback [EventKind::EXECUTE_CALLBACK] {
        /// The id of the parked callback.
        handle: i64 => "handle",
    }
}

crate::typed_event! {
    /// Synthetic: poll the task with this id.
    pub struct TaskWake [EventKind::TASK_WAKE] {
        /// The id of the task.
        task: i64 => "task",
    }
}

crate::typed_event! {
    /// Synthetic: run the callback handed over from another thread.
    pub struct RemoteCallback [EventKind::REMOTE_CALLBACK] {
        /// The id of the handed-over callback.
        handle: i64 => "handle",
    }
}

fn entry<E: TypedEvent>() -> (EventKind, EventSchema) {
    (E::KIND, E::schema())
}

pub(crate) fn schemas() -> Vec<(EventKind, EventSchema)> {
    vec![
        entry::<KeyDown>(),
        entry::<KeyUp>(),
        entry::<MouseButtonDown>(),
        entry::<MouseButtonUp>(),
        entry::<MouseWheelScroll>(),
        entry::<MouseMove>(),
        entry::<TextInput>(),
        entry::<Quit>(),
        entry::<VideoResize>(),
        entry::<ExecuteCallback>(),
        entry::<TaskWake>(),
        entry::<RemoteCallback>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventRegistry, NativeEvent};

    #[test]
    fn builtin_kinds_are_distinct() {
        let all = schemas();
        let mut kinds: Vec<_> = all.iter().map(|(kind, _)| *kind).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), all.len());
    }

    #[test]
    fn mouse_wheel_marshals_into_its_typed_form() {
        let native = NativeEvent::new(EventKind::MOUSE_WHEEL)
            .with("flipped", false)
            .with("x", 0)
            .with("y", -1)
            .with("touch", false)
            .with("precise_x", 0.0)
            .with("precise_y", -1.5);
        let event = EventRegistry::with_builtins().marshal(&native).unwrap().unwrap();
        let scroll = MouseWheelScroll::from_event(&event).unwrap();
        assert_eq!(scroll.y, -1);
        assert_eq!(scroll.precise_y, -1.5);
    }

    #[test]
    fn key_down_keeps_modifiers_in_the_mod_field() {
        let key = KeyDown {
            key: Keys::Q,
            modifiers: ModifierKeys::LCTRL,
            unicode: "q".into(),
        };
        let native = key.to_event().to_native();
        assert_eq!(native.get("mod").and_then(|v| v.as_int()), Some(0x40));
        assert_eq!(native.get("key").and_then(|v| v.as_int()), Some(113));
    }
}
