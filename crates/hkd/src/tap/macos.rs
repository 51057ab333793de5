//! CGEventTap-backed keyboard tap.

use core_foundation::runloop::{CFRunLoop, kCFRunLoopCommonModes};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    EventField,
};

use hkkeys::{Decision, EventFlags, KeyEvent, KeyEventKind};

use super::{EventTap, TapError};

pub struct CgEventTap;

impl CgEventTap {
    pub fn new() -> Self {
        CgEventTap
    }
}

impl EventTap for CgEventTap {
    fn run(&mut self, handler: &mut dyn FnMut(&KeyEvent) -> Decision) -> Result<(), TapError> {
        use std::cell::RefCell;

        let handler = RefCell::new(handler);
        let current = CFRunLoop::get_current();

        let tap = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::Default,
            vec![CGEventType::KeyDown, CGEventType::KeyUp],
            |_proxy, event_type, event| {
                let kind = match event_type {
                    CGEventType::KeyDown => KeyEventKind::Down,
                    CGEventType::KeyUp => KeyEventKind::Up,
                    // Flag churn and tap re-enable notifications flow
                    // through untouched.
                    _ => return Some(event.clone()),
                };

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let keycode =
                    event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u32;
                let is_autorepeat =
                    event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0;
                let flags = EventFlags::from_bits_truncate(event.get_flags().bits());

                let key_event = KeyEvent {
                    kind,
                    keycode,
                    flags,
                    is_autorepeat,
                };

                match (handler.borrow_mut())(&key_event) {
                    Decision::Consume => None,
                    Decision::Passthrough => Some(event.clone()),
                }
            },
        )
        .map_err(|()| TapError::CreateFailed)?;

        let source = tap
            .mach_port
            .create_runloop_source(0)
            .map_err(|()| TapError::CreateFailed)?;
        unsafe {
            current.add_source(&source, kCFRunLoopCommonModes);
        }
        tap.enable();

        CFRunLoop::run_current();
        Ok(())
    }
}
