//! Global input observation
//!
//! A listen-only Core Graphics event tap runs on its own thread with its own
//! run loop and forwards modifier, key and mouse-move events into the
//! controller's channel as [`InputEvent`]s in layout coordinates. Because the
//! tap only listens, arrow keys pressed while a chord is held still reach the
//! focused application.

use crate::models::input::InputEvent;
use crate::Result;
use std::thread::JoinHandle;
use tokio::sync::mpsc::UnboundedSender;

#[cfg(target_os = "macos")]
pub fn spawn_event_tap(sender: UnboundedSender<InputEvent>) -> Result<JoinHandle<()>> {
    platform::spawn(sender)
}

#[cfg(not(target_os = "macos"))]
pub fn spawn_event_tap(_sender: UnboundedSender<InputEvent>) -> Result<JoinHandle<()>> {
    Err(crate::FlickTileError::MacOSAPIError(
        "global event taps are only available on macOS".into(),
    )
    .into())
}

#[cfg(target_os = "macos")]
mod platform {
    use crate::macos::coordinates::native_point_to_layout;
    use crate::models::geometry::Point;
    use crate::models::input::{InputEvent, KeyCode, ModifierFlags};
    use crate::{FlickTileError, Result};
    use anyhow::Context;
    use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
    use core_graphics::display::CGDisplay;
    use core_graphics::event::{
        CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
        CGEventTapPlacement, CGEventType, EventField,
    };
    use std::sync::mpsc;
    use std::thread::JoinHandle;
    use tokio::sync::mpsc::UnboundedSender;
    use tracing::{error, info};

    fn modifiers(flags: CGEventFlags) -> ModifierFlags {
        let mut result = ModifierFlags::empty();
        if flags.contains(CGEventFlags::CGEventFlagCommand) {
            result |= ModifierFlags::COMMAND;
        }
        if flags.contains(CGEventFlags::CGEventFlagAlternate) {
            result |= ModifierFlags::OPTION;
        }
        if flags.contains(CGEventFlags::CGEventFlagControl) {
            result |= ModifierFlags::CONTROL;
        }
        if flags.contains(CGEventFlags::CGEventFlagShift) {
            result |= ModifierFlags::SHIFT;
        }
        if flags.contains(CGEventFlags::CGEventFlagSecondaryFn) {
            result |= ModifierFlags::FUNCTION;
        }
        result
    }

    fn cursor(event: &CGEvent) -> Point {
        let location = event.location();
        let primary_height = CGDisplay::main().bounds().size.height;
        native_point_to_layout(Point::new(location.x, location.y), primary_height)
    }

    fn translate(event_type: CGEventType, event: &CGEvent) -> Option<InputEvent> {
        match event_type {
            CGEventType::FlagsChanged => Some(InputEvent::ModifiersChanged {
                modifiers: modifiers(event.get_flags()),
                cursor: cursor(event),
            }),
            CGEventType::KeyDown => {
                if event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0 {
                    return None;
                }
                let key = KeyCode(event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16);
                Some(InputEvent::KeyDown {
                    key,
                    cursor: cursor(event),
                })
            }
            CGEventType::KeyUp => {
                let key = KeyCode(event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16);
                Some(InputEvent::KeyUp { key })
            }
            CGEventType::MouseMoved
            | CGEventType::LeftMouseDragged
            | CGEventType::RightMouseDragged => Some(InputEvent::MouseMoved {
                cursor: cursor(event),
            }),
            _ => None,
        }
    }

    pub fn spawn(sender: UnboundedSender<InputEvent>) -> Result<JoinHandle<()>> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<std::result::Result<(), String>>(1);

        let handle = std::thread::Builder::new()
            .name("flicktile-event-tap".into())
            .spawn(move || {
                let tap = CGEventTap::new(
                    CGEventTapLocation::Session,
                    CGEventTapPlacement::HeadInsertEventTap,
                    CGEventTapOptions::ListenOnly,
                    vec![
                        CGEventType::FlagsChanged,
                        CGEventType::KeyDown,
                        CGEventType::KeyUp,
                        CGEventType::MouseMoved,
                        CGEventType::LeftMouseDragged,
                        CGEventType::RightMouseDragged,
                    ],
                    |_proxy, event_type, event| {
                        if let Some(input) = translate(event_type, event) {
                            // The receiver only disappears during shutdown.
                            let _ = sender.send(input);
                        }
                        None
                    },
                );

                let tap = match tap {
                    Ok(tap) => tap,
                    Err(()) => {
                        let _ = ready_tx.send(Err("CGEventTapCreate failed; is Input Monitoring granted?".into()));
                        return;
                    }
                };

                let source = match tap.mach_port.create_runloop_source(0) {
                    Ok(source) => source,
                    Err(()) => {
                        let _ = ready_tx.send(Err("unable to create run loop source for event tap".into()));
                        return;
                    }
                };

                unsafe {
                    CFRunLoop::get_current().add_source(&source, kCFRunLoopCommonModes);
                }
                tap.enable();
                info!("Event tap installed");
                let _ = ready_tx.send(Ok(()));
                CFRunLoop::run_current();
                error!("Event tap run loop exited");
            })
            .context("failed to spawn event tap thread")?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(message)) => Err(FlickTileError::PermissionDenied(message).into()),
            Err(_) => Err(FlickTileError::MacOSAPIError("event tap thread exited early".into()).into()),
        }
    }
}
