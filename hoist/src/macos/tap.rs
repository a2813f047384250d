use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::mpsc::{self as std_mpsc, Sender};
use std::thread;

use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_foundation_sys::runloop::{CFRunLoopGetCurrent, CFRunLoopRef, CFRunLoopStop};
use core_graphics::event::{
    CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, CallbackResult, EventField,
};

use crate::app::channels::MainEvent;
use crate::hotkey::{Hotkey, Modifiers};

/// Live event tap. Dropping it stops the capture thread's run loop and joins
/// the thread, releasing the system-wide hook.
pub struct TapHandle {
    runloop: AtomicPtr<std::ffi::c_void>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for TapHandle {
    fn drop(&mut self) {
        let runloop = self.runloop.swap(ptr::null_mut(), Ordering::AcqRel);
        if !runloop.is_null() {
            unsafe { CFRunLoopStop(runloop as CFRunLoopRef) };
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Install a `CGEventTap` for `hotkey` on a dedicated run-loop thread.
/// Matching key-down events are swallowed and reported as a toggle gesture.
pub fn install_tap(hotkey: Hotkey, tx: Sender<MainEvent>) -> Result<TapHandle, String> {
    let (ready_tx, ready_rx) = std_mpsc::channel::<Result<usize, String>>();

    let thread = thread::Builder::new()
        .name("hoist-hotkey-tap".to_string())
        .spawn(move || {
            let tap = match CGEventTap::new(
                CGEventTapLocation::Session,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::Default,
                vec![CGEventType::KeyDown],
                move |_proxy, _event_type, event| {
                    let key_code =
                        event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                    let flags = event.get_flags();

                    let mut modifiers = Modifiers::default();
                    if flags.contains(CGEventFlags::CGEventFlagCommand) {
                        modifiers.insert(Modifiers::CMD);
                    }
                    if flags.contains(CGEventFlags::CGEventFlagAlternate) {
                        modifiers.insert(Modifiers::ALT);
                    }
                    if flags.contains(CGEventFlags::CGEventFlagControl) {
                        modifiers.insert(Modifiers::CTRL);
                    }
                    if flags.contains(CGEventFlags::CGEventFlagShift) {
                        modifiers.insert(Modifiers::SHIFT);
                    }

                    if key_code == hotkey.key_code && modifiers == hotkey.modifiers {
                        tracing::debug!("Hotkey matched, requesting toggle");
                        if tx.send(MainEvent::HotkeyPressed).is_err() {
                            tracing::error!("Failed to deliver hotkey gesture");
                        }
                        return CallbackResult::Drop;
                    }

                    CallbackResult::Keep
                },
            ) {
                Ok(tap) => tap,
                Err(_) => {
                    let _ = ready_tx.send(Err(
                        "Failed to create event tap. Make sure Accessibility permission is granted."
                            .to_string(),
                    ));
                    return;
                }
            };

            tap.enable();

            let source = match tap.mach_port().create_runloop_source(0) {
                Ok(source) => source,
                Err(_) => {
                    let _ = ready_tx.send(Err("Failed to create run loop source".to_string()));
                    return;
                }
            };

            CFRunLoop::get_current().add_source(&source, unsafe { kCFRunLoopCommonModes });

            let runloop = unsafe { CFRunLoopGetCurrent() };
            let _ = ready_tx.send(Ok(runloop as usize));

            CFRunLoop::run_current();
        })
        .map_err(|e| format!("Failed to spawn hotkey tap thread: {}", e))?;

    match ready_rx.recv() {
        Ok(Ok(runloop)) => Ok(TapHandle {
            runloop: AtomicPtr::new(runloop as *mut std::ffi::c_void),
            thread: Some(thread),
        }),
        Ok(Err(e)) => {
            let _ = thread.join();
            Err(e)
        }
        Err(_) => Err("Hotkey tap thread exited unexpectedly".to_string()),
    }
}
