//! Best-effort removal of the transient script when the process is told to
//! stop while the script exists.
//!
//! One path at a time is registered. Handlers are installed on first use.

use once_cell::sync::Lazy;
use std::path::Path;
use tracing::warn;

static INSTALLED: Lazy<bool> = Lazy::new(|| match imp::install() {
    Ok(()) => true,
    Err(e) => {
        warn!(error = %e, "could not install termination handlers");
        false
    }
});

pub(crate) fn arm(path: &Path) {
    if *INSTALLED {
        imp::arm(path);
    }
}

pub(crate) fn disarm() {
    if *INSTALLED {
        imp::disarm();
    }
}

#[cfg(unix)]
mod imp {
    use nix::{
        libc,
        sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal},
    };
    use std::{
        ffi::CString,
        os::{raw::c_char, unix::ffi::OsStrExt},
        path::Path,
        ptr,
        sync::atomic::{AtomicPtr, Ordering},
    };

    const SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

    static PENDING: AtomicPtr<c_char> = AtomicPtr::new(ptr::null_mut());

    extern "C" fn on_signal(signo: libc::c_int) {
        let path = PENDING.swap(ptr::null_mut(), Ordering::SeqCst);
        // Only async-signal-safe calls from here on.
        unsafe {
            if !path.is_null() {
                libc::unlink(path);
            }
            libc::_exit(128 + signo);
        }
    }

    pub(super) fn install() -> nix::Result<()> {
        let action = SigAction::new(
            SigHandler::Handler(on_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        for signal in SIGNALS {
            // SAFETY: the handler only touches an atomic and calls
            // async-signal-safe libc functions.
            unsafe { sigaction(signal, &action) }?;
        }
        Ok(())
    }

    pub(super) fn arm(path: &Path) {
        let Ok(path) = CString::new(path.as_os_str().as_bytes()) else {
            return;
        };
        release(PENDING.swap(path.into_raw(), Ordering::SeqCst));
    }

    pub(super) fn disarm() {
        release(PENDING.swap(ptr::null_mut(), Ordering::SeqCst));
    }

    fn release(path: *mut c_char) {
        if !path.is_null() {
            // SAFETY: every non-null value stored in `PENDING` came from
            // `CString::into_raw`, and the swap made us its only owner.
            drop(unsafe { CString::from_raw(path) });
        }
    }
}

#[cfg(windows)]
mod imp {
    use once_cell::sync::Lazy;
    use std::{
        path::{Path, PathBuf},
        sync::Mutex,
    };
    use windows::Win32::{
        Foundation::{BOOL, FALSE, TRUE},
        System::Console::SetConsoleCtrlHandler,
    };

    static PENDING: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

    // Runs on its own thread; returning FALSE lets the default handler
    // terminate the process.
    unsafe extern "system" fn on_console_event(_ctrl_type: u32) -> BOOL {
        if let Ok(mut pending) = PENDING.lock() {
            if let Some(path) = pending.take() {
                let _ = std::fs::remove_file(path);
            }
        }
        FALSE
    }

    pub(super) fn install() -> windows::core::Result<()> {
        // SAFETY: `on_console_event` matches PHANDLER_ROUTINE.
        unsafe { SetConsoleCtrlHandler(Some(on_console_event), TRUE) }
    }

    pub(super) fn arm(path: &Path) {
        if let Ok(mut pending) = PENDING.lock() {
            *pending = Some(path.to_owned());
        }
    }

    pub(super) fn disarm() {
        if let Ok(mut pending) = PENDING.lock() {
            *pending = None;
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod imp {
    use std::path::Path;

    pub(super) fn install() -> std::io::Result<()> {
        Ok(())
    }

    pub(super) fn arm(_path: &Path) {}

    pub(super) fn disarm() {}
}
