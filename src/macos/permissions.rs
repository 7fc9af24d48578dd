//! Privacy permissions FlickTile depends on
//!
//! Moving other applications' windows needs Accessibility access, and
//! observing modifier and mouse events globally needs Input Monitoring.
//! Neither can be granted programmatically; at most we can prompt and send
//! the user to the right System Settings pane.

use crate::{FlickTileError, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt;
use std::process::Command;

/// A privacy grant, named after the System Settings pane that controls it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyPane {
    Accessibility,
    InputMonitoring,
}

impl PrivacyPane {
    pub const ALL: [PrivacyPane; 2] = [PrivacyPane::Accessibility, PrivacyPane::InputMonitoring];

    fn settings_url(self) -> &'static str {
        match self {
            PrivacyPane::Accessibility => {
                "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility"
            }
            PrivacyPane::InputMonitoring => {
                "x-apple.systempreferences:com.apple.preference.security?Privacy_ListenEvents"
            }
        }
    }

    /// Whether this process currently holds the grant
    pub fn is_granted(self) -> Result<bool> {
        match self {
            PrivacyPane::Accessibility => platform::accessibility_trusted(false),
            PrivacyPane::InputMonitoring => platform::listen_event_access(),
        }
    }

    /// Show the system prompt for the grant. Returns the state afterwards.
    pub fn request(self) -> Result<bool> {
        match self {
            PrivacyPane::Accessibility => platform::accessibility_trusted(true),
            PrivacyPane::InputMonitoring => platform::request_listen_event_access(),
        }
    }

    /// Send the user to the pane in System Settings
    pub fn open_settings(self) -> Result<()> {
        if !cfg!(target_os = "macos") {
            return Err(FlickTileError::MacOSAPIError("System Settings is only available on macOS".into()).into());
        }

        let status = Command::new("open")
            .arg(self.settings_url())
            .status()
            .with_context(|| format!("failed to open the {self} pane"))?;
        if !status.success() {
            return Err(FlickTileError::MacOSAPIError(format!("`open` exited with {status}")).into());
        }
        Ok(())
    }
}

impl fmt::Display for PrivacyPane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrivacyPane::Accessibility => "Accessibility",
            PrivacyPane::InputMonitoring => "Input Monitoring",
        })
    }
}

/// Snapshot of both grants, printed by `flicktile permissions`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionReport {
    pub accessibility: bool,
    pub input_monitoring: bool,
}

impl PermissionReport {
    pub fn current() -> Result<Self> {
        Ok(Self {
            accessibility: PrivacyPane::Accessibility.is_granted()?,
            input_monitoring: PrivacyPane::InputMonitoring.is_granted()?,
        })
    }

    pub fn granted(&self, pane: PrivacyPane) -> bool {
        match pane {
            PrivacyPane::Accessibility => self.accessibility,
            PrivacyPane::InputMonitoring => self.input_monitoring,
        }
    }

    pub fn all_granted(&self) -> bool {
        PrivacyPane::ALL.iter().all(|&pane| self.granted(pane))
    }

    /// Panes the user still needs to visit
    pub fn missing(&self) -> Vec<PrivacyPane> {
        PrivacyPane::ALL.into_iter().filter(|&pane| !self.granted(pane)).collect()
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use crate::{FlickTileError, Result};
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::CFMutableDictionary;
    use core_foundation::string::CFString;
    use core_foundation_sys::dictionary::CFDictionaryRef;
    use core_foundation_sys::string::CFStringRef;

    /// kIOHIDRequestTypeListenEvent
    const LISTEN_EVENT: u32 = 1;

    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
        static kAXTrustedCheckOptionPrompt: CFStringRef;
    }

    #[link(name = "IOKit", kind = "framework")]
    extern "C" {
        fn IOHIDCheckAccess(request: u32) -> bool;
        fn IOHIDRequestAccess(request: u32) -> i32;
    }

    pub fn accessibility_trusted(prompt: bool) -> Result<bool> {
        let mut options = CFMutableDictionary::new();
        // SAFETY: the option key is a static CFString owned by the framework.
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        options.set(key, CFBoolean::from(prompt));
        Ok(unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) })
    }

    pub fn listen_event_access() -> Result<bool> {
        Ok(unsafe { IOHIDCheckAccess(LISTEN_EVENT) })
    }

    pub fn request_listen_event_access() -> Result<bool> {
        match unsafe { IOHIDRequestAccess(LISTEN_EVENT) } {
            0 => listen_event_access(),
            status => Err(FlickTileError::MacOSAPIError(format!("IOHIDRequestAccess returned {status}")).into()),
        }
    }
}

/// Off macOS the grants are simulated through environment flags so the
/// CLI can be exercised in CI.
#[cfg(not(target_os = "macos"))]
mod platform {
    use crate::Result;

    fn env_flag(name: &str) -> bool {
        std::env::var(name).is_ok_and(|value| value.eq_ignore_ascii_case("true"))
    }

    pub fn accessibility_trusted(_prompt: bool) -> Result<bool> {
        Ok(env_flag("FLICKTILE_PERMISSION_ACCESSIBILITY"))
    }

    pub fn listen_event_access() -> Result<bool> {
        Ok(env_flag("FLICKTILE_PERMISSION_INPUT_MONITORING"))
    }

    pub fn request_listen_event_access() -> Result<bool> {
        listen_event_access()
    }
}
