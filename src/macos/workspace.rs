//! Running applications: bundle identifiers, pids and launching

use crate::{FlickTileError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Access to the set of running applications
pub trait ApplicationProvider: Send + Sync {
    /// Bundle identifier of the application owning `pid`
    fn bundle_id_for_pid(&self, pid: i32) -> Option<String>;

    /// Pid of a running instance of `bundle_id`
    fn running_pid(&self, bundle_id: &str) -> Option<i32>;

    /// Ask the system to launch `bundle_id` without waiting for it
    fn launch(&self, bundle_id: &str) -> Result<()>;

    /// Pid of this process, whose own windows are never managed
    fn own_pid(&self) -> i32 {
        std::process::id() as i32
    }
}

#[derive(Debug, Default)]
struct Registry {
    running: HashMap<String, i32>,
    installed: HashMap<String, i32>,
    launched: Vec<String>,
}

/// In-memory application registry for tests
///
/// Installed applications start running (under their preassigned pid) as soon
/// as they are launched.
#[derive(Debug, Default)]
pub struct InMemoryApplicationProvider {
    registry: RwLock<Registry>,
}

impl InMemoryApplicationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_running(self, bundle_id: impl Into<String>, pid: i32) -> Self {
        if let Ok(mut registry) = self.registry.write() {
            registry.running.insert(bundle_id.into(), pid);
        }
        self
    }

    pub fn with_installed(self, bundle_id: impl Into<String>, pid: i32) -> Self {
        if let Ok(mut registry) = self.registry.write() {
            registry.installed.insert(bundle_id.into(), pid);
        }
        self
    }

    /// Bundle identifiers passed to [`ApplicationProvider::launch`], in order
    pub fn launched(&self) -> Vec<String> {
        self.registry
            .read()
            .map(|r| r.launched.clone())
            .unwrap_or_default()
    }
}

impl ApplicationProvider for InMemoryApplicationProvider {
    fn bundle_id_for_pid(&self, pid: i32) -> Option<String> {
        let registry = self.registry.read().ok()?;
        registry
            .running
            .iter()
            .find(|(_, &p)| p == pid)
            .map(|(bundle, _)| bundle.clone())
    }

    fn running_pid(&self, bundle_id: &str) -> Option<i32> {
        self.registry.read().ok()?.running.get(bundle_id).copied()
    }

    fn launch(&self, bundle_id: &str) -> Result<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| FlickTileError::MacOSAPIError("registry poisoned".into()))?;
        registry.launched.push(bundle_id.to_string());
        let pid = registry
            .installed
            .get(bundle_id)
            .copied()
            .ok_or_else(|| FlickTileError::MacOSAPIError(format!("unable to find application {bundle_id}")))?;
        registry.running.insert(bundle_id.to_string(), pid);
        Ok(())
    }
}

/// NSWorkspace-backed provider
#[derive(Debug, Default)]
pub struct SystemApplicationProvider;

impl SystemApplicationProvider {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl ApplicationProvider for SystemApplicationProvider {
    fn bundle_id_for_pid(&self, pid: i32) -> Option<String> {
        use cocoa::base::{id, nil};
        use objc::{class, msg_send, sel, sel_impl};

        unsafe {
            let app: id = msg_send![class!(NSRunningApplication), runningApplicationWithProcessIdentifier: pid];
            if app == nil {
                return None;
            }
            let bundle: id = msg_send![app, bundleIdentifier];
            nsstring_to_string(bundle)
        }
    }

    fn running_pid(&self, bundle_id: &str) -> Option<i32> {
        use cocoa::base::{id, nil};
        use cocoa::foundation::{NSArray, NSString};
        use objc::{class, msg_send, sel, sel_impl};

        unsafe {
            let key = NSString::alloc(nil).init_str(bundle_id);
            let apps: id = msg_send![class!(NSRunningApplication), runningApplicationsWithBundleIdentifier: key];
            let _: () = msg_send![key, release];
            if apps == nil || apps.count() == 0 {
                return None;
            }
            let app: id = apps.objectAtIndex(0);
            let pid: i32 = msg_send![app, processIdentifier];
            Some(pid)
        }
    }

    fn launch(&self, bundle_id: &str) -> Result<()> {
        use anyhow::Context;

        let status = std::process::Command::new("open")
            .args(["-g", "-b", bundle_id])
            .status()
            .context("failed to run open")?;
        if status.success() {
            Ok(())
        } else {
            Err(FlickTileError::MacOSAPIError(format!("open -b {bundle_id} exited with {status}")).into())
        }
    }
}

#[cfg(target_os = "macos")]
unsafe fn nsstring_to_string(value: cocoa::base::id) -> Option<String> {
    use cocoa::base::nil;
    use cocoa::foundation::NSString;

    if value == nil {
        return None;
    }
    let bytes = value.UTF8String();
    if bytes.is_null() {
        return None;
    }
    Some(std::ffi::CStr::from_ptr(bytes).to_string_lossy().into_owned())
}

#[cfg(not(target_os = "macos"))]
impl ApplicationProvider for SystemApplicationProvider {
    fn bundle_id_for_pid(&self, _pid: i32) -> Option<String> {
        None
    }

    fn running_pid(&self, _bundle_id: &str) -> Option<i32> {
        None
    }

    fn launch(&self, bundle_id: &str) -> Result<()> {
        Err(FlickTileError::MacOSAPIError(format!(
            "cannot launch {bundle_id} on this platform"
        ))
        .into())
    }
}
