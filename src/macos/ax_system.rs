//! Accessibility-backed provider for macOS

use super::accessibility::{
    retain_listed, AXWindow, AccessibilityProvider, PermissionStatus, WindowId, WindowListEntry,
};
use super::permissions::PrivacyPane;
use crate::models::geometry::{Point, Rect, Size};
use crate::{FlickTileError, Result};
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFRelease, CFRetain, CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{
    copy_window_info, kCGNullWindowID, kCGWindowListExcludeDesktopElements,
    kCGWindowListOptionAll, kCGWindowListOptionOnScreenOnly, CGWindowListOption,
};
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::Mutex;
use tracing::{debug, trace};

type AXError = i32;
type AXValueType = u32;

const K_AX_ERROR_SUCCESS: AXError = 0;
const K_AX_VALUE_CGPOINT_TYPE: AXValueType = 1;
const K_AX_VALUE_CGSIZE_TYPE: AXValueType = 2;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementCreateApplication(pid: i32) -> CFTypeRef;
    fn AXUIElementCopyAttributeValue(
        element: CFTypeRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> AXError;
    fn AXUIElementSetAttributeValue(
        element: CFTypeRef,
        attribute: CFStringRef,
        value: CFTypeRef,
    ) -> AXError;
    fn AXUIElementPerformAction(element: CFTypeRef, action: CFStringRef) -> AXError;
    fn AXValueCreate(value_type: AXValueType, value: *const c_void) -> CFTypeRef;
    fn AXValueGetValue(value: CFTypeRef, value_type: AXValueType, out: *mut c_void) -> bool;
    fn AXUIElementGetPid(element: CFTypeRef, pid: *mut i32) -> AXError;
    fn _AXUIElementGetWindow(element: CFTypeRef, window_id: *mut u32) -> AXError;
}

/// Owned AXUIElementRef
struct AXElement(CFTypeRef);

// Elements are only touched from the main event loop; the provider trait
// requires Send + Sync so it can be shared behind an Arc.
unsafe impl Send for AXElement {}
unsafe impl Sync for AXElement {}

impl Drop for AXElement {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) }
    }
}

impl AXElement {
    fn application(pid: i32) -> Option<Self> {
        let raw = unsafe { AXUIElementCreateApplication(pid) };
        (!raw.is_null()).then_some(Self(raw))
    }

    fn retained(raw: CFTypeRef) -> Self {
        unsafe { CFRetain(raw) };
        Self(raw)
    }

    fn attribute(&self, name: &'static str) -> std::result::Result<CFType, AXError> {
        let attribute = CFString::from_static_string(name);
        let mut value: CFTypeRef = ptr::null();
        let err = unsafe {
            AXUIElementCopyAttributeValue(self.0, attribute.as_concrete_TypeRef(), &mut value)
        };
        if err != K_AX_ERROR_SUCCESS || value.is_null() {
            return Err(err);
        }
        Ok(unsafe { CFType::wrap_under_create_rule(value) })
    }

    fn set_attribute(&self, name: &'static str, value: CFTypeRef) -> std::result::Result<(), AXError> {
        let attribute = CFString::from_static_string(name);
        let err = unsafe { AXUIElementSetAttributeValue(self.0, attribute.as_concrete_TypeRef(), value) };
        if err == K_AX_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(err)
        }
    }

    fn perform(&self, action: &'static str) -> std::result::Result<(), AXError> {
        let action = CFString::from_static_string(action);
        let err = unsafe { AXUIElementPerformAction(self.0, action.as_concrete_TypeRef()) };
        if err == K_AX_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(err)
        }
    }

    fn window_id(&self) -> Option<WindowId> {
        let mut id = 0u32;
        let err = unsafe { _AXUIElementGetWindow(self.0, &mut id) };
        (err == K_AX_ERROR_SUCCESS && id != 0).then_some(id)
    }

    fn windows(&self) -> Vec<AXElement> {
        let Ok(value) = self.attribute("AXWindows") else {
            return Vec::new();
        };
        let array: CFArray<CFType> =
            unsafe { CFArray::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
        array.iter().map(|item| AXElement::retained(item.as_CFTypeRef())).collect()
    }

    fn point(&self, name: &'static str) -> Option<CGPoint> {
        let value = self.attribute(name).ok()?;
        let mut point = CGPoint::new(0.0, 0.0);
        let ok = unsafe {
            AXValueGetValue(
                value.as_CFTypeRef(),
                K_AX_VALUE_CGPOINT_TYPE,
                &mut point as *mut CGPoint as *mut c_void,
            )
        };
        ok.then_some(point)
    }

    fn size(&self, name: &'static str) -> Option<CGSize> {
        let value = self.attribute(name).ok()?;
        let mut size = CGSize::new(0.0, 0.0);
        let ok = unsafe {
            AXValueGetValue(
                value.as_CFTypeRef(),
                K_AX_VALUE_CGSIZE_TYPE,
                &mut size as *mut CGSize as *mut c_void,
            )
        };
        ok.then_some(size)
    }

    fn string(&self, name: &'static str) -> Option<String> {
        self.attribute(name)
            .ok()?
            .downcast::<CFString>()
            .map(|s| s.to_string())
    }

    fn flag(&self, name: &'static str) -> Option<bool> {
        self.attribute(name).ok()?.downcast::<CFBoolean>().map(bool::from)
    }

    fn frame(&self) -> Option<Rect> {
        let origin = self.point("AXPosition")?;
        let size = self.size("AXSize")?;
        Some(Rect::new(origin.x, origin.y, size.width, size.height))
    }
}

fn ax_failure(operation: &str, window_id: WindowId, err: AXError) -> anyhow::Error {
    FlickTileError::MacOSAPIError(format!("{operation} failed for window {window_id} (AXError {err})"))
        .into()
}

fn dict_number(dict: &CFDictionary<CFString, CFType>, key: &'static str) -> Option<i64> {
    dict.find(&CFString::from_static_string(key))
        .and_then(|value| value.downcast::<CFNumber>())
        .and_then(|number| number.to_i64())
}

fn dict_string(dict: &CFDictionary<CFString, CFType>, key: &'static str) -> Option<String> {
    dict.find(&CFString::from_static_string(key))
        .and_then(|value| value.downcast::<CFString>())
        .map(|s| s.to_string())
}

fn dict_bounds(dict: &CFDictionary<CFString, CFType>) -> Option<Rect> {
    let value = dict.find(&CFString::from_static_string("kCGWindowBounds"))?;
    let bounds: CFDictionary =
        unsafe { CFDictionary::wrap_under_get_rule(value.as_CFTypeRef() as CFDictionaryRef) };
    let rect = CGRect::from_dict_representation(&bounds)?;
    Some(Rect::new(rect.origin.x, rect.origin.y, rect.size.width, rect.size.height))
}

/// Provider backed by CGWindowList and the Accessibility API
#[derive(Default)]
pub struct SystemAccessibilityProvider {
    elements: Mutex<HashMap<WindowId, AXElement>>,
}

impl std::fmt::Debug for SystemAccessibilityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemAccessibilityProvider").finish_non_exhaustive()
    }
}

impl SystemAccessibilityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, options: CGWindowListOption) -> Result<Vec<WindowListEntry>> {
        let array = copy_window_info(options, kCGNullWindowID).ok_or_else(|| {
            FlickTileError::MacOSAPIError("CGWindowListCopyWindowInfo returned nothing".into())
        })?;

        let mut entries = Vec::with_capacity(array.len() as usize);
        for item in array.iter() {
            let dict: CFDictionary<CFString, CFType> =
                unsafe { CFDictionary::wrap_under_get_rule(*item as CFDictionaryRef) };
            let (Some(window_id), Some(owner_pid), Some(bounds)) = (
                dict_number(&dict, "kCGWindowNumber"),
                dict_number(&dict, "kCGWindowOwnerPID"),
                dict_bounds(&dict),
            ) else {
                continue;
            };

            entries.push(WindowListEntry {
                window_id: window_id as WindowId,
                owner_pid: owner_pid as i32,
                owner_name: dict_string(&dict, "kCGWindowOwnerName").unwrap_or_default(),
                title: dict_string(&dict, "kCGWindowName"),
                layer: dict_number(&dict, "kCGWindowLayer").unwrap_or(0) as i32,
                bounds,
            });
        }
        Ok(entries)
    }

    /// Run `f` against the cached element for `window_id`, resolving it
    /// through the owning application on a cache miss.
    fn with_element<R>(&self, window_id: WindowId, f: impl FnOnce(&AXElement) -> Result<R>) -> Result<R> {
        let mut elements = self
            .elements
            .lock()
            .map_err(|_| FlickTileError::MacOSAPIError("element cache poisoned".into()))?;

        if !elements.contains_key(&window_id) {
            let listed = self.list(kCGWindowListOptionAll)?;
            retain_listed(&mut elements, &listed);
            let pid = listed
                .iter()
                .find(|entry| entry.window_id == window_id)
                .map(|entry| entry.owner_pid)
                .ok_or(FlickTileError::WindowNotFound(window_id))?;

            let app = AXElement::application(pid).ok_or(FlickTileError::WindowNotFound(window_id))?;
            for element in app.windows() {
                if let Some(id) = element.window_id() {
                    elements.insert(id, element);
                }
            }
            trace!(window_id, pid, cached = elements.len(), "Resolved accessibility elements");
        }

        let element = elements
            .get(&window_id)
            .ok_or(FlickTileError::WindowNotFound(window_id))?;
        let result = f(element);
        if result.is_err() {
            // Closed windows keep failing; force a fresh lookup next time.
            elements.remove(&window_id);
        }
        result
    }
}

impl AccessibilityProvider for SystemAccessibilityProvider {
    fn permission_status(&self) -> PermissionStatus {
        match PrivacyPane::Accessibility.is_granted() {
            Ok(true) => PermissionStatus::Granted,
            Ok(false) => PermissionStatus::Denied,
            Err(_) => PermissionStatus::Unknown,
        }
    }

    fn window_list(&self) -> Result<Vec<WindowListEntry>> {
        self.list(kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements)
    }

    fn window_frame(&self, window_id: WindowId) -> Result<Rect> {
        self.with_element(window_id, |element| {
            element
                .frame()
                .ok_or_else(|| FlickTileError::WindowNotFound(window_id).into())
        })
    }

    fn set_window_position(&self, window_id: WindowId, origin: Point) -> Result<()> {
        self.with_element(window_id, |element| {
            let point = CGPoint::new(origin.x, origin.y);
            let value = unsafe {
                AXValueCreate(K_AX_VALUE_CGPOINT_TYPE, &point as *const CGPoint as *const c_void)
            };
            if value.is_null() {
                return Err(ax_failure("AXValueCreate(position)", window_id, -1));
            }
            let result = element.set_attribute("AXPosition", value);
            unsafe { CFRelease(value) };
            result.map_err(|err| ax_failure("set AXPosition", window_id, err))
        })
    }

    fn set_window_size(&self, window_id: WindowId, size: Size) -> Result<()> {
        self.with_element(window_id, |element| {
            let cg_size = CGSize::new(size.width, size.height);
            let value = unsafe {
                AXValueCreate(K_AX_VALUE_CGSIZE_TYPE, &cg_size as *const CGSize as *const c_void)
            };
            if value.is_null() {
                return Err(ax_failure("AXValueCreate(size)", window_id, -1));
            }
            let result = element.set_attribute("AXSize", value);
            unsafe { CFRelease(value) };
            result.map_err(|err| ax_failure("set AXSize", window_id, err))
        })
    }

    fn minimum_size(&self, window_id: WindowId) -> Result<Option<Size>> {
        self.with_element(window_id, |element| {
            Ok(element
                .size("AXMinimumSize")
                .map(|s| Size::new(s.width, s.height)))
        })
    }

    fn raise_window(&self, window_id: WindowId) -> Result<()> {
        let pid = self.with_element(window_id, |element| {
            element
                .perform("AXRaise")
                .map_err(|err| ax_failure("AXRaise", window_id, err))?;
            let mut pid = 0i32;
            unsafe { AXUIElementGetPid(element.0, &mut pid) };
            Ok(pid)
        })?;

        if let Some(app) = AXElement::application(pid) {
            if let Err(err) = app.set_attribute("AXFrontmost", CFBoolean::true_value().as_CFTypeRef()) {
                debug!(pid, err, "Could not bring application to front");
            }
        }
        Ok(())
    }

    fn application_windows(&self, pid: i32) -> Result<Vec<AXWindow>> {
        let app = AXElement::application(pid).ok_or_else(|| {
            FlickTileError::MacOSAPIError(format!("no accessibility element for pid {pid}"))
        })?;

        let mut result = Vec::new();
        let mut elements = self
            .elements
            .lock()
            .map_err(|_| FlickTileError::MacOSAPIError("element cache poisoned".into()))?;
        for element in app.windows() {
            let (Some(window_id), Some(frame)) = (element.window_id(), element.frame()) else {
                continue;
            };
            result.push(AXWindow {
                window_id,
                pid,
                title: element.string("AXTitle"),
                frame,
                is_minimized: element.flag("AXMinimized").unwrap_or(false),
            });
            elements.insert(window_id, element);
        }
        Ok(result)
    }
}
