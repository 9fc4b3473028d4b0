//! Platform-specific code for serial port access permissions.

use crate::error::RfidError;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
/// macOS-specific serial permission helpers
pub mod macos;

/// Check if the current user has enough permissions to open a serial port.
///
/// # Errors
/// Returns [`RfidError::NotConnected`] if permissions are insufficient
/// (Linux only; other platforms don't gate serial access this way).
pub fn check_serial_permissions() -> Result<(), RfidError> {
    #[cfg(target_os = "linux")]
    return linux::check_serial_permissions();

    #[cfg(target_os = "windows")]
    return Ok(());

    #[cfg(target_os = "macos")]
    return Ok(());

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    return Ok(());
}

/// Print instructions for fixing serial port permission issues.
pub fn print_permission_instructions() {
    #[cfg(target_os = "linux")]
    linux::print_permission_instructions();

    #[cfg(target_os = "windows")]
    windows::print_permission_instructions();

    #[cfg(target_os = "macos")]
    macos::print_permission_instructions();

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    println!("For your platform, you may need to run this program with administrator privileges.");
}
