//! Linux-specific serial port access helpers

use crate::error::RfidError;
use std::fs;
use std::path::Path;

/// Check if the current user has enough permissions to open a serial port.
///
/// # Errors
/// Returns [`RfidError::NotConnected`] if the user is not root, not a member
/// of a serial-owning group, and no matching udev rule grants access.
pub fn check_serial_permissions() -> Result<(), RfidError> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }

    let groups = ["dialout", "uucp", "plugdev"];
    for group in groups {
        if is_user_in_group(group) {
            return Ok(());
        }
    }

    if has_serial_udev_rules() {
        return Ok(());
    }

    Err(RfidError::NotConnected)
}

/// Check if the user is in a specified group
fn is_user_in_group(group_name: &str) -> bool {
    use std::process::Command;

    // Try to use the "groups" command to check group membership
    let output = Command::new("groups").output().ok();

    if let Some(output) = output {
        if output.status.success() {
            let groups = String::from_utf8_lossy(&output.stdout);
            return groups.contains(group_name);
        }
    }

    false
}

/// Check if there are udev rules granting access to serial/TTY devices
fn has_serial_udev_rules() -> bool {
    let udev_dirs = [
        "/etc/udev/rules.d",
        "/lib/udev/rules.d",
        "/usr/lib/udev/rules.d",
    ];

    for dir in &udev_dirs {
        if !Path::new(dir).exists() {
            continue;
        }

        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.filter_map(Result::ok) {
                if let Ok(content) = fs::read_to_string(entry.path()) {
                    // Generic rules that open up tty/usb-serial devices.
                    if content.contains("SUBSYSTEM==\"tty\"")
                        && (content.contains("MODE=\"0666\"")
                            || content.contains("GROUP=\"dialout\"")
                            || content.contains("GROUP=\"plugdev\""))
                    {
                        return true;
                    }
                }
            }
        }
    }

    false
}

/// Print instructions for fixing serial port permission issues on Linux
pub fn print_permission_instructions() {
    println!(
        "\n\nSERIAL PERMISSION ERROR: Cannot access the serial port due to insufficient permissions.\n"
    );
    println!("To fix this issue, you can:\n");
    println!("1. Add your user to the 'dialout' group (most distributions):\n");
    println!("   sudo usermod -aG dialout $USER");
    println!("   (Log out and log back in for this to take effect)\n");
    println!("2. Or create a udev rule for the reader's USB-serial adapter:");
    println!(
        "   sudo sh -c 'echo SUBSYSTEM==\"tty\", GROUP=\"dialout\", MODE=\"0660\" > /etc/udev/rules.d/50-sm6210.rules'"
    );
    println!("   sudo udevadm control --reload-rules");
    println!("   sudo udevadm trigger");
    println!("   (Then unplug and replug your device)\n");
    println!("3. Run this program with sudo (temporary solution):\n");
    println!(
        "   sudo {}",
        std::env::args()
            .next()
            .unwrap_or_else(|| "./rfid_program".to_string())
    );
}
