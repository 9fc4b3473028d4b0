//! Print macOS-specific instructions for serial port access issues

pub fn print_permission_instructions() {
    println!("macOS: the reader enumerates as /dev/cu.usbserial-* (or");
    println!("/dev/tty.usbserial-* for the calling variant). If opening it fails:");
    println!();
    println!("1. Check that no other process already has the port open:");
    println!("   lsof /dev/cu.usbserial-*");
    println!("2. If a FTDI/CH340-style driver extension is blocked, allow it under");
    println!("   System Settings > Privacy & Security > Security, then replug the");
    println!("   reader.");
    println!("3. As a last resort, fix the device node's permissions directly:");
    println!("   sudo chmod 666 /dev/cu.usbserial-*");
}
