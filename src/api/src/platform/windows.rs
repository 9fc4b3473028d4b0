//! Print Windows-specific instructions for serial port access issues

pub fn print_permission_instructions() {
    println!("Windows: If the port is inaccessible, check Device Manager for the");
    println!("reader's COM port number and make sure no other program (e.g. a");
    println!("previous run of this tool) still has it open.");
}
