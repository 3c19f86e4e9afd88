/// Display version information
pub fn execute() {
    println!("ballot {}", env!("CARGO_PKG_VERSION"));
    println!("Single-question ballot engine with phased voting and tie arbitration");
}
