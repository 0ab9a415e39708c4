/// Display version information
pub fn execute() {
    println!("crosstrust {}", env!("CARGO_PKG_VERSION"));
    println!("Cross-signing trust engine and resilient identity store");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_execute() {
        execute();
    }
}
