// build.rs
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let v = option_env!("CARGO_APP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    println!("cargo:rustc-env=CARGO_APP_VERSION={v}");
    println!("cargo:rerun-if-env-changed=CARGO_APP_VERSION");
    Ok(())
}
