fn main() {
    println!("cargo:rerun-if-changed=assets/icon.ico");

    // Windows only: embed the tray glyph as the executable icon, plus version info.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let mut res = winres::WindowsResource::new();
    res.set_icon("assets/icon.ico");
    res.set("ProductName", "Paste Without Line Breaks");
    res.set("FileDescription", "Paste Without Line Breaks");
    res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
    res.set("FileVersion", env!("CARGO_PKG_VERSION"));

    if let Err(e) = res.compile() {
        println!("cargo:warning=failed to embed Windows resources: {e}");
    }
}
