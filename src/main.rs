#![warn(clippy::all, rust_2018_idioms)]

fn init_logging() {
    // A terminal logger when asked for one, otherwise records go to the in-app log window.
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    } else if let Err(e) = egui_logger::builder()
        .max_level(log::LevelFilter::Debug)
        .init()
    {
        eprintln!("Failed to install logger: {e}");
    }
}

fn main() -> eframe::Result {
    init_logging();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "schematic",
        native_options,
        Box::new(|cc| Ok(Box::new(schematic::App::new(cc)))),
    )
}
