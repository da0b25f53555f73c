use dioxus::prelude::*;

mod components;
mod db;
mod diagnostics;
mod error;
mod playback;
mod utils;

use components::AppShell;

const APP_CSS: Asset = asset!("/assets/styling/app.css");

fn main() {
    diagnostics::init_logging();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Audio Player" }
        document::Meta { name: "theme-color", content: "#a38449" }
        document::Stylesheet { href: APP_CSS }

        AppShell {}
    }
}
