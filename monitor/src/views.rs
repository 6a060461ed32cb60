pub mod status;

use axum::http::header;
use axum::response::IntoResponse;
use maud::{DOCTYPE, Markup, html};

pub use status::index;

const STYLE_SHEET: &str = r#"
:root {
    --background: #111417;
    --foreground: #d8dee4;
    --muted: #5c6670;
    --status-online: #3fb950;
    --status-offline: #f85149;
}
body { background: var(--background); color: var(--foreground); font-family: monospace; margin: 0; }
nav { display: flex; justify-content: space-between; align-items: center; padding: 0.75rem 1.5rem; border-bottom: 1px solid var(--muted); }
nav .meta span { margin-right: 1.5rem; }
.status-ok { color: var(--status-online); }
.status-down { color: var(--status-offline); }
.interval-selector a { color: var(--foreground); text-decoration: none; padding: 0.25rem 0.6rem; border: 1px solid var(--muted); }
.interval-selector a.active { background: var(--foreground); color: var(--background); }
main { padding: 1.5rem; }
"#;

pub async fn styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], STYLE_SHEET)
}

pub fn page_shell(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="stylesheet" href="/styles.css";
            }
            body {
                (content)
            }
        }
    }
}
