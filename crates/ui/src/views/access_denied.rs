use dioxus::prelude::*;

use crate::views::ViewError;

#[component]
pub fn AccessDeniedView() -> Element {
    let message = ViewError::AccessDenied.message();
    rsx! {
        div { class: "page access-denied",
            h2 { "Access denied" }
            p { "{message}" }
        }
    }
}
