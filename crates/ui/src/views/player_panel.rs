use dioxus::prelude::*;

use crate::vm::PlayerPanelVm;

#[component]
pub fn PlayerPanel(vm: PlayerPanelVm, on_complete: EventHandler<()>) -> Element {
    let embed = vm.embed_url();
    let disabled = vm.is_completed;
    let label = vm.complete_label();

    rsx! {
        section { class: "player-panel",
            match embed {
                Some(src) => rsx! {
                    iframe { class: "player-frame", src: "{src}", allowfullscreen: true }
                },
                None => rsx! {
                    p { class: "player-missing", "Video unavailable." }
                },
            }
            div { class: "player-toolbar",
                span { class: "player-clock", "{vm.elapsed_str} / {vm.duration_str}" }
                progress { max: 100, value: "{vm.completion_percentage}" }
                button {
                    class: "complete-button",
                    disabled,
                    onclick: move |_| on_complete.call(()),
                    "{label}"
                }
            }
            h2 { class: "lesson-heading", "{vm.heading}" }
        }
    }
}
