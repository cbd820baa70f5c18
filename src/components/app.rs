use super::canvas_view::CanvasView;
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    html! { <div id="root"><CanvasView /></div> }
}
